//! Tick and day counters that drive the calendar.

use crate::date::{calc_date, calc_days, Date, Month};
use serde::{Deserialize, Serialize};

/// Sub-day progression added every tick; a day passes when it wraps.
pub const DAY_PROGRESSION_STEP: u16 = 682;

/// Outcome of a day boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayChange {
    pub yesterday: Date,
    pub today: Date,
}

impl DayChange {
    pub fn month_changed(&self) -> bool {
        self.today.month != self.yesterday.month
    }

    pub fn year_changed(&self) -> bool {
        self.today.year != self.yesterday.year
    }
}

/// Canonical time state: the day counter, its 16-bit progression and the
/// scenario tick count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    current_day: u32,
    day_progression: u16,
    date: Date,
    scenario_ticks: u32,
}

impl GameClock {
    /// Clock positioned on 1 January of `year`.
    pub fn starting(year: i32) -> Self {
        let mut clock = Self {
            current_day: 0,
            day_progression: 0,
            date: calc_date(0),
            scenario_ticks: 0,
        };
        clock.initialise(Date::new(year, Month::January, 1));
        clock
    }

    /// Reset the clock to `date`; progression and tick count return to zero.
    ///
    /// The cached date is `date` itself, not `calc_date` of the resulting
    /// counter, which can differ by a day in leap years.
    pub fn initialise(&mut self, date: Date) {
        self.current_day = calc_days(&date);
        self.date = date;
        self.day_progression = 0;
        self.scenario_ticks = 0;
    }

    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    pub fn day_progression(&self) -> u16 {
        self.day_progression
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn current_year(&self) -> i32 {
        self.date.year
    }

    pub fn scenario_ticks(&self) -> u32 {
        self.scenario_ticks
    }

    /// Count one simulation tick.
    pub fn advance_tick(&mut self) -> u32 {
        self.scenario_ticks = self.scenario_ticks.wrapping_add(1);
        self.scenario_ticks
    }

    /// Add the progression step; returns `true` and bumps the day counter
    /// when the 16-bit progression overflows.
    pub fn update_day_counter(&mut self) -> bool {
        let wrapped = u32::from(self.day_progression) + u32::from(DAY_PROGRESSION_STEP)
            > u32::from(u16::MAX);
        if wrapped {
            self.current_day = self.current_day.wrapping_add(1);
        }
        self.day_progression = self.day_progression.wrapping_add(DAY_PROGRESSION_STEP);
        wrapped
    }

    /// Recompute the cached date after the day counter moved.
    pub fn roll_date(&mut self) -> DayChange {
        let yesterday = calc_date(self.current_day.wrapping_sub(1));
        let today = calc_date(self.current_day);
        self.date = today;
        DayChange { yesterday, today }
    }
}
