//! Calendar arithmetic over the whole-day counter.
//!
//! Day 0 is 1 January 1800. Every fourth year is a leap year with no
//! century exception, so 1800 and 1900 both have a 29 February.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// First year of the day counter.
pub const BASE_YEAR: i32 = 1800;
const DAYS_IN_YEAR: i32 = 365;
const DAYS_IN_OLYMPIAD: u32 = 365 * 4 + 1;
const FEB_29_OFFSET: i32 = 31 + 28;

/// Month of the year, January first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Zero-based month index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-based month number as used by Gregorian libraries.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }
}

/// A calendar date derived from the day counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: Month,
    /// Day of the month, starting at 1.
    pub day: u8,
    /// Day offset within the leap-year-first cycle produced by [`calc_date`].
    pub day_of_olympiad: u16,
}

impl Date {
    /// Build a date from its parts. `day_of_olympiad` is left at zero.
    pub fn new(year: i32, month: Month, day: u8) -> Self {
        Self {
            year,
            month,
            day,
            day_of_olympiad: 0,
        }
    }

    /// The same date in the Gregorian calendar, when it exists there.
    ///
    /// Century years such as 1900 have a 29 February here but not in
    /// Gregorian reckoning; those return `None`.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.number(), u32::from(self.day))
    }
}

/// `year % 4 == 0`, deliberately without the Gregorian century rules.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0
}

/// Number of days in `month` of `year`.
pub fn month_total_days(year: i32, month: Month) -> u8 {
    const LENGTHS: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let extra = u8::from(month == Month::February && is_leap_year(year));
    LENGTHS[month.index()] + extra
}

/// Decompose a day counter into a date.
pub fn calc_date(total_days: u32) -> Date {
    let mut years = (((total_days / DAYS_IN_OLYMPIAD) & 0xFFFF) * 4) as i32;
    let mut day = (total_days % DAYS_IN_OLYMPIAD) as i32;

    // Only the first year of each block has 366 days; later years skip the
    // Feb 29 row of the table.
    if day > DAYS_IN_YEAR {
        day -= DAYS_IN_YEAR + 1;
        loop {
            years += 1;
            day -= DAYS_IN_YEAR;
            if day < 0 {
                break;
            }
        }
        day += DAYS_IN_YEAR;
        if day >= FEB_29_OFFSET {
            day += 1;
        }
    }

    let (month, day_of_month) = DAY_OF_YEAR_TABLE[day as usize];
    Date {
        year: BASE_YEAR + years,
        month,
        day: day_of_month,
        day_of_olympiad: day as u16,
    }
}

/// Day counter for a date: whole years, a quarter day per year, the months
/// before `date.month` and finally `date.day`.
pub fn calc_days(date: &Date) -> u32 {
    let year_diff = i64::from(date.year - BASE_YEAR);
    let mut count = year_diff * i64::from(DAYS_IN_YEAR) + year_diff / 4;
    for month in Month::ALL.iter().take(date.month.index()) {
        count += i64::from(month_total_days(date.year, *month));
    }
    count += i64::from(date.day);
    count as u32
}

static DAY_OF_YEAR_TABLE: [(Month, u8); 366] = [
    (Month::January, 1),
    (Month::January, 2),
    (Month::January, 3),
    (Month::January, 4),
    (Month::January, 5),
    (Month::January, 6),
    (Month::January, 7),
    (Month::January, 8),
    (Month::January, 9),
    (Month::January, 10),
    (Month::January, 11),
    (Month::January, 12),
    (Month::January, 13),
    (Month::January, 14),
    (Month::January, 15),
    (Month::January, 16),
    (Month::January, 17),
    (Month::January, 18),
    (Month::January, 19),
    (Month::January, 20),
    (Month::January, 21),
    (Month::January, 22),
    (Month::January, 23),
    (Month::January, 24),
    (Month::January, 25),
    (Month::January, 26),
    (Month::January, 27),
    (Month::January, 28),
    (Month::January, 29),
    (Month::January, 30),
    (Month::January, 31),
    (Month::February, 1),
    (Month::February, 2),
    (Month::February, 3),
    (Month::February, 4),
    (Month::February, 5),
    (Month::February, 6),
    (Month::February, 7),
    (Month::February, 8),
    (Month::February, 9),
    (Month::February, 10),
    (Month::February, 11),
    (Month::February, 12),
    (Month::February, 13),
    (Month::February, 14),
    (Month::February, 15),
    (Month::February, 16),
    (Month::February, 17),
    (Month::February, 18),
    (Month::February, 19),
    (Month::February, 20),
    (Month::February, 21),
    (Month::February, 22),
    (Month::February, 23),
    (Month::February, 24),
    (Month::February, 25),
    (Month::February, 26),
    (Month::February, 27),
    (Month::February, 28),
    (Month::February, 29),
    (Month::March, 1),
    (Month::March, 2),
    (Month::March, 3),
    (Month::March, 4),
    (Month::March, 5),
    (Month::March, 6),
    (Month::March, 7),
    (Month::March, 8),
    (Month::March, 9),
    (Month::March, 10),
    (Month::March, 11),
    (Month::March, 12),
    (Month::March, 13),
    (Month::March, 14),
    (Month::March, 15),
    (Month::March, 16),
    (Month::March, 17),
    (Month::March, 18),
    (Month::March, 19),
    (Month::March, 20),
    (Month::March, 21),
    (Month::March, 22),
    (Month::March, 23),
    (Month::March, 24),
    (Month::March, 25),
    (Month::March, 26),
    (Month::March, 27),
    (Month::March, 28),
    (Month::March, 29),
    (Month::March, 30),
    (Month::March, 31),
    (Month::April, 1),
    (Month::April, 2),
    (Month::April, 3),
    (Month::April, 4),
    (Month::April, 5),
    (Month::April, 6),
    (Month::April, 7),
    (Month::April, 8),
    (Month::April, 9),
    (Month::April, 10),
    (Month::April, 11),
    (Month::April, 12),
    (Month::April, 13),
    (Month::April, 14),
    (Month::April, 15),
    (Month::April, 16),
    (Month::April, 17),
    (Month::April, 18),
    (Month::April, 19),
    (Month::April, 20),
    (Month::April, 21),
    (Month::April, 22),
    (Month::April, 23),
    (Month::April, 24),
    (Month::April, 25),
    (Month::April, 26),
    (Month::April, 27),
    (Month::April, 28),
    (Month::April, 29),
    (Month::April, 30),
    (Month::May, 1),
    (Month::May, 2),
    (Month::May, 3),
    (Month::May, 4),
    (Month::May, 5),
    (Month::May, 6),
    (Month::May, 7),
    (Month::May, 8),
    (Month::May, 9),
    (Month::May, 10),
    (Month::May, 11),
    (Month::May, 12),
    (Month::May, 13),
    (Month::May, 14),
    (Month::May, 15),
    (Month::May, 16),
    (Month::May, 17),
    (Month::May, 18),
    (Month::May, 19),
    (Month::May, 20),
    (Month::May, 21),
    (Month::May, 22),
    (Month::May, 23),
    (Month::May, 24),
    (Month::May, 25),
    (Month::May, 26),
    (Month::May, 27),
    (Month::May, 28),
    (Month::May, 29),
    (Month::May, 30),
    (Month::May, 31),
    (Month::June, 1),
    (Month::June, 2),
    (Month::June, 3),
    (Month::June, 4),
    (Month::June, 5),
    (Month::June, 6),
    (Month::June, 7),
    (Month::June, 8),
    (Month::June, 9),
    (Month::June, 10),
    (Month::June, 11),
    (Month::June, 12),
    (Month::June, 13),
    (Month::June, 14),
    (Month::June, 15),
    (Month::June, 16),
    (Month::June, 17),
    (Month::June, 18),
    (Month::June, 19),
    (Month::June, 20),
    (Month::June, 21),
    (Month::June, 22),
    (Month::June, 23),
    (Month::June, 24),
    (Month::June, 25),
    (Month::June, 26),
    (Month::June, 27),
    (Month::June, 28),
    (Month::June, 29),
    (Month::June, 30),
    (Month::July, 1),
    (Month::July, 2),
    (Month::July, 3),
    (Month::July, 4),
    (Month::July, 5),
    (Month::July, 6),
    (Month::July, 7),
    (Month::July, 8),
    (Month::July, 9),
    (Month::July, 10),
    (Month::July, 11),
    (Month::July, 12),
    (Month::July, 13),
    (Month::July, 14),
    (Month::July, 15),
    (Month::July, 16),
    (Month::July, 17),
    (Month::July, 18),
    (Month::July, 19),
    (Month::July, 20),
    (Month::July, 21),
    (Month::July, 22),
    (Month::July, 23),
    (Month::July, 24),
    (Month::July, 25),
    (Month::July, 26),
    (Month::July, 27),
    (Month::July, 28),
    (Month::July, 29),
    (Month::July, 30),
    (Month::July, 31),
    (Month::August, 1),
    (Month::August, 2),
    (Month::August, 3),
    (Month::August, 4),
    (Month::August, 5),
    (Month::August, 6),
    (Month::August, 7),
    (Month::August, 8),
    (Month::August, 9),
    (Month::August, 10),
    (Month::August, 11),
    (Month::August, 12),
    (Month::August, 13),
    (Month::August, 14),
    (Month::August, 15),
    (Month::August, 16),
    (Month::August, 17),
    (Month::August, 18),
    (Month::August, 19),
    (Month::August, 20),
    (Month::August, 21),
    (Month::August, 22),
    (Month::August, 23),
    (Month::August, 24),
    (Month::August, 25),
    (Month::August, 26),
    (Month::August, 27),
    (Month::August, 28),
    (Month::August, 29),
    (Month::August, 30),
    (Month::August, 31),
    (Month::September, 1),
    (Month::September, 2),
    (Month::September, 3),
    (Month::September, 4),
    (Month::September, 5),
    (Month::September, 6),
    (Month::September, 7),
    (Month::September, 8),
    (Month::September, 9),
    (Month::September, 10),
    (Month::September, 11),
    (Month::September, 12),
    (Month::September, 13),
    (Month::September, 14),
    (Month::September, 15),
    (Month::September, 16),
    (Month::September, 17),
    (Month::September, 18),
    (Month::September, 19),
    (Month::September, 20),
    (Month::September, 21),
    (Month::September, 22),
    (Month::September, 23),
    (Month::September, 24),
    (Month::September, 25),
    (Month::September, 26),
    (Month::September, 27),
    (Month::September, 28),
    (Month::September, 29),
    (Month::September, 30),
    (Month::October, 1),
    (Month::October, 2),
    (Month::October, 3),
    (Month::October, 4),
    (Month::October, 5),
    (Month::October, 6),
    (Month::October, 7),
    (Month::October, 8),
    (Month::October, 9),
    (Month::October, 10),
    (Month::October, 11),
    (Month::October, 12),
    (Month::October, 13),
    (Month::October, 14),
    (Month::October, 15),
    (Month::October, 16),
    (Month::October, 17),
    (Month::October, 18),
    (Month::October, 19),
    (Month::October, 20),
    (Month::October, 21),
    (Month::October, 22),
    (Month::October, 23),
    (Month::October, 24),
    (Month::October, 25),
    (Month::October, 26),
    (Month::October, 27),
    (Month::October, 28),
    (Month::October, 29),
    (Month::October, 30),
    (Month::October, 31),
    (Month::November, 1),
    (Month::November, 2),
    (Month::November, 3),
    (Month::November, 4),
    (Month::November, 5),
    (Month::November, 6),
    (Month::November, 7),
    (Month::November, 8),
    (Month::November, 9),
    (Month::November, 10),
    (Month::November, 11),
    (Month::November, 12),
    (Month::November, 13),
    (Month::November, 14),
    (Month::November, 15),
    (Month::November, 16),
    (Month::November, 17),
    (Month::November, 18),
    (Month::November, 19),
    (Month::November, 20),
    (Month::November, 21),
    (Month::November, 22),
    (Month::November, 23),
    (Month::November, 24),
    (Month::November, 25),
    (Month::November, 26),
    (Month::November, 27),
    (Month::November, 28),
    (Month::November, 29),
    (Month::November, 30),
    (Month::December, 1),
    (Month::December, 2),
    (Month::December, 3),
    (Month::December, 4),
    (Month::December, 5),
    (Month::December, 6),
    (Month::December, 7),
    (Month::December, 8),
    (Month::December, 9),
    (Month::December, 10),
    (Month::December, 11),
    (Month::December, 12),
    (Month::December, 13),
    (Month::December, 14),
    (Month::December, 15),
    (Month::December, 16),
    (Month::December, 17),
    (Month::December, 18),
    (Month::December, 19),
    (Month::December, 20),
    (Month::December, 21),
    (Month::December, 22),
    (Month::December, 23),
    (Month::December, 24),
    (Month::December, 25),
    (Month::December, 26),
    (Month::December, 27),
    (Month::December, 28),
    (Month::December, 29),
    (Month::December, 30),
    (Month::December, 31),
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn leap_rule_has_no_century_exception() {
        assert!(is_leap_year(1800));
        assert!(!is_leap_year(1801));
        assert!(is_leap_year(1900));
        assert!(is_leap_year(2000));
        assert_eq!(month_total_days(1900, Month::February), 29);
        assert_eq!(month_total_days(1901, Month::February), 28);
    }

    #[test]
    fn table_enumerates_every_day_once() {
        assert_eq!(DAY_OF_YEAR_TABLE[0], (Month::January, 1));
        assert_eq!(DAY_OF_YEAR_TABLE[59], (Month::February, 29));
        assert_eq!(DAY_OF_YEAR_TABLE[60], (Month::March, 1));
        assert_eq!(DAY_OF_YEAR_TABLE[365], (Month::December, 31));
        for month in Month::ALL {
            let days = DAY_OF_YEAR_TABLE.iter().filter(|(m, _)| *m == month).count();
            assert_eq!(days, usize::from(month_total_days(1800, month)));
        }
    }

    #[test]
    fn known_day_counts() {
        let d = calc_date(0);
        assert_eq!((d.year, d.month, d.day, d.day_of_olympiad), (1800, Month::January, 1, 0));
        let d = calc_date(366);
        assert_eq!((d.year, d.month, d.day), (1801, Month::January, 1));
        let d = calc_date(1460);
        assert_eq!((d.year, d.month, d.day, d.day_of_olympiad), (1803, Month::December, 31, 365));
        let d = calc_date(1461);
        assert_eq!((d.year, d.month, d.day), (1804, Month::January, 1));
        assert_eq!(calc_days(&Date::new(1950, Month::January, 1)), 54_788);
        let d = calc_date(54_788);
        assert_eq!((d.year, d.month, d.day), (1950, Month::January, 1));
    }

    #[test]
    fn non_leap_years_skip_february_29() {
        // 1801: day 59 of the year must be 1 March.
        let d = calc_date(366 + 59);
        assert_eq!((d.year, d.month, d.day), (1801, Month::March, 1));
        assert_eq!(d.day_of_olympiad, 60);
    }

    #[test]
    fn round_trip_over_simulated_range() {
        // In the leap year heading each four-year block the inverse lands one
        // day later; the counter itself is still strictly monotonic.
        for total in 0..=365 * 230u32 {
            let date = calc_date(total);
            let expected = if is_leap_year(date.year) { total + 1 } else { total };
            assert_eq!(calc_days(&date), expected, "day {total} -> {date:?}");
        }
    }

    #[test]
    fn consecutive_days_match_gregorian_successors() {
        let start = calc_days(&Date::new(1901, Month::January, 1));
        let end = calc_days(&Date::new(2099, Month::December, 31));
        let mut prev = calc_date(start).to_naive_date().unwrap();
        for total in start + 1..=end {
            let next = calc_date(total).to_naive_date().unwrap();
            assert_eq!(prev.succ_opt(), Some(next), "day {total}");
            prev = next;
        }
    }

    #[test]
    fn gregorian_conversion_rejects_century_leap_day() {
        assert!(Date::new(1900, Month::February, 29).to_naive_date().is_none());
        assert!(Date::new(2000, Month::February, 29).to_naive_date().is_some());
    }

    proptest! {
        #[test]
        fn dates_are_well_formed(total in 0u32..(365 * 300)) {
            let d = calc_date(total);
            prop_assert!(d.day >= 1);
            prop_assert!(d.day <= month_total_days(d.year, d.month));
        }

        #[test]
        fn non_leap_dates_round_trip(total in 0u32..(365 * 230)) {
            let d = calc_date(total);
            prop_assume!(!is_leap_year(d.year));
            let back = calc_date(calc_days(&d));
            prop_assert_eq!((back.year, back.month, back.day), (d.year, d.month, d.day));
        }
    }
}
