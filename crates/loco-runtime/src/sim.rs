//! A self-contained headless run: the world plus synthetic collaborators,
//! with month-granular stepping, KPIs and a state digest.

use crate::error::RuntimeError;
use crate::scenario::ScenarioFile;
use crate::synthetic::{
    SyntheticEnv, SyntheticStations, SyntheticTerrain, SyntheticTown, SyntheticTowns,
};
use crate::world::{WorldObjects, WorldState};
use chrono::NaiveDate;
use loco_ai::IdleThinker;
use loco_core::{
    Currency, Date, DayChange, IndustryObjectId, InvariantViolation, MemoryStringTable, TilePos,
};
use loco_industry::CreateIndustryCommand;
use serde::{Deserialize, Serialize};
use tracing::info;
use xxhash_rust::xxh32::xxh32;

/// Upper bound on ticks in one month: 31 days of at most 97 ticks.
pub const MAX_TICKS_PER_MONTH: u64 = 31 * 97;

/// World and collaborators in one serializable value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub world: WorldState,
    pub env: SyntheticEnv,
    months_run: u32,
}

/// Headline numbers after a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub months_run: u32,
    pub date: Date,
    /// `None` on century leap days the Gregorian calendar skips.
    pub calendar_date: Option<NaiveDate>,
    pub scenario_ticks: u32,
    pub companies: usize,
    pub ai_companies: usize,
    pub player_cash: Currency,
    pub industries: usize,
    /// Live industries per object id.
    pub industries_by_type: Vec<usize>,
    pub cargo_delivered: u64,
    pub inflation_factor: u32,
    pub user_strings: usize,
    pub digest: u32,
}

impl Simulation {
    /// Build the map, towns and stations a scenario describes, register
    /// every name and populate the world.
    pub fn from_scenario(scenario: &ScenarioFile) -> Result<Self, RuntimeError> {
        scenario.validate()?;
        let options = &scenario.options;
        let seed = options.rng_seed.srand0 ^ options.rng_seed.srand1.rotate_left(16);

        let mut strings = MemoryStringTable::new();
        let mut industries = scenario.industries.clone();
        for obj in &mut industries {
            obj.name_id = strings.intern_object_name(&obj.name);
        }
        let competitors = scenario
            .competitors
            .iter()
            .map(|c| c.intern(&mut strings))
            .collect();
        let towns = scenario
            .towns
            .iter()
            .map(|t| SyntheticTown {
                name: strings.intern(t.name.as_str()),
                pos: TilePos::new(t.x, t.y).to_world(),
                population: t.population,
            })
            .collect();
        let station_tiles = if scenario.stations.is_empty() {
            scenario.towns.iter().map(|t| TilePos::new(t.x, t.y)).collect()
        } else {
            scenario.stations.clone()
        };

        let mut env = SyntheticEnv {
            terrain: SyntheticTerrain::new(
                scenario.map.columns,
                scenario.map.rows,
                seed,
                options.min_land_height,
                options.hill_density,
                options.topography_style,
                options.summer_snow_line,
            ),
            towns: SyntheticTowns {
                towns,
                building_cargo: scenario.town_cargo,
            },
            stations: SyntheticStations::new(station_tiles, seed),
            strings,
        };
        let objects = WorldObjects {
            cargo: scenario.cargo.clone(),
            industries,
            competitors,
        };
        let mut world = WorldState::new(options.clone(), scenario.config.clone(), objects);
        world.populate(&mut env.services(), &mut CreateIndustryCommand)?;
        Ok(Self {
            world,
            env,
            months_run: 0,
        })
    }

    pub fn months_run(&self) -> u32 {
        self.months_run
    }

    /// One tick with the stock command handler and the idle AI.
    pub fn tick(&mut self) -> Result<Option<DayChange>, InvariantViolation> {
        self.world
            .tick(&mut self.env.services(), &mut CreateIndustryCommand, &mut IdleThinker)
    }

    /// Tick until `months` month boundaries have passed. A frozen calendar
    /// stops after the tick allowance of that many months.
    pub fn run_months(&mut self, months: u32) -> Result<(), InvariantViolation> {
        let allowance = u64::from(months) * MAX_TICKS_PER_MONTH;
        let mut done = 0;
        let mut ticks = 0;
        while done < months && ticks < allowance {
            ticks += 1;
            if self.tick()?.map_or(false, |c| c.month_changed()) {
                done += 1;
            }
        }
        self.months_run += done;
        Ok(())
    }

    /// xxh32 of the bincode encoding of the whole run.
    pub fn digest(&self) -> Result<u32, RuntimeError> {
        let bytes = bincode::serialize(self)?;
        Ok(xxh32(&bytes, 0))
    }

    pub fn snapshot(&self) -> Result<Snapshot, RuntimeError> {
        let world = &self.world;
        let date = world.clock.date();
        let industries_by_type = (0..world.objects.industries.len())
            .map(|i| world.industries.count_of_type(IndustryObjectId(i as u8)))
            .collect();
        Ok(Snapshot {
            months_run: self.months_run,
            date,
            calendar_date: date.to_naive_date(),
            scenario_ticks: world.clock.scenario_ticks(),
            companies: world.companies.companies().count(),
            ai_companies: world.companies.active_ai_companies(),
            player_cash: world.companies.player_company().map_or(0, |c| c.cash),
            industries: world.industries.count(),
            industries_by_type,
            cargo_delivered: self.env.stations.total_delivered(),
            inflation_factor: world.economy.factors()[0],
            user_strings: self.env.strings.user_strings_in_use(),
            digest: self.digest()?,
        })
    }
}

/// Build a populated world from a scenario.
pub fn init_world(scenario: &ScenarioFile) -> Result<Simulation, RuntimeError> {
    let sim = Simulation::from_scenario(scenario)?;
    info!(
        start_year = scenario.options.start_year,
        industries = sim.world.industries.count(),
        towns = scenario.towns.len(),
        "world initialised"
    );
    Ok(sim)
}

/// Run a world for `months` and report where it ended up.
pub fn run_months(mut sim: Simulation, months: u32) -> Result<Snapshot, RuntimeError> {
    run_months_in_place(&mut sim, months)?;
    sim.snapshot()
}

pub fn run_months_in_place(sim: &mut Simulation, months: u32) -> Result<(), RuntimeError> {
    sim.run_months(months)?;
    Ok(())
}

pub fn clone_world_state(sim: &Simulation) -> Simulation {
    sim.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_scenario;

    #[test]
    fn digest_tracks_every_tick() {
        let mut sim = init_world(&default_scenario().unwrap()).unwrap();
        let before = sim.digest().unwrap();
        assert_eq!(before, clone_world_state(&sim).digest().unwrap());
        sim.tick().unwrap();
        assert_ne!(sim.digest().unwrap(), before);
        assert_eq!(sim.months_run(), 0);
    }

    #[test]
    fn zero_months_is_a_no_op() {
        let mut sim = init_world(&default_scenario().unwrap()).unwrap();
        let before = sim.digest().unwrap();
        run_months_in_place(&mut sim, 0).unwrap();
        assert_eq!(sim.digest().unwrap(), before);
    }
}
