//! The simulation state and its fixed per-tick ordering.

use loco_ai::{AiThinker, CompanyManager, CompanyServices, CompetitorObject};
use loco_core::{
    DayChange, GameClock, GameConfig, InvariantViolation, Prng, ScenarioOptions, StationNetwork,
    StringTable, Terrain, TownRegistry,
};
use loco_econ::{CargoObject, Economy, INFLATION_END_YEAR};
use loco_industry::{CommandDispatch, IndustryManager, IndustryObject, IndustryServices};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Building tiles visited per tick step along a 16x16 phase grid.
const TILE_PHASE_STEP: u8 = 9;

/// Loaded object tables, indexed by their ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObjects {
    pub cargo: Vec<CargoObject>,
    pub industries: Vec<IndustryObject>,
    pub competitors: Vec<CompetitorObject>,
}

/// Collaborators handed to every tick.
pub struct Services<'a> {
    pub terrain: &'a mut dyn Terrain,
    pub towns: &'a dyn TownRegistry,
    pub stations: &'a mut dyn StationNetwork,
    pub strings: &'a mut dyn StringTable,
}

/// Everything the simulation owns. Map, towns, stations and text live with
/// the caller and arrive through [`Services`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub clock: GameClock,
    pub prng: Prng,
    pub economy: Economy,
    pub companies: CompanyManager,
    pub industries: IndustryManager,
    pub options: ScenarioOptions,
    pub config: GameConfig,
    pub objects: WorldObjects,
    tile_update_phase: u8,
}

fn industry_services<'s>(
    objects: &'s [IndustryObject],
    economy: &'s Economy,
    options: &'s ScenarioOptions,
    prng: &'s mut Prng,
    current_year: i32,
    env: &'s mut Services<'_>,
) -> IndustryServices<'s> {
    IndustryServices {
        objects,
        economy,
        options,
        prng,
        terrain: &mut *env.terrain,
        towns: env.towns,
        stations: &mut *env.stations,
        strings: &mut *env.strings,
        current_year,
    }
}

impl WorldState {
    /// A world at 1 January of the start year: clock and PRNG seeded,
    /// inflation brought up to date, no companies or industries yet.
    pub fn new(options: ScenarioOptions, config: GameConfig, objects: WorldObjects) -> Self {
        let clock = GameClock::starting(options.start_year);
        let prng = Prng::new(options.rng_seed.srand0, options.rng_seed.srand1);
        let mut economy = Economy::new();
        economy.set_inflation_for_year(options.start_year, &objects.cargo);
        let companies = CompanyManager::new(
            options.max_competing_companies,
            options.competitor_start_delay,
            options.starting_loan_size,
        );
        Self {
            clock,
            prng,
            economy,
            companies,
            industries: IndustryManager::new(),
            options,
            config,
            objects,
            tile_update_phase: 0,
        }
    }

    pub fn tile_update_phase(&self) -> u8 {
        self.tile_update_phase
    }

    /// Map generation: found the starting industries unless the scenario
    /// turns that off, then the player's company when it asks for one.
    pub fn populate(
        &mut self,
        env: &mut Services<'_>,
        commands: &mut dyn CommandDispatch,
    ) -> Result<(), InvariantViolation> {
        if self.options.generate_industries {
            let mut svc = industry_services(
                &self.objects.industries,
                &self.economy,
                &self.options,
                &mut self.prng,
                self.clock.current_year(),
                env,
            );
            self.industries.generate_industries(commands, &mut svc)?;
        } else {
            debug!("industry generation disabled");
        }

        if self.options.create_player_company {
            let mut svc = CompanyServices {
                prng: &mut self.prng,
                economy: &self.economy,
                strings: &mut *env.strings,
                towns: env.towns,
                competitors: &self.objects.competitors,
                current_day: self.clock.current_day(),
            };
            if self.companies.create_player_company(&mut svc).is_none() {
                debug!("no slot or colour left for the player company");
            }
        }
        info!(
            date = ?self.clock.date(),
            industries = self.industries.count(),
            companies = self.companies.companies().count(),
            "world populated"
        );
        Ok(())
    }

    /// Advance one tick. Returns the day change when the date moved.
    pub fn tick(
        &mut self,
        env: &mut Services<'_>,
        commands: &mut dyn CommandDispatch,
        thinker: &mut dyn AiThinker,
    ) -> Result<Option<DayChange>, InvariantViolation> {
        let ticks = self.clock.advance_tick();
        let editor_mode = self.options.editor_mode;

        let mut day_change = None;
        if !editor_mode && self.clock.update_day_counter() {
            let mut svc = industry_services(
                &self.objects.industries,
                &self.economy,
                &self.options,
                &mut self.prng,
                self.clock.current_year(),
                env,
            );
            self.industries.update_daily(&mut svc)?;
            let change = self.clock.roll_date();
            if change.month_changed() {
                self.end_month(change, env, commands)?;
            }
            day_change = Some(change);
        }

        let phase = self.tile_update_phase;
        let mut svc = industry_services(
            &self.objects.industries,
            &self.economy,
            &self.options,
            &mut self.prng,
            self.clock.current_year(),
            env,
        );
        self.industries.update_building_tiles(phase, &mut svc)?;
        self.tile_update_phase = phase.wrapping_add(TILE_PHASE_STEP);
        if self.tile_update_phase == 0 {
            self.industries.update_produced_cargo_stats(&svc)?;
        }
        if !editor_mode {
            self.industries.update(&mut svc)?;
        }

        let mut svc = CompanyServices {
            prng: &mut self.prng,
            economy: &self.economy,
            strings: &mut *env.strings,
            towns: env.towns,
            competitors: &self.objects.competitors,
            current_day: self.clock.current_day(),
        };
        self.companies
            .update(ticks, editor_mode, &self.config, thinker, &mut svc);
        Ok(day_change)
    }

    fn end_month(
        &mut self,
        change: DayChange,
        env: &mut Services<'_>,
        commands: &mut dyn CommandDispatch,
    ) -> Result<(), InvariantViolation> {
        let mut svc = industry_services(
            &self.objects.industries,
            &self.economy,
            &self.options,
            &mut self.prng,
            change.today.year,
            env,
        );
        self.industries.update_monthly(commands, &mut svc)?;
        self.companies.update_monthly();
        if change.today.year < INFLATION_END_YEAR {
            self.economy.update_monthly(&self.objects.cargo);
        }
        debug!(
            year = change.today.year,
            month = ?change.today.month,
            industries = self.industries.count(),
            ai_companies = self.companies.active_ai_companies(),
            "month ended"
        );
        if change.year_changed() {
            info!(year = change.today.year, "new year");
        }
        Ok(())
    }
}
