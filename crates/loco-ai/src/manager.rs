//! Fixed-capacity company registry with AI scheduling and competitor
//! spawning.

use crate::colour::{Colour, ColourScheme, ALL_COLOURS_MASK};
use crate::company::{AiPlaystyleFlags, Company, PLAYSTYLE_FLAGS, TOWN_NAME_PREFIX};
use crate::competitor::CompetitorObject;
use crate::think::AiThinker;
use loco_core::{
    CompanyId, CompetitorId, FormatArg, GameConfig, Prng, StringId, StringTable, TownId,
    TownRegistry, MAX_COMPANIES, MAX_COMPETITORS,
};
use loco_econ::Economy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Ticks between competitor spawn checks.
pub const PRODUCE_AI_COMPANY_INTERVAL: u8 = 192;
/// Attempts at finding an unused name/colour combination.
const AI_CREATE_ATTEMPTS: u32 = 250;

/// Primary colour implied by a name prefix; `None` picks one at random.
const AI_PRIMARY_COLOURS: [Option<Colour>; 13] = [
    Some(Colour::Black),
    Some(Colour::Grey),
    Some(Colour::White),
    Some(Colour::MutedDarkPurple),
    Some(Colour::Blue),
    Some(Colour::Green),
    Some(Colour::Amber),
    Some(Colour::DarkOrange),
    Some(Colour::MutedYellow),
    Some(Colour::MutedDarkRed),
    Some(Colour::Red),
    None,
    None,
];

/// Everything company creation reads or draws from besides the registry.
pub struct CompanyServices<'a> {
    pub prng: &'a mut Prng,
    pub economy: &'a Economy,
    pub strings: &'a mut dyn StringTable,
    pub towns: &'a dyn TownRegistry,
    pub competitors: &'a [CompetitorObject],
    /// Day counter, recorded as a new company's start date.
    pub current_day: u32,
}

/// Company slots and the spawn schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyManager {
    companies: Vec<Option<Company>>,
    player_companies: [Option<CompanyId>; 2],
    produce_ai_company_timeout: u8,
    max_competing_companies: u8,
    competitor_start_delay: u8,
    starting_loan_size: u16,
}

impl CompanyManager {
    pub fn new(max_competing_companies: u8, competitor_start_delay: u8, starting_loan_size: u16) -> Self {
        Self {
            companies: vec![None; MAX_COMPANIES],
            player_companies: [Some(CompanyId(0)), None],
            produce_ai_company_timeout: 0,
            max_competing_companies,
            competitor_start_delay,
            starting_loan_size,
        }
    }

    /// Empty every slot and restore the default player assignment.
    pub fn reset(&mut self) {
        self.companies.iter_mut().for_each(|slot| *slot = None);
        self.produce_ai_company_timeout = 0;
        self.player_companies = [Some(CompanyId(0)), None];
    }

    pub fn get(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: CompanyId) -> Option<&mut Company> {
        self.companies.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Occupied slots in id order.
    pub fn companies(&self) -> impl Iterator<Item = &Company> {
        self.companies.iter().flatten()
    }

    pub fn is_player_company(&self, id: CompanyId) -> bool {
        self.player_companies.contains(&Some(id))
    }

    pub fn player_company(&self) -> Option<&Company> {
        self.player_companies[0].and_then(|id| self.get(id))
    }

    /// Occupied slots that are not player companies.
    pub fn active_ai_companies(&self) -> usize {
        self.companies()
            .filter(|c| !self.is_player_company(c.id))
            .count()
    }

    pub fn competitor_start_delay(&self) -> u8 {
        self.competitor_start_delay
    }

    pub fn max_competing_companies(&self) -> u8 {
        self.max_competing_companies
    }

    pub fn produce_ai_company_timeout(&self) -> u8 {
        self.produce_ai_company_timeout
    }

    /// Per-tick step: one AI think round-robin by tick, then the spawn
    /// timer.
    pub fn update(
        &mut self,
        scenario_ticks: u32,
        editor_mode: bool,
        config: &GameConfig,
        thinker: &mut dyn AiThinker,
        svc: &mut CompanyServices<'_>,
    ) {
        if editor_mode || config.company_ai_disabled {
            return;
        }

        let id = CompanyId((scenario_ticks & 0x0F) as u8);
        if !self.is_player_company(id) {
            if let Some(company) = self.get_mut(id) {
                thinker.think(company);
            }
        }

        self.produce_ai_company_timeout = self.produce_ai_company_timeout.wrapping_add(1);
        if self.produce_ai_company_timeout >= PRODUCE_AI_COMPANY_INTERVAL {
            self.produce_ai_company_timeout = 0;
            self.produce_companies(svc);
        }
    }

    /// Month boundary: count down the competitor start delay.
    pub fn update_monthly(&mut self) {
        self.competitor_start_delay = self.competitor_start_delay.saturating_sub(1);
    }

    /// Possibly add one AI company, with odds that fall as the number of
    /// active competitors approaches the configured maximum.
    pub fn produce_companies(&mut self, svc: &mut CompanyServices<'_>) {
        if self.competitor_start_delay != 0 || self.max_competing_companies == 0 {
            return;
        }
        let active = self.active_ai_companies() as i32;
        if svc.prng.rand_next_to(16) == 0
            && svc.prng.rand_next_to(i32::from(self.max_competing_companies)) + 1 > active
        {
            self.create_ai_company(svc);
        }
    }

    fn create_ai_company(&mut self, svc: &mut CompanyServices<'_>) -> Option<CompanyId> {
        let competitor = self.select_new_competitor(svc)?;
        self.create_company(Some(competitor), false, svc)
    }

    /// Uniform pick among loaded competitors no company uses yet.
    pub fn select_new_competitor(&self, svc: &mut CompanyServices<'_>) -> Option<CompetitorId> {
        let unused: Vec<CompetitorId> = (0..svc.competitors.len().min(MAX_COMPETITORS))
            .map(|i| CompetitorId(i as u8))
            .filter(|id| self.companies().all(|c| c.competitor != Some(*id)))
            .collect();
        if unused.is_empty() {
            debug!("no unused competitor left");
            return None;
        }
        let r = ((svc.prng.rand_next() & 0xFFFF) as usize * unused.len()) / 65536;
        unused.get(r).copied()
    }

    /// Create the player's company in the first free slot and make it the
    /// primary player.
    pub fn create_player_company(&mut self, svc: &mut CompanyServices<'_>) -> Option<CompanyId> {
        let competitor = self.select_new_competitor(svc);
        let id = self.create_company(competitor, true, svc);
        self.player_companies = [id, None];
        id
    }

    /// OR of the similar-colour masks of every other company's primary.
    pub fn competing_colour_mask(&self, except: CompanyId) -> u32 {
        self.companies()
            .filter(|c| c.id != except)
            .fold(0, |mask, c| mask | c.colours.primary.similar_mask())
    }

    /// Fill the first empty slot. AI companies get a name, playstyle and
    /// colour that no other company already has; `None` leaves the slot
    /// empty.
    pub fn create_company(
        &mut self,
        competitor: Option<CompetitorId>,
        is_player: bool,
        svc: &mut CompanyServices<'_>,
    ) -> Option<CompanyId> {
        let slot = self.companies.iter().position(Option::is_none)?;
        let id = CompanyId(slot as u8);
        let mut company = Company::new(id, competitor, svc.current_day);
        let mask = self.competing_colour_mask(id);

        if is_player {
            if mask & ALL_COLOURS_MASK == ALL_COLOURS_MASK {
                return None;
            }
            let primary = loop {
                let colour = Colour::from_draw(svc.prng.rand_next());
                if mask & colour.bit() == 0 {
                    break colour;
                }
            };
            company.colours = ColourScheme::from_primary(primary);
        } else {
            let object = svc.competitors.get(competitor?.index())?;
            company.owner_name = object.name;
            let (name, colours, flags, town) = self.choose_ai_identity(id, object, mask, svc)?;
            company.name = name;
            company.colours = colours;
            company.ai_playstyle_flags = flags;
            company.ai_playstyle_town = town;
        }

        company.current_loan = svc.economy.starting_loan(self.starting_loan_size);
        company.cash = company.current_loan;

        info!(
            company = %id,
            name = %svc.strings.resolve(company.name),
            primary = ?company.colours.primary,
            player = is_player,
            "company created"
        );
        self.companies[slot] = Some(company);
        Some(id)
    }

    fn choose_ai_identity(
        &self,
        id: CompanyId,
        object: &CompetitorObject,
        mask: u32,
        svc: &mut CompanyServices<'_>,
    ) -> Option<(StringId, ColourScheme, AiPlaystyleFlags, Option<TownId>)> {
        let mut chosen = None;
        let mut r = 0u32;
        for _ in 0..AI_CREATE_ATTEMPTS {
            r = svc.prng.rand_next();
            let prefix = CompetitorObject::pick_bit(object.available_name_prefixes, r)?;
            r = r.rotate_right(8);
            let playstyle = CompetitorObject::pick_bit(object.available_playstyles, r)?;
            r = r.rotate_right(8);

            let primary = match AI_PRIMARY_COLOURS.get(usize::from(prefix)).copied()? {
                Some(colour) => colour,
                None => {
                    let colour = Colour::from_draw(r);
                    r = r.rotate_right(8);
                    colour
                }
            };
            if mask & primary.bit() != 0 {
                continue;
            }
            chosen = Some((prefix, playstyle, primary));
            break;
        }
        let Some((prefix, playstyle, primary)) = chosen else {
            debug!(company = %id, "no free colour for new competitor");
            return None;
        };

        let mut flags = PLAYSTYLE_FLAGS.get(usize::from(playstyle)).copied()?;
        let mut town = None;
        if prefix == TOWN_NAME_PREFIX {
            let towns = svc.towns.towns();
            if towns.is_empty() {
                return None;
            }
            let pick = ((r & 0xFF) as usize * towns.len()) / 256;
            let candidate = *towns.get(pick)?;
            let taken = self
                .companies()
                .any(|c| c.id != id && c.is_town_named() && c.ai_playstyle_town == Some(candidate));
            if taken {
                debug!(company = %id, town = %candidate, "town already names a company");
                return None;
            }
            town = Some(candidate);
            flags |= AiPlaystyleFlags::TOWN_ID_SET;
        }

        let mut args = vec![
            FormatArg::String(StringId::AI_NAME_PREFIXES[usize::from(prefix)]),
            FormatArg::String(object.last_name),
        ];
        if let Some(town_name) = town.and_then(|t| svc.towns.town_name(t)) {
            args.push(FormatArg::String(town_name));
        }
        let text = svc
            .strings
            .format_string(StringId::AI_PLAYSTYLE_NAMES[usize::from(playstyle)], &args);
        if self
            .companies()
            .any(|c| c.id != id && svc.strings.resolve(c.name) == text)
        {
            debug!(company = %id, name = %text, "company name already in use");
            return None;
        }
        let name = svc.strings.user_string_allocate(&text, false)?;
        Some((name, ColourScheme::from_primary(primary), flags, town))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::think::IdleThinker;
    use loco_core::{ClosestTown, MemoryStringTable, Pos2};

    struct Towns(Vec<(TownId, StringId)>);

    impl TownRegistry for Towns {
        fn towns(&self) -> Vec<TownId> {
            self.0.iter().map(|(id, _)| *id).collect()
        }
        fn town_pos(&self, _: TownId) -> Option<Pos2> {
            Some(Pos2::new(0, 0))
        }
        fn town_name(&self, town: TownId) -> Option<StringId> {
            self.0.iter().find(|(id, _)| *id == town).map(|(_, n)| *n)
        }
        fn closest_town_and_density(&self, _: Pos2) -> Option<ClosestTown> {
            None
        }
        fn most_common_building_cargo(&self) -> Option<loco_core::CargoId> {
            None
        }
    }

    struct Fixture {
        prng: Prng,
        economy: Economy,
        strings: MemoryStringTable,
        towns: Towns,
        competitors: Vec<CompetitorObject>,
    }

    impl Fixture {
        fn new(n_competitors: usize) -> Self {
            let mut strings = MemoryStringTable::new();
            let springfield = strings.intern("Springfield");
            let competitors = (0..n_competitors)
                .map(|i| CompetitorObject {
                    name: strings.intern(format!("Owner {i}")),
                    last_name: strings.intern(format!("Smith{i}")),
                    available_name_prefixes: 0x1FFF,
                    available_playstyles: 0x1FFF,
                    intelligence: 5,
                    aggressiveness: 5,
                    competitiveness: 5,
                })
                .collect();
            Self {
                prng: Prng::new(0x1234_5678, 0x9ABC_DEF0),
                economy: Economy::new(),
                strings,
                towns: Towns(vec![(TownId(0), springfield)]),
                competitors,
            }
        }

        fn services(&mut self) -> CompanyServices<'_> {
            CompanyServices {
                prng: &mut self.prng,
                economy: &self.economy,
                strings: &mut self.strings,
                towns: &self.towns,
                competitors: &self.competitors,
                current_day: 54_788,
            }
        }
    }

    #[test]
    fn player_company_takes_slot_zero_with_starting_loan() {
        let mut fx = Fixture::new(4);
        let mut manager = CompanyManager::new(4, 0, 1250);
        let id = manager.create_player_company(&mut fx.services()).unwrap();
        assert_eq!(id, CompanyId(0));
        assert!(manager.is_player_company(id));
        let player = manager.player_company().unwrap();
        assert_eq!(player.current_loan, 5000);
        assert_eq!(player.cash, 5000);
        assert_eq!(player.name, StringId::NEW_COMPANY);
        assert_eq!(player.started_date, 54_788);
        assert_eq!(manager.active_ai_companies(), 0);
    }

    #[test]
    fn ai_companies_get_distinct_colours_and_names() {
        let mut fx = Fixture::new(14);
        let mut manager = CompanyManager::new(14, 0, 1250);
        let mut svc = fx.services();
        let mut created = Vec::new();
        for _ in 0..40 {
            if let Some(c) = manager.select_new_competitor(&mut svc) {
                if let Some(id) = manager.create_company(Some(c), false, &mut svc) {
                    created.push(id);
                }
            }
        }
        assert!(!created.is_empty());
        for a in manager.companies() {
            assert!(a.name.is_user());
            for b in manager.companies().filter(|b| b.id != a.id) {
                assert_eq!(a.colours.primary.similar_mask() & b.colours.primary.bit(), 0);
                assert_ne!(svc.strings.resolve(a.name), svc.strings.resolve(b.name));
                assert_ne!(a.competitor, b.competitor);
            }
            assert_eq!(a.colours.secondary, a.colours.primary.secondary());
        }
    }

    #[test]
    fn town_named_companies_record_their_town() {
        let mut fx = Fixture::new(1);
        fx.competitors[0].available_name_prefixes = 1 << TOWN_NAME_PREFIX;
        fx.competitors[0].available_playstyles = 1 << 6;
        let mut manager = CompanyManager::new(4, 0, 1250);
        let mut svc = fx.services();
        let id = manager
            .create_company(Some(CompetitorId(0)), false, &mut svc)
            .unwrap();
        let company = manager.get(id).unwrap();
        assert!(company.is_town_named());
        assert_eq!(company.ai_playstyle_town, Some(TownId(0)));
        assert_eq!(svc.strings.resolve(company.name), "Springfield Rail");
        assert!(company.ai_playstyle_flags.contains(AiPlaystyleFlags::STYLE_1));

        // The only town is taken now.
        assert_eq!(manager.create_company(Some(CompetitorId(0)), false, &mut svc), None);
        assert_eq!(manager.companies().count(), 1);
    }

    #[test]
    fn no_towns_means_no_town_named_company() {
        let mut fx = Fixture::new(1);
        fx.competitors[0].available_name_prefixes = 1 << TOWN_NAME_PREFIX;
        fx.towns.0.clear();
        let mut manager = CompanyManager::new(4, 0, 1250);
        assert_eq!(
            manager.create_company(Some(CompetitorId(0)), false, &mut fx.services()),
            None
        );
    }

    #[test]
    fn selection_skips_used_competitors() {
        let mut fx = Fixture::new(2);
        let mut manager = CompanyManager::new(4, 0, 1250);
        let mut svc = fx.services();
        manager.create_company(Some(CompetitorId(1)), true, &mut svc).unwrap();
        for _ in 0..10 {
            assert_eq!(manager.select_new_competitor(&mut svc), Some(CompetitorId(0)));
        }
        manager.create_company(Some(CompetitorId(0)), true, &mut svc).unwrap();
        assert_eq!(manager.select_new_competitor(&mut svc), None);
    }

    #[test]
    fn delay_and_maximum_gate_spawning() {
        let mut fx = Fixture::new(4);
        let mut manager = CompanyManager::new(4, 2, 1250);
        let before = fx.prng;
        manager.produce_companies(&mut fx.services());
        assert_eq!(fx.prng, before, "delayed spawn must not draw");

        manager.update_monthly();
        manager.update_monthly();
        manager.update_monthly();
        assert_eq!(manager.competitor_start_delay(), 0);

        let mut none = CompanyManager::new(0, 0, 1250);
        none.produce_companies(&mut fx.services());
        assert_eq!(fx.prng, before);
    }

    #[test]
    fn update_thinks_round_robin_and_spawns_on_timer() {
        let mut fx = Fixture::new(8);
        let mut manager = CompanyManager::new(8, 0, 1250);
        let config = GameConfig::default();
        let mut thinker = IdleThinker;
        manager.create_player_company(&mut fx.services()).unwrap();
        let ai = manager
            .create_company(Some(CompetitorId(7)), false, &mut fx.services())
            .unwrap();

        for tick in 1..=16u32 {
            manager.update(tick, false, &config, &mut thinker, &mut fx.services());
        }
        assert_eq!(manager.get(ai).unwrap().think_state, 1);
        assert_eq!(manager.player_company().unwrap().think_state, 0);
        assert_eq!(manager.produce_ai_company_timeout(), 16);

        for tick in 17..=192u32 * 200 {
            manager.update(tick, false, &config, &mut thinker, &mut fx.services());
        }
        assert!(manager.active_ai_companies() > 1);
        assert!(manager.active_ai_companies() <= 8);
    }

    #[test]
    fn editor_mode_and_disabled_ai_skip_update() {
        let mut fx = Fixture::new(2);
        let mut manager = CompanyManager::new(2, 0, 1250);
        let mut thinker = IdleThinker;
        let disabled = GameConfig {
            company_ai_disabled: true,
            ..GameConfig::default()
        };
        for tick in 0..1000 {
            manager.update(tick, true, &GameConfig::default(), &mut thinker, &mut fx.services());
            manager.update(tick, false, &disabled, &mut thinker, &mut fx.services());
        }
        assert_eq!(manager.produce_ai_company_timeout(), 0);
        assert_eq!(manager.companies().count(), 0);
    }

    #[test]
    fn reset_clears_slots() {
        let mut fx = Fixture::new(3);
        let mut manager = CompanyManager::new(3, 0, 1250);
        manager.create_player_company(&mut fx.services());
        manager.create_company(Some(CompetitorId(2)), false, &mut fx.services());
        manager.reset();
        assert_eq!(manager.companies().count(), 0);
        assert!(manager.is_player_company(CompanyId(0)));
        assert_eq!(manager.competing_colour_mask(CompanyId(0)), 0);
    }

    #[test]
    fn manager_survives_a_json_round_trip() {
        let mut fx = Fixture::new(4);
        let mut manager = CompanyManager::new(4, 1, 1250);
        manager.create_player_company(&mut fx.services()).unwrap();
        manager.create_company(Some(CompetitorId(3)), false, &mut fx.services());
        let json = serde_json::to_string(&manager).unwrap();
        let back: CompanyManager = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manager);
    }
}
