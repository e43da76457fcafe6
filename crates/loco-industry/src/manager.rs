//! The industry table and everything that walks all of it.

use crate::command::CommandDispatch;
use crate::industry::{Construction, Industry, MonthlyOutcome};
use crate::object::{IndustryObject, IndustryObjectFlags};
use crate::placement::{cap_of_type_of_industry, IndustryPlacementArgs};
use loco_core::{
    CargoId, FormatArg, IndustryId, IndustryObjectId, InvariantViolation, Pos2, Prng,
    ScenarioOptions, StationNetwork, StringTable, Terrain, TilePos, TownId, TownRegistry,
    MAX_INDUSTRIES,
};
use loco_econ::Economy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Site search attempts made by the monthly founding pass.
pub const MONTHLY_CREATION_ATTEMPTS: u32 = 25;
/// Site search attempts made while populating a new map.
pub const MAP_GENERATION_ATTEMPTS: u32 = 50;
/// Highest numeric suffix tried when an industry name is already taken.
const MAX_NAME_SUFFIX: i64 = 0xFFF;

/// Collaborators borrowed for one industry update.
pub struct IndustryServices<'a> {
    /// Loaded industry objects, indexed by `IndustryObjectId`.
    pub objects: &'a [IndustryObject],
    pub economy: &'a Economy,
    pub options: &'a ScenarioOptions,
    /// The world stream.
    pub prng: &'a mut Prng,
    pub terrain: &'a mut dyn Terrain,
    pub towns: &'a dyn TownRegistry,
    pub stations: &'a mut dyn StationNetwork,
    pub strings: &'a mut dyn StringTable,
    pub current_year: i32,
}

impl IndustryServices<'_> {
    pub fn object(&self, id: IndustryObjectId) -> Result<&IndustryObject, InvariantViolation> {
        object_in(self.objects, id)
    }
}

pub(crate) fn object_in(
    objects: &[IndustryObject],
    id: IndustryObjectId,
) -> Result<&IndustryObject, InvariantViolation> {
    objects.get(id.index()).ok_or(InvariantViolation::MissingObject {
        kind: "industry",
        id: u16::from(id.0),
    })
}

/// Fixed table of industry slots. A slot keeps its id for the industry's
/// whole life and is reused once freed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryManager {
    industries: Vec<Option<Industry>>,
}

impl Default for IndustryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IndustryManager {
    pub fn new() -> Self {
        Self {
            industries: vec![None; MAX_INDUSTRIES],
        }
    }

    /// Free every slot.
    pub fn reset(&mut self) {
        self.industries.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn get(&self, id: IndustryId) -> Option<&Industry> {
        self.industries.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: IndustryId) -> Option<&mut Industry> {
        self.industries.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Occupied slots in id order.
    pub fn industries(&self) -> impl Iterator<Item = &Industry> {
        self.industries.iter().flatten()
    }

    pub fn count(&self) -> usize {
        self.industries().count()
    }

    pub fn count_of_type(&self, object: IndustryObjectId) -> usize {
        self.industries().filter(|i| i.object == object).count()
    }

    pub(crate) fn free_slot(&mut self, id: IndustryId) -> Option<Industry> {
        self.industries.get_mut(id.index()).and_then(Option::take)
    }

    fn ids(&self) -> Vec<IndustryId> {
        self.industries().map(|i| i.id).collect()
    }

    /// Take the first free slot for a new industry of `object` and reset it.
    ///
    /// The industry is named after its object. When another industry of the
    /// same town already carries that name a numbered variant is allocated
    /// as a user string; if every number is taken the duplicate name stays.
    pub fn allocate_new_industry(
        &mut self,
        object: IndustryObjectId,
        pos: Pos2,
        prng: Prng,
        town: TownId,
        svc: &mut IndustryServices<'_>,
    ) -> Result<Option<IndustryId>, InvariantViolation> {
        let obj = object_in(svc.objects, object)?;
        let Some(slot) = self.industries.iter().position(Option::is_none) else {
            return Ok(None);
        };
        let id = IndustryId(slot as u8);

        let mut name = obj.name_id;
        for other in self.industries() {
            if other.name != name || other.town != town {
                continue;
            }
            for unique in 1..MAX_NAME_SUFFIX {
                let text = svc
                    .strings
                    .format_string(obj.name_id.next(), &[FormatArg::Number(unique)]);
                if let Some(allocated) = svc.strings.user_string_allocate(&text, true) {
                    name = allocated;
                    break;
                }
            }
        }

        self.industries[slot] = Some(Industry::new(
            id,
            object,
            pos,
            prng,
            town,
            name,
            svc.current_year,
        ));
        Ok(Some(id))
    }

    /// Whether a cargo is available to feed a new consumer: towns make it
    /// or an existing industry produces it.
    fn can_cargo_be_produced_in_world(
        &self,
        cargo: CargoId,
        svc: &IndustryServices<'_>,
    ) -> Result<bool, InvariantViolation> {
        if svc.towns.most_common_building_cargo() == Some(cargo) {
            return Ok(true);
        }
        for industry in self.industries() {
            if svc.object(industry.object)?.produces(cargo) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `obj` may be founded now: in its availability window and,
    /// for consumers, with its input available.
    pub fn can_obj_be_created(
        &self,
        obj: &IndustryObject,
        svc: &IndustryServices<'_>,
    ) -> Result<bool, InvariantViolation> {
        if !obj.is_available(svc.current_year) {
            return Ok(false);
        }
        if obj.required_cargo.is_empty() {
            return Ok(true);
        }
        let requires_all = obj.has_flags(IndustryObjectFlags::REQUIRES_ALL_CARGO);
        for &cargo in &obj.required_cargo {
            let producible = self.can_cargo_be_produced_in_world(cargo, svc)?;
            if requires_all && !producible {
                return Ok(false);
            }
            if !requires_all && producible {
                return Ok(true);
            }
        }
        Ok(requires_all)
    }

    /// Draw a cap for `object` and compare it with the live count.
    fn has_reached_cap_of_type(
        &self,
        object: IndustryObjectId,
        svc: &mut IndustryServices<'_>,
    ) -> Result<bool, InvariantViolation> {
        let obj = svc.object(object)?;
        let total = obj.total_of_type_in_scenario;
        let cap = cap_of_type_of_industry(total, svc.options.number_of_industries, svc.prng);
        Ok(self.count_of_type(object) as i32 >= cap)
    }

    /// Search for a site up to `attempts` times and submit a creation
    /// command for each site found, stopping at the first success.
    pub fn create_new_industry(
        &mut self,
        object: IndustryObjectId,
        build_immediately: bool,
        attempts: u32,
        commands: &mut dyn CommandDispatch,
        svc: &mut IndustryServices<'_>,
    ) -> Result<Option<IndustryId>, InvariantViolation> {
        for _ in 0..attempts {
            let Some(pos) = self.find_random_new_industry_location(object, svc)? else {
                continue;
            };
            let before = svc.prng.srand_0();
            svc.prng.rand_next();
            let args = IndustryPlacementArgs {
                pos,
                object,
                build_immediately,
                srand0: svc.prng.srand_0().wrapping_sub(before),
                srand1: svc.prng.srand_1(),
            };
            match commands.create_industry(self, &args, svc) {
                Ok(created) => return Ok(Some(created.id)),
                Err(err) => {
                    if let Some(violation) = err.into_invariant() {
                        return Err(violation);
                    }
                }
            }
        }
        Ok(None)
    }

    /// Monthly founding pass over every loaded object.
    pub fn try_create_new_industries_monthly(
        &mut self,
        commands: &mut dyn CommandDispatch,
        svc: &mut IndustryServices<'_>,
    ) -> Result<(), InvariantViolation> {
        if svc.options.disallow_industries_start_up {
            return Ok(());
        }
        for idx in 0..svc.objects.len() {
            let object = IndustryObjectId(idx as u8);
            if !self.can_obj_be_created(svc.object(object)?, svc)? {
                continue;
            }
            if self.has_reached_cap_of_type(object, svc)? {
                continue;
            }
            self.create_new_industry(object, false, MONTHLY_CREATION_ATTEMPTS, commands, svc)?;
        }
        Ok(())
    }

    /// Populate a fresh map: every available object is founded up to its
    /// cap, fully built.
    pub fn generate_industries(
        &mut self,
        commands: &mut dyn CommandDispatch,
        svc: &mut IndustryServices<'_>,
    ) -> Result<(), InvariantViolation> {
        for idx in 0..svc.objects.len() {
            let object = IndustryObjectId(idx as u8);
            let obj = svc.object(object)?;
            if !obj.is_available(svc.current_year) {
                continue;
            }
            if !obj.required_cargo.is_empty() {
                let available = obj
                    .required_cargo
                    .iter()
                    .filter(|&&cargo| is_cargo_produced_anywhere(cargo, &*svc))
                    .count();
                let requires_all =
                    obj.has_flags(IndustryObjectFlags::REQUIRES_ALL_CARGO);
                if (requires_all && available != obj.required_cargo.len()) || available == 0 {
                    continue;
                }
            }
            let total = obj.total_of_type_in_scenario;
            let cap = cap_of_type_of_industry(total, svc.options.number_of_industries, svc.prng);
            for _ in 0..cap {
                self.create_new_industry(object, true, MAP_GENERATION_ATTEMPTS, commands, svc)?;
            }
        }
        info!(count = self.count(), "industries generated");
        Ok(())
    }

    /// Founding pass, then every industry's month end. Industries that
    /// finished closing are removed through `commands`.
    pub fn update_monthly(
        &mut self,
        commands: &mut dyn CommandDispatch,
        svc: &mut IndustryServices<'_>,
    ) -> Result<(), InvariantViolation> {
        self.try_create_new_industries_monthly(commands, svc)?;

        let close_down_allowed = !svc.options.disallow_industries_close_down;
        for id in self.ids() {
            let Some(industry) = self.industries[id.index()].as_mut() else {
                continue;
            };
            let obj = object_in(svc.objects, industry.object)?;
            let outcome =
                industry.update_monthly(obj, svc.current_year, close_down_allowed, svc.prng);
            match outcome {
                MonthlyOutcome::RemovalRequested => {
                    if let Err(err) = commands.remove_industry(self, id, svc) {
                        if let Some(violation) = err.into_invariant() {
                            return Err(violation);
                        }
                    }
                }
                MonthlyOutcome::ClosingDown => info!(industry = %id, "industry closing down"),
                MonthlyOutcome::ProductionUp | MonthlyOutcome::ProductionDown => {
                    debug!(industry = %id, ?outcome, "industry production changed")
                }
                MonthlyOutcome::Unchanged => {}
            }
        }
        Ok(())
    }

    pub fn update_daily(&mut self, svc: &mut IndustryServices<'_>) -> Result<(), InvariantViolation> {
        for industry in self.industries.iter_mut().flatten() {
            let obj = object_in(svc.objects, industry.object)?;
            industry.update_daily(obj, svc.stations);
        }
        Ok(())
    }

    /// Per-tick farm surface scan.
    pub fn update(&mut self, svc: &mut IndustryServices<'_>) -> Result<(), InvariantViolation> {
        for industry in self.industries.iter_mut().flatten() {
            let obj = object_in(svc.objects, industry.object)?;
            industry.update(obj, svc.terrain);
        }
        Ok(())
    }

    pub fn update_produced_cargo_stats(
        &mut self,
        svc: &IndustryServices<'_>,
    ) -> Result<(), InvariantViolation> {
        for industry in self.industries.iter_mut().flatten() {
            let obj = object_in(svc.objects, industry.object)?;
            industry.update_produced_cargo_stats(obj, &*svc.stations);
        }
        Ok(())
    }

    /// Run the construction step of every building whose anchor tile falls
    /// on this tick's phase. `phase` packs the x offset in its low nibble
    /// and the y offset in its high nibble.
    ///
    /// A section advances every eighth visit; when a building's last part
    /// is done it counts towards the industry's completion. Completed
    /// industries collect the stations around each building.
    pub fn update_building_tiles(
        &mut self,
        phase: u8,
        svc: &mut IndustryServices<'_>,
    ) -> Result<(), InvariantViolation> {
        let (sx, sy) = (i32::from(phase & 0xF), i32::from(phase >> 4));
        for industry in self.industries.iter_mut().flatten() {
            if industry.is_ghost() {
                continue;
            }
            let obj = object_in(svc.objects, industry.object)?;
            let total = industry.buildings.len();
            for idx in 0..total {
                let anchor = industry.buildings[idx].anchor_tile();
                if anchor.x.rem_euclid(16) != sx || anchor.y.rem_euclid(16) != sy {
                    continue;
                }
                advance_construction(industry, idx, obj)?;

                if industry.is_complete() {
                    let building = &industry.buildings[idx];
                    let reach = if building.large { 5 } else { 4 };
                    let from = anchor - TilePos::new(4, 4);
                    let to = anchor + TilePos::new(reach, reach);
                    for station in svc.stations.stations_in_tiles(from, to) {
                        industry.stations_in_range.insert(station);
                    }
                }
            }
        }
        Ok(())
    }

    /// Cargo unloaded at an industry by a station. Returns `false` when the
    /// industry does not exist or does not accept the cargo.
    pub fn receive_cargo(
        &mut self,
        id: IndustryId,
        cargo: CargoId,
        quantity: u16,
        objects: &[IndustryObject],
    ) -> Result<bool, InvariantViolation> {
        let Some(industry) = self.get_mut(id) else {
            return Ok(false);
        };
        let obj = object_in(objects, industry.object)?;
        Ok(industry.receive_cargo(obj, cargo, quantity))
    }
}

fn advance_construction(
    industry: &mut Industry,
    idx: usize,
    obj: &IndustryObject,
) -> Result<(), InvariantViolation> {
    let total = industry.buildings.len();
    let building = &mut industry.buildings[idx];
    if building.constructed {
        return Ok(());
    }
    if building.section_progress != 7 {
        building.section_progress += 1;
        return Ok(());
    }

    let parts = obj.building_parts(building.building_type);
    if parts.is_empty() {
        return Err(InvariantViolation::EmptyBuilding {
            object: industry.object.0,
            building: building.building_type,
        });
    }
    if parts.len() > usize::from(building.num_sections) + 1 {
        building.section_progress = 0;
        building.num_sections += 1;
        return Ok(());
    }

    let clear_height = obj.building_height(building.building_type);
    let clear_z = (clear_height + 3) / 4 + i32::from(building.base_z);
    building.clear_z = u8::try_from(clear_z).unwrap_or(u8::MAX);
    building.constructed = true;
    building.section_progress = 0;
    building.num_sections = 0;

    if let Construction::InProgress { buildings_completed } = industry.construction {
        let completed = buildings_completed.saturating_add(1);
        industry.construction = if usize::from(completed) >= total {
            info!(industry = %industry.id, "industry construction complete");
            Construction::Complete
        } else {
            Construction::InProgress {
                buildings_completed: completed,
            }
        };
    }
    Ok(())
}

/// Map generation's availability test: towns make the cargo or any object
/// available this year produces it.
fn is_cargo_produced_anywhere(cargo: CargoId, svc: &IndustryServices<'_>) -> bool {
    svc.towns.most_common_building_cargo() == Some(cargo)
        || svc
            .objects
            .iter()
            .any(|obj| obj.is_available(svc.current_year) && obj.produces(cargo))
}
