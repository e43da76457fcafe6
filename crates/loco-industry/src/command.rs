//! Industry creation and removal commands.
//!
//! The monthly founding pass and map generation never touch the map
//! directly; they fill in `IndustryPlacementArgs` and hand them to a
//! `CommandDispatch`. `CreateIndustryCommand` executes them in place.

use crate::industry::{building_footprint, Construction, Industry, IndustryBuilding};
use crate::manager::{IndustryManager, IndustryServices};
use crate::object::{IndustryObject, IndustryObjectFlags, MAX_PRODUCED_CARGO};
use crate::placement::IndustryPlacementArgs;
use loco_core::{Currency, IndustryId, InvariantViolation, Pos2, Prng, TilePos, TILE_SIZE};
use thiserror::Error;
use tracing::{debug, info};

/// Command id the per-industry stream is seeded with.
const CREATE_INDUSTRY_COMMAND_ID: u32 = 47;
/// Tiles between industries that trade cargo with each other.
const LINKED_INDUSTRY_SPACING: i32 = 24;
/// Tiles between unrelated industries.
const INDUSTRY_SPACING: i32 = 9;
const BUILDING_PLACEMENT_ATTEMPTS: usize = 25;

/// Search window per building placement attempt: `(range, min offset)` in
/// tiles. The window widens as attempts fail.
const PLACEMENT_WINDOWS: [(i32, i32); BUILDING_PLACEMENT_ATTEMPTS] = [
    (1, 0),
    (3, -1),
    (3, -1),
    (3, -1),
    (3, -1),
    (3, -1),
    (3, -1),
    (3, -1),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
    (5, -2),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("too close to another industry")]
    TooCloseToAnotherIndustry,
    #[error("a town must be built nearby first")]
    TownMustBeBuiltNearby,
    #[error("too many industries")]
    TooManyIndustries,
    #[error("no room for the industry's buildings")]
    NoRoomForBuildings,
    #[error("industry {0} does not exist")]
    UnknownIndustry(IndustryId),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl CommandError {
    /// The structural fault behind this error, if it is one. Every other
    /// variant is an ordinary refusal.
    pub fn into_invariant(self) -> Option<InvariantViolation> {
        match self {
            CommandError::Invariant(v) => Some(v),
            _ => None,
        }
    }
}

/// A successfully founded industry and what it cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatedIndustry {
    pub id: IndustryId,
    pub cost: Currency,
}

/// Where industry commands go. Replays and network play substitute their
/// own dispatcher; the simulation itself only needs the outcome.
pub trait CommandDispatch {
    fn create_industry(
        &mut self,
        industries: &mut IndustryManager,
        args: &IndustryPlacementArgs,
        svc: &mut IndustryServices<'_>,
    ) -> Result<CreatedIndustry, CommandError>;

    fn remove_industry(
        &mut self,
        industries: &mut IndustryManager,
        id: IndustryId,
        svc: &mut IndustryServices<'_>,
    ) -> Result<(), CommandError>;
}

/// Executes commands immediately against the world.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateIndustryCommand;

impl CommandDispatch for CreateIndustryCommand {
    fn create_industry(
        &mut self,
        industries: &mut IndustryManager,
        args: &IndustryPlacementArgs,
        svc: &mut IndustryServices<'_>,
    ) -> Result<CreatedIndustry, CommandError> {
        create_industry(industries, args, svc)
    }

    fn remove_industry(
        &mut self,
        industries: &mut IndustryManager,
        id: IndustryId,
        svc: &mut IndustryServices<'_>,
    ) -> Result<(), CommandError> {
        remove_industry(industries, id, svc)
    }
}

/// Validate the site, allocate a slot and place every building.
///
/// The industry's own stream is seeded from the command id and
/// `args.srand1`; all of its draws below come from that stream, never from
/// the world stream. When a building cannot be placed the slot and its
/// name are released again.
pub fn create_industry(
    industries: &mut IndustryManager,
    args: &IndustryPlacementArgs,
    svc: &mut IndustryServices<'_>,
) -> Result<CreatedIndustry, CommandError> {
    let obj = crate::manager::object_in(svc.objects, args.object)?;
    let prng = Prng::new(CREATE_INDUSTRY_COMMAND_ID, args.srand1);

    let produced = obj.produced_mask();
    let required = obj.required_mask();
    for other in industries.industries() {
        let other_obj = crate::manager::object_in(svc.objects, other.object)?;
        let linked =
            required & other_obj.produced_mask() != 0 || produced & other_obj.required_mask() != 0;
        let spacing = TILE_SIZE
            * if linked {
                LINKED_INDUSTRY_SPACING
            } else {
                INDUSTRY_SPACING
            };
        if other.pos.manhattan_distance(args.pos) < spacing {
            return Err(CommandError::TooCloseToAnotherIndustry);
        }
    }

    let town = svc
        .towns
        .closest_town_and_density(args.pos)
        .ok_or(CommandError::TownMustBeBuiltNearby)?
        .town;
    let id = industries
        .allocate_new_industry(args.object, args.pos, prng, town, svc)?
        .ok_or(CommandError::TooManyIndustries)?;

    let industry = industries.get_mut(id).ok_or(InvariantViolation::EmptySlot {
        kind: "industry",
        id: id.index(),
    })?;
    if let Err(err) = build_industry(industry, obj, args.build_immediately, svc) {
        if let Some(industry) = industries.free_slot(id) {
            svc.strings.empty_user_string(industry.name);
        }
        debug!(object = %args.object, ?err, "industry placement abandoned");
        return Err(err);
    }

    let cost = svc.economy.inflation_adjusted_cost(obj.cost_factor, obj.cost_index, 3);
    if let Some(industry) = industries.get(id) {
        info!(
            industry = %id,
            name = %svc.strings.resolve(industry.name),
            x = industry.pos.x,
            y = industry.pos.y,
            "new industry"
        );
    }
    Ok(CreatedIndustry { id, cost })
}

fn random_available_colour(prng: &mut Prng, obj: &IndustryObject) -> u8 {
    let colours = obj.colours();
    if colours.is_empty() {
        return 0;
    }
    // Draw even when only one colour is available.
    let pick = prng.rand_next_to(colours.len() as i32 - 1);
    colours[pick as usize]
}

fn build_industry(
    industry: &mut Industry,
    obj: &IndustryObject,
    build_immediately: bool,
    svc: &mut IndustryServices<'_>,
) -> Result<(), CommandError> {
    if build_immediately {
        industry.construction = Construction::Complete;
    }
    industry.colour = random_available_colour(&mut industry.prng, obj);

    // One draw feeds both the production targets and the building count.
    let rand_val = industry.prng.rand_next() & 0xFF;
    let mut production_rand = rand_val;
    for slot in 0..MAX_PRODUCED_CARGO {
        let range = obj.initial_production_rate[slot];
        let produced = &mut industry.produced[slot];
        let spread = u32::from(range.max.saturating_sub(range.min));
        produced.daily_production = 0;
        produced.daily_target = ((spread * production_rand) / 256) as u16 + range.min;
        if svc.options.editor_mode {
            produced.daily_production = produced.daily_target;
            produced.previous_month = produced.daily_production.saturating_mul(30);
        }
        production_rand = u32::from(produced.daily_target) & 0xFF;
    }

    let spread = u32::from(obj.max_num_buildings.saturating_sub(obj.min_num_buildings)) + 1;
    let num_buildings = ((spread * rand_val) / 256) as usize + usize::from(obj.min_num_buildings);

    let mut last_pos = industry.pos;
    for &building_type in obj.buildings.iter().take(num_buildings) {
        let large = obj.is_large(building_type);
        let mut placed = false;
        for (range, min) in PLACEMENT_WINDOWS {
            let r = industry.prng.rand_next();
            let rotation = if obj.has_flags(IndustryObjectFlags::NOT_ROTATABLE) {
                0
            } else {
                (r & 3) as u8
            };
            let offset = TilePos::new(
                (range * ((r >> 18) & 0xFF) as i32) / 256 + min,
                (range * ((r >> 2) & 0xFF) as i32) / 256 + min,
            );
            let pos = last_pos + offset.to_world();
            let max = if large {
                pos + Pos2::new(TILE_SIZE, TILE_SIZE)
            } else {
                pos
            };
            let overlaps = industry.buildings.iter().any(|b| {
                let (lo, hi) = (b.pos, b.max_pos());
                pos.x <= hi.x && pos.y <= hi.y && max.x >= lo.x && max.y >= lo.y
            });
            if overlaps {
                continue;
            }
            let Some(building) = place_industry_building(
                industry.id,
                obj,
                pos,
                rotation,
                building_type,
                build_immediately,
                svc,
            ) else {
                continue;
            };
            industry.buildings.push(building);
            last_pos = pos;
            placed = true;
            break;
        }
        if !placed {
            return Err(CommandError::NoRoomForBuildings);
        }
    }

    if !industry.buildings.is_empty() {
        let n = industry.buildings.len() as i32;
        let half = TILE_SIZE / 2;
        let (total_x, total_y) = industry.buildings.iter().fold((0, 0), |(x, y), b| {
            let extra = if b.large { half } else { 0 };
            (x + b.pos.x + extra, y + b.pos.y + extra)
        });
        industry.pos = Pos2::new(
            (total_x / n + half) & !(TILE_SIZE - 1),
            (total_y / n + half) & !(TILE_SIZE - 1),
        );

        claim_building_surroundings(industry, obj, svc);
        expand_initial_fields(industry, obj, svc);
    }
    Ok(())
}

/// Test the whole footprint, then stand the building on it. The surface
/// is levelled to the highest corner of the footprint.
fn place_industry_building(
    id: IndustryId,
    obj: &IndustryObject,
    pos: Pos2,
    rotation: u8,
    building_type: u8,
    build_immediately: bool,
    svc: &mut IndustryServices<'_>,
) -> Option<IndustryBuilding> {
    let large = obj.is_large(building_type);
    let tiles: Vec<TilePos> = building_footprint(large)
        .iter()
        .map(|offset| (pos + *offset).to_tile())
        .collect();

    let base_z = tiles
        .iter()
        .filter(|&&t| svc.terrain.is_valid_tile(t))
        .filter_map(|&t| svc.terrain.surface(t))
        .map(|s| s.base_z)
        .max()
        .unwrap_or(0);
    let clear_height = (obj.building_height(building_type) + 3) & !3;
    let clear_z = u8::try_from(clear_height / 4 + i32::from(base_z)).unwrap_or(u8::MAX);

    let on_water = obj.has_flags(IndustryObjectFlags::BUILT_ON_WATER);
    for &tile in &tiles {
        if !svc.terrain.is_valid_tile(tile) {
            return None;
        }
        let surface = svc.terrain.surface(tile)?;
        if surface.occupied || surface.water != on_water {
            return None;
        }
    }

    for &tile in &tiles {
        svc.terrain.place_building(tile, id, base_z, clear_z);
    }
    Some(IndustryBuilding {
        pos,
        base_z,
        clear_z,
        building_type,
        rotation,
        large,
        constructed: build_immediately,
        section_progress: 0,
        num_sections: 0,
    })
}

/// Claim the ring of tiles around each building as idle farm land and fence
/// it. Walls go on in the order west, east, north, south for each tile.
fn claim_building_surroundings(
    industry: &Industry,
    obj: &IndustryObject,
    svc: &mut IndustryServices<'_>,
) {
    let Some(idle_stage) = obj.farm_growth_stage_no_production else {
        return;
    };
    let mut entrance_mask: u32 = 0;
    if obj.building_wall_entrance.is_some() {
        let s0 = industry.prng.srand_0();
        entrance_mask |= 1 << (s0 & 0xF);
        entrance_mask |= 1 << ((s0 >> 4) & 0xF);
    }

    for building in &industry.buildings {
        let low = building.anchor_tile() - TilePos::new(1, 1);
        let span = if building.large { 3 } else { 2 };
        let high = low + TilePos::new(span, span);
        for tile in TilePos::range(low, high) {
            svc.terrain.claim_surface(tile, industry.id, idle_stage, 0);
            let Some(wall) = obj.building_wall else {
                continue;
            };
            let edges = [
                (tile.x == low.x, 0),
                (tile.x == high.x, 2),
                (tile.y == low.y, 3),
                (tile.y == high.y, 1),
            ];
            for (on_edge, rotation) in edges {
                if !on_edge {
                    continue;
                }
                let entrance = entrance_mask & 1 != 0;
                entrance_mask = entrance_mask.rotate_right(1);
                let kind = match (entrance, obj.building_wall_entrance) {
                    (true, Some(e)) => e,
                    _ => wall,
                };
                svc.terrain.place_wall(tile, rotation, kind);
            }
        }
    }
}

/// Scatter the farm's first fields around its centre.
fn expand_initial_fields(industry: &mut Industry, obj: &IndustryObject, svc: &mut IndustryServices<'_>) {
    if obj.farm_num_growth_stages == 0 {
        return;
    }
    let fields = i32::from(obj.farm_num_fields);
    let expansions = ((fields * industry.prng.rand_next_to(0xFF)) / 256 + 1) * 4;
    for _ in 0..expansions {
        let r = industry.prng.rand_next();
        let growth = (((r & 0xFF) * u32::from(obj.farm_num_growth_stages)) / 256) as u8;
        let timer = ((r >> 8) & 7) as u8;
        let offset = TilePos::new(((r >> 11) & 0x1F) as i32 - 15, ((r >> 16) & 0x1F) as i32 - 15);
        let pos = industry.pos + offset.to_world();
        let alternate = (r >> 21) & 1 != 0 && obj.wall_types[2].is_some();
        let (wall, entrance) = if alternate {
            (obj.wall_types[2], obj.wall_types[3])
        } else {
            (obj.wall_types[0], obj.wall_types[1])
        };
        industry.expand_grounds(obj, svc.terrain, pos, wall, entrance, growth, timer);
    }
}

/// Free an industry's slot, its name and everything it left on the map.
pub fn remove_industry(
    industries: &mut IndustryManager,
    id: IndustryId,
    svc: &mut IndustryServices<'_>,
) -> Result<(), CommandError> {
    let industry = industries
        .free_slot(id)
        .ok_or(CommandError::UnknownIndustry(id))?;
    svc.terrain.release_industry(id);
    svc.strings.empty_user_string(industry.name);
    info!(industry = %id, "industry removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::fixtures;
    use crate::testkit::TestWorld as World;
    use loco_core::{IndustryObjectId, StringTable, TerrainQuery, TownId};

    fn args(object: u8, x: i32, y: i32, build_immediately: bool) -> IndustryPlacementArgs {
        IndustryPlacementArgs {
            pos: Pos2::new(x, y),
            object: IndustryObjectId(object),
            build_immediately,
            srand0: 0,
            srand1: 0xC0FFEE,
        }
    }

    #[test]
    fn coal_mine_is_founded_under_construction() {
        let mut world = World::new(vec![fixtures::coal_mine()]);
        let mut industries = IndustryManager::new();
        let created = create_industry(&mut industries, &args(0, 1024, 1024, false), &mut world.services())
            .unwrap();

        // 400 * 1024 / 8 at base inflation.
        assert_eq!(created.cost, 51_200);
        let industry = industries.get(created.id).unwrap();
        assert!((2..=4).contains(&industry.buildings.len()));
        assert!(industry.buildings.iter().all(|b| !b.constructed));
        assert_eq!(industry.construction, Construction::InProgress { buildings_completed: 0 });
        assert!([1, 3].contains(&industry.colour));
        assert!((4..=12).contains(&industry.produced[0].daily_target));
        assert_eq!(industry.produced[0].daily_production, 0);
        assert_eq!(industry.pos.x % 32, 0);
        assert_eq!(industry.pos.y % 32, 0);
        assert_eq!(world.strings.resolve(industry.name), "Coal Mine");

        let tiles: usize = industry.buildings.iter().map(|b| b.tiles().count()).sum();
        assert_eq!(world.terrain.buildings.len(), tiles);
        assert!(world.terrain.buildings.iter().all(|b| b.1 == created.id));
        // The first building always lands on the requested tile.
        assert_eq!(industry.buildings[0].pos, Pos2::new(1024, 1024));
    }

    #[test]
    fn buildings_never_overlap() {
        let mut world = World::new(vec![fixtures::coal_mine()]);
        let mut industries = IndustryManager::new();
        let created = create_industry(&mut industries, &args(0, 1024, 1024, false), &mut world.services())
            .unwrap();
        let industry = industries.get(created.id).unwrap();
        let mut tiles: Vec<TilePos> = industry.buildings.iter().flat_map(|b| b.tiles()).collect();
        let before = tiles.len();
        tiles.sort_by_key(|t| (t.x, t.y));
        tiles.dedup();
        assert_eq!(tiles.len(), before);
    }

    #[test]
    fn build_immediately_completes_everything() {
        let mut world = World::new(vec![fixtures::coal_mine()]);
        let mut industries = IndustryManager::new();
        let created = create_industry(&mut industries, &args(0, 1024, 1024, true), &mut world.services())
            .unwrap();
        let industry = industries.get(created.id).unwrap();
        assert!(industry.is_complete());
        assert!(industry.buildings.iter().all(|b| b.constructed));
    }

    #[test]
    fn editor_mode_starts_at_full_production() {
        let mut world = World::new(vec![fixtures::coal_mine()]);
        world.options.editor_mode = true;
        let mut industries = IndustryManager::new();
        let created = create_industry(&mut industries, &args(0, 1024, 1024, true), &mut world.services())
            .unwrap();
        let produced = &industries.get(created.id).unwrap().produced[0];
        assert_eq!(produced.daily_production, produced.daily_target);
        assert_eq!(produced.previous_month, produced.daily_target * 30);
    }

    #[test]
    fn spacing_depends_on_cargo_links() {
        let mut world = World::new(vec![fixtures::coal_mine(), fixtures::factory()]);
        let mut industries = IndustryManager::new();
        industries
            .allocate_new_industry(
                IndustryObjectId(0),
                Pos2::new(1024, 1024),
                Prng::new(47, 0),
                TownId(0),
                &mut world.services(),
            )
            .unwrap();

        let err = create_industry(&mut industries, &args(0, 1024 + 256, 1024, false), &mut world.services())
            .unwrap_err();
        assert_eq!(err, CommandError::TooCloseToAnotherIndustry);

        // The factory takes coal, so it must keep 24 tiles away.
        let err = create_industry(&mut industries, &args(1, 1024 + 320, 1024, false), &mut world.services())
            .unwrap_err();
        assert_eq!(err, CommandError::TooCloseToAnotherIndustry);

        create_industry(&mut industries, &args(0, 1024 + 320, 1024, false), &mut world.services())
            .unwrap();
    }

    #[test]
    fn a_town_is_required() {
        let mut world = World::new(vec![fixtures::coal_mine()]);
        world.towns.towns.clear();
        let mut industries = IndustryManager::new();
        let err = create_industry(&mut industries, &args(0, 1024, 1024, false), &mut world.services())
            .unwrap_err();
        assert_eq!(err, CommandError::TownMustBeBuiltNearby);
        assert_eq!(industries.count(), 0);
    }

    #[test]
    fn full_table_refuses_new_industries() {
        let mut world = World::new(vec![fixtures::coal_mine()]);
        let mut industries = IndustryManager::new();
        for i in 0..128 {
            let pos = Pos2::new((i % 16) * 320, (i / 16) * 320);
            industries
                .allocate_new_industry(
                    IndustryObjectId(0),
                    pos,
                    Prng::new(47, i as u32),
                    TownId(0),
                    &mut world.services(),
                )
                .unwrap()
                .unwrap();
        }
        let err = create_industry(&mut industries, &args(0, 20_000, 20_000, false), &mut world.services())
            .unwrap_err();
        assert_eq!(err, CommandError::TooManyIndustries);
    }

    #[test]
    fn failed_placement_releases_slot_and_name() {
        let mut world = World::new(vec![fixtures::coal_mine()]);
        let mut industries = IndustryManager::new();
        industries
            .allocate_new_industry(
                IndustryObjectId(0),
                Pos2::new(320, 320),
                Prng::new(47, 0),
                TownId(0),
                &mut world.services(),
            )
            .unwrap();
        let cols = world.terrain.map_columns();
        let rows = world.terrain.map_rows();
        for tile in TilePos::range(TilePos::new(0, 0), TilePos::new(cols - 1, rows - 1)) {
            world.terrain.occupy(tile);
        }

        let err = create_industry(&mut industries, &args(0, 1024, 1024, false), &mut world.services())
            .unwrap_err();
        assert_eq!(err, CommandError::NoRoomForBuildings);
        assert_eq!(industries.count(), 1);
        assert_eq!(world.strings.user_strings_in_use(), 0);
    }

    #[test]
    fn farm_fences_its_yard_and_sows_fields() {
        let mut world = World::new(vec![fixtures::farm()]);
        let mut industries = IndustryManager::new();
        let created = create_industry(&mut industries, &args(0, 1024, 1024, false), &mut world.services())
            .unwrap();

        let industry = industries.get(created.id).unwrap();
        assert_eq!(industry.buildings.len(), 1);
        assert_eq!(industry.buildings[0].rotation, 0);
        assert_eq!(industry.pos, Pos2::new(1024, 1024));

        let rotations: Vec<u8> = world.terrain.walls.iter().take(12).map(|w| w.1).collect();
        assert_eq!(rotations, vec![0, 3, 3, 2, 3, 0, 2, 0, 1, 1, 2, 1]);
        let yard = &world.terrain.walls[..12];
        assert!(yard.iter().all(|w| w.2 == 3 || w.2 == 4));
        assert!(yard.iter().filter(|w| w.2 == 4).count() <= 2);

        let claims: Vec<(TilePos, IndustryId)> = world.terrain.claims().collect();
        assert!(claims.len() >= 8);
        assert!(claims.iter().all(|c| c.1 == created.id));
        let yard_tile = TilePos::new(32, 32);
        assert!(claims.iter().all(|c| c.0 != yard_tile));
    }

    #[test]
    fn removal_clears_the_map() {
        let mut world = World::new(vec![fixtures::farm()]);
        let mut industries = IndustryManager::new();
        let created = create_industry(&mut industries, &args(0, 1024, 1024, true), &mut world.services())
            .unwrap();
        remove_industry(&mut industries, created.id, &mut world.services()).unwrap();

        assert_eq!(industries.count(), 0);
        assert!(world.terrain.buildings.is_empty());
        assert_eq!(world.terrain.claims().count(), 0);
        assert_eq!(
            remove_industry(&mut industries, created.id, &mut world.services()),
            Err(CommandError::UnknownIndustry(created.id))
        );
    }

    #[test]
    fn only_invariant_errors_escape() {
        let violation = InvariantViolation::EmptySlot { kind: "industry", id: 3 };
        assert_eq!(
            CommandError::from(violation).into_invariant(),
            Some(InvariantViolation::EmptySlot { kind: "industry", id: 3 })
        );
        assert_eq!(CommandError::NoRoomForBuildings.into_invariant(), None);
    }
}
