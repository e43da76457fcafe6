//! Choosing where a new industry may go and how many of a type the map
//! should carry.

use crate::manager::{IndustryManager, IndustryServices};
use crate::object::IndustryObjectFlags;
use loco_core::{IndustryObjectId, InvariantViolation, Pos2, Prng, TilePos};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random sites drawn before the search gives up.
pub const FIND_LOCATION_ATTEMPTS: u32 = 250;

const CLOSE_INDUSTRY_DISTANCE: i32 = 480;
const WITHIN_CLUSTER_DISTANCE: i32 = 960;
const INDUSTRIES_IN_CLUSTER: usize = 3;
const HIGH_GROUND_MIN: u8 = 48;
const LOW_GROUND_MAX: u8 = 56;
const FLAT_GROUND_MOUNTAIN_MAX: u8 = 32;
const IN_DESERT_MIN_TILES: u32 = 100;
const NEAR_DESERT_MAX_TILES: u32 = 70;
const NEAR_WATER_MIN_TILES: u32 = 10;
const AWAY_FROM_WATER_MAX_TILES: u32 = 0;
const NEAR_TOWN_MAX_DISTANCE: i32 = 576;
const AWAY_FROM_TOWN_MIN_DISTANCE: i32 = 768;
const NEAR_TREES_MIN: u32 = 25;
const OPEN_SPACE_MAX_TREES: u32 = 3;

/// Everything a creation command needs to replay the placement exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryPlacementArgs {
    pub pos: Pos2,
    pub object: IndustryObjectId,
    pub build_immediately: bool,
    pub srand0: u32,
    pub srand1: u32,
}

/// Preferred number of industries of one type.
///
/// `total` is the object's scenario total, `factor` the density setting
/// (0 low, 1 medium, 2 high). One draw is taken from `prng` on every call.
/// The jitter term divides the draw by 256 before scaling, so it is always
/// zero; the draw still happens.
pub fn cap_of_type_of_industry(total: u8, factor: u8, prng: &mut Prng) -> i32 {
    let intermediate = ((i32::from(factor) + 1) * i32::from(total)) / 3;
    let preferred = intermediate - intermediate / 4;
    let jitter = (preferred / 2) * (prng.rand_next_to(0xFF) / 256);
    preferred + jitter
}

impl IndustryManager {
    fn is_too_close_to_nearby_industries(&self, pos: Pos2) -> bool {
        self.industries()
            .any(|i| i.pos.manhattan_distance(pos) < CLOSE_INDUSTRY_DISTANCE)
    }

    fn is_outwith_cluster(&self, pos: Pos2, object: IndustryObjectId) -> bool {
        let mut same_type = 0;
        for industry in self.industries().filter(|i| i.object == object) {
            same_type += 1;
            if industry.pos.manhattan_distance(pos) < WITHIN_CLUSTER_DISTANCE {
                return false;
            }
        }
        same_type >= INDUSTRIES_IN_CLUSTER
    }

    /// Draw random map positions until one satisfies every siting rule of
    /// `object`. Each attempt takes exactly one draw from the world stream.
    pub fn find_random_new_industry_location(
        &self,
        object: IndustryObjectId,
        svc: &mut IndustryServices<'_>,
    ) -> Result<Option<Pos2>, InvariantViolation> {
        let obj = crate::manager::object_in(svc.objects, object)?;
        let flag = |f: IndustryObjectFlags| obj.has_flags(f);
        let rows = svc.terrain.map_rows() as u32;
        let cols = svc.terrain.map_columns() as u32;

        for _ in 0..FIND_LOCATION_ATTEMPTS {
            let r = svc.prng.rand_next();
            let tile = TilePos::new(
                (((r >> 16) * rows) >> 16) as i32,
                (((r & 0xFFFF) * cols) >> 16) as i32,
            );
            let pos = tile.to_world();

            if self.is_too_close_to_nearby_industries(pos) {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_IN_CLUSTERS) && self.is_outwith_cluster(pos, object) {
                continue;
            }

            let surface = svc.terrain.surface(tile);
            let base_z = surface.map(|s| s.base_z);
            if flag(IndustryObjectFlags::BUILT_ON_HIGH_GROUND)
                && base_z.map_or(true, |z| z < HIGH_GROUND_MIN)
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_ON_LOW_GROUND)
                && base_z.map_or(true, |z| z > LOW_GROUND_MAX)
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_ON_SNOW)
                && base_z.map_or(true, |z| z < svc.options.summer_snow_line)
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_BELOW_SNOW_LINE)
                && base_z.map_or(true, |z| z > svc.options.winter_snow_line)
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_ON_FLAT_GROUND)
                && svc.terrain.mountain_height(pos) > FLAT_GROUND_MOUNTAIN_MAX
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_IN_DESERT)
                && svc.terrain.count_surrounding_desert_tiles(pos) < IN_DESERT_MIN_TILES
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_NEAR_DESERT)
                && svc.terrain.count_surrounding_desert_tiles(pos) >= NEAR_DESERT_MAX_TILES
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_NEAR_WATER)
                && svc.terrain.count_surrounding_water_tiles(pos) < NEAR_WATER_MIN_TILES
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_AWAY_FROM_WATER)
                && svc.terrain.count_surrounding_water_tiles(pos) > AWAY_FROM_WATER_MAX_TILES
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_ON_WATER) && surface.map_or(false, |s| !s.water) {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_NEAR_TOWN) {
                let Some(closest) = svc.towns.closest_town_and_density(pos) else {
                    continue;
                };
                if closest.density == 0 {
                    let far = svc
                        .towns
                        .town_pos(closest.town)
                        .map_or(true, |t| t.manhattan_distance(pos) > NEAR_TOWN_MAX_DISTANCE);
                    if far {
                        continue;
                    }
                }
            }
            if flag(IndustryObjectFlags::BUILT_AWAY_FROM_TOWN) {
                let Some(closest) = svc.towns.closest_town_and_density(pos) else {
                    continue;
                };
                let near = svc
                    .towns
                    .town_pos(closest.town)
                    .map_or(true, |t| t.manhattan_distance(pos) < AWAY_FROM_TOWN_MIN_DISTANCE);
                if near {
                    continue;
                }
            }
            if flag(IndustryObjectFlags::BUILT_NEAR_TREES)
                && svc.terrain.count_surrounding_trees(pos) < NEAR_TREES_MIN
            {
                continue;
            }
            if flag(IndustryObjectFlags::BUILT_REQUIRES_OPEN_SPACE)
                && svc.terrain.count_surrounding_trees(pos) > OPEN_SPACE_MAX_TREES
            {
                continue;
            }
            return Ok(Some(pos));
        }

        debug!(object = %object, "no site found for new industry");
        Ok(None)
    }
}
