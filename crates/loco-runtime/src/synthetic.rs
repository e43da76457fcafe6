//! Procedural stand-ins for the map, towns and stations so a scenario can
//! run without a renderer or a full world.
//!
//! Everything natural about a tile is derived from an xxh32 hash of its
//! coordinates, so only the changes industries make are stored.

use crate::world::Services;
use loco_core::{
    CargoId, ClosestTown, IndustryId, MemoryStringTable, Pos2, StationId, StationNetwork,
    StringId, SurfaceInfo, Terrain, TerrainQuery, TilePos, TopographyStyle, TownId, TownRegistry,
    SMALL_Z_STEP,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xxhash_rust::xxh32::xxh32;

/// Natural features are shared by 8x8 tile blocks.
const BLOCK_SHIFT: i32 = 3;
/// Neighbourhood radius of the mountain and surrounding-feature queries.
const NEIGHBOURHOOD: i32 = 5;
const TREE_PERCENT: u32 = 22;
const WATER_BLOCK_MODULUS: u32 = 13;
const DESERT_BLOCK_MODULUS: u32 = 17;
const TILE_SALT: u32 = 0x9E37_79B9;
const RATING_SALT: u32 = 0x85EB_CA6B;
/// Lowest rating a synthetic station reports.
const BASE_RATING: u8 = 40;

fn hash2(a: i32, b: i32, seed: u32) -> u32 {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&a.to_le_bytes());
    bytes[4..].copy_from_slice(&b.to_le_bytes());
    xxh32(&bytes, seed)
}

/// Changes industries have made to one tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct TileOverlay {
    claim: Option<(IndustryId, u8)>,
    building: Option<IndustryId>,
    base_z: Option<u8>,
    trees_cleared: bool,
    /// One bit per edge rotation.
    walls: u8,
}

impl TileOverlay {
    fn release(&mut self, industry: IndustryId) {
        if self.building == Some(industry) {
            self.building = None;
            self.walls = 0;
        }
        if matches!(self.claim, Some((owner, _)) if owner == industry) {
            self.claim = None;
            self.walls = 0;
        }
    }
}

/// Hash-generated landscape with a sparse overlay of industrial changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticTerrain {
    columns: i32,
    rows: i32,
    seed: u32,
    min_land_height: u8,
    hill_density: u8,
    relief: u8,
    snow_line: u8,
    /// Keyed by `y * columns + x`.
    overlay: BTreeMap<u32, TileOverlay>,
}

impl SyntheticTerrain {
    pub fn new(
        columns: i32,
        rows: i32,
        seed: u32,
        min_land_height: u8,
        hill_density: u8,
        topography: TopographyStyle,
        snow_line: u8,
    ) -> Self {
        let relief = match topography {
            TopographyStyle::FlatLand => 1,
            TopographyStyle::SmallHills => 6,
            TopographyStyle::Mountains => 36,
            TopographyStyle::HalfMountainsHalfHills => 24,
            TopographyStyle::HalfMountainsHalfFlat => 18,
        };
        Self {
            columns,
            rows,
            seed,
            min_land_height,
            hill_density: hill_density.min(100),
            relief,
            snow_line,
            overlay: BTreeMap::new(),
        }
    }

    fn key(&self, tile: TilePos) -> Option<u32> {
        let inside = tile.x >= 0 && tile.y >= 0 && tile.x < self.columns && tile.y < self.rows;
        inside.then(|| (tile.y * self.columns + tile.x) as u32)
    }

    fn block_hash(&self, tile: TilePos) -> u32 {
        hash2(tile.x >> BLOCK_SHIFT, tile.y >> BLOCK_SHIFT, self.seed)
    }

    fn is_water_block(&self, block: u32) -> bool {
        block % WATER_BLOCK_MODULUS == 0
    }

    fn is_desert(&self, tile: TilePos) -> bool {
        let block = self.block_hash(tile);
        !self.is_water_block(block) && block % DESERT_BLOCK_MODULUS == 1
    }

    fn natural(&self, tile: TilePos) -> SurfaceInfo {
        let block = self.block_hash(tile);
        let water = self.is_water_block(block);
        let hilly = (block >> 8) % 100 < u32::from(self.hill_density);
        let lift = if hilly && !water {
            (block >> 16) % u32::from(self.relief.max(1))
        } else {
            0
        };
        let base_z = (SMALL_Z_STEP as u32 * (u32::from(self.min_land_height) + lift)).min(248);
        let has_tree = !water && hash2(tile.x, tile.y, self.seed ^ TILE_SALT) % 100 < TREE_PERCENT;
        SurfaceInfo {
            base_z: base_z as u8,
            water,
            snow_coverage: 0,
            has_tree,
            industry: None,
            occupied: false,
        }
    }

    fn neighbourhood(&self, pos: Pos2) -> impl Iterator<Item = TilePos> + '_ {
        let centre = pos.to_tile();
        let offset = TilePos::new(NEIGHBOURHOOD, NEIGHBOURHOOD);
        TilePos::range(centre - offset, centre + offset).filter(move |t| self.key(*t).is_some())
    }

    /// Number of tiles the industries have changed.
    pub fn changed_tiles(&self) -> usize {
        self.overlay.len()
    }

    /// Tiles carrying a building of `industry`.
    pub fn buildings_of(&self, industry: IndustryId) -> usize {
        self.overlay
            .values()
            .filter(|o| o.building == Some(industry))
            .count()
    }
}

impl TerrainQuery for SyntheticTerrain {
    fn map_rows(&self) -> i32 {
        self.rows
    }

    fn map_columns(&self) -> i32 {
        self.columns
    }

    fn surface(&self, tile: TilePos) -> Option<SurfaceInfo> {
        let key = self.key(tile)?;
        let mut surface = self.natural(tile);
        if let Some(o) = self.overlay.get(&key) {
            if let Some(z) = o.base_z {
                surface.base_z = z;
            }
            surface.has_tree &= !o.trees_cleared;
            surface.industry = o.claim;
            surface.occupied = o.building.is_some();
        }
        if !surface.water && surface.base_z >= self.snow_line {
            surface.snow_coverage = 1 + ((surface.base_z - self.snow_line) / 8).min(4);
        }
        Some(surface)
    }

    fn mountain_height(&self, pos: Pos2) -> u8 {
        let (lowest, highest) = self
            .neighbourhood(pos)
            .filter_map(|t| self.surface(t))
            .fold((u8::MAX, 0u8), |(lo, hi), s| (lo.min(s.base_z), hi.max(s.base_z)));
        highest.saturating_sub(lowest)
    }

    fn count_surrounding_water_tiles(&self, pos: Pos2) -> u32 {
        self.neighbourhood(pos)
            .filter(|t| self.surface(*t).map_or(false, |s| s.water))
            .count() as u32
    }

    fn count_surrounding_desert_tiles(&self, pos: Pos2) -> u32 {
        self.neighbourhood(pos).filter(|t| self.is_desert(*t)).count() as u32
    }

    fn count_surrounding_trees(&self, pos: Pos2) -> u32 {
        self.neighbourhood(pos)
            .filter(|t| self.surface(*t).map_or(false, |s| s.has_tree))
            .count() as u32
    }
}

impl Terrain for SyntheticTerrain {
    fn is_surface_claimable(&self, tile: TilePos) -> bool {
        self.is_valid_tile(tile)
            && self
                .surface(tile)
                .map_or(false, |s| !s.water && !s.occupied)
    }

    fn claim_surface(&mut self, tile: TilePos, industry: IndustryId, growth: u8, _timer: u8) -> bool {
        if !self.is_surface_claimable(tile) {
            return false;
        }
        let Some(key) = self.key(tile) else {
            return false;
        };
        let entry = self.overlay.entry(key).or_default();
        entry.claim = Some((industry, growth));
        entry.trees_cleared = true;
        true
    }

    fn place_wall(&mut self, tile: TilePos, rotation: u8, _wall_type: u8) {
        if let Some(key) = self.key(tile) {
            self.overlay.entry(key).or_default().walls |= 1 << (rotation & 3);
        }
    }

    fn place_building(&mut self, tile: TilePos, industry: IndustryId, base_z: u8, _clear_z: u8) {
        if let Some(key) = self.key(tile) {
            let entry = self.overlay.entry(key).or_default();
            entry.building = Some(industry);
            entry.base_z = Some(base_z);
            entry.trees_cleared = true;
            entry.claim = None;
        }
    }

    fn release_industry(&mut self, industry: IndustryId) {
        for entry in self.overlay.values_mut() {
            entry.release(industry);
        }
        // Levelled ground and felled trees stay.
        self.overlay.retain(|_, o| *o != TileOverlay::default());
    }
}

/// One town of a headless scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticTown {
    pub name: StringId,
    pub pos: Pos2,
    pub population: u32,
}

impl SyntheticTown {
    fn size_class(&self) -> u8 {
        match self.population {
            0..=499 => 0,
            500..=1_999 => 1,
            2_000..=4_999 => 2,
            _ => 3,
        }
    }
}

/// Fixed towns; density drops one class per eight tiles from the centre.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticTowns {
    pub towns: Vec<SyntheticTown>,
    /// Cargo produced by town buildings.
    pub building_cargo: Option<CargoId>,
}

impl TownRegistry for SyntheticTowns {
    fn towns(&self) -> Vec<TownId> {
        (0..self.towns.len() as u16).map(TownId).collect()
    }

    fn town_pos(&self, town: TownId) -> Option<Pos2> {
        self.towns.get(town.index()).map(|t| t.pos)
    }

    fn town_name(&self, town: TownId) -> Option<StringId> {
        self.towns.get(town.index()).map(|t| t.name)
    }

    fn closest_town_and_density(&self, pos: Pos2) -> Option<ClosestTown> {
        let (idx, town, distance) = self
            .towns
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t, t.pos.manhattan_distance(pos)))
            .min_by_key(|(_, _, d)| *d)?;
        if distance >= i32::from(u16::MAX) {
            return None;
        }
        let falloff = (distance / (8 * 32)).min(3) as u8;
        Some(ClosestTown {
            town: TownId(idx as u16),
            density: town.size_class().saturating_sub(falloff),
        })
    }

    fn most_common_building_cargo(&self) -> Option<CargoId> {
        self.building_cargo
    }
}

/// Stations at fixed tiles. Ratings are hashed per station and cargo; every
/// delivery is accepted and tallied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticStations {
    tiles: Vec<TilePos>,
    seed: u32,
    /// Units delivered per cargo id.
    delivered: BTreeMap<u8, u64>,
}

impl SyntheticStations {
    pub fn new(tiles: Vec<TilePos>, seed: u32) -> Self {
        Self {
            tiles,
            seed,
            delivered: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn delivered(&self, cargo: CargoId) -> u64 {
        self.delivered.get(&cargo.0).copied().unwrap_or(0)
    }

    pub fn total_delivered(&self) -> u64 {
        self.delivered.values().sum()
    }
}

impl StationNetwork for SyntheticStations {
    fn stations_in_tiles(&self, from: TilePos, to: TilePos) -> Vec<StationId> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| (from.x..=to.x).contains(&t.x) && (from.y..=to.y).contains(&t.y))
            .map(|(i, _)| StationId(i as u16))
            .collect()
    }

    fn producer_rating(&self, station: StationId, cargo: CargoId) -> Option<u8> {
        self.tiles.get(station.index())?;
        let spread = hash2(i32::from(station.0), i32::from(cargo.0), self.seed ^ RATING_SALT) % 150;
        Some(BASE_RATING.saturating_add(spread as u8))
    }

    fn deliver_cargo(&mut self, stations: &[StationId], cargo: CargoId, quantity: u16) -> u16 {
        if stations.is_empty() {
            return 0;
        }
        *self.delivered.entry(cargo.0).or_default() += u64::from(quantity);
        quantity
    }
}

/// The collaborators a headless run owns, next to the string table they
/// share.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticEnv {
    pub terrain: SyntheticTerrain,
    pub towns: SyntheticTowns,
    pub stations: SyntheticStations,
    pub strings: MemoryStringTable,
}

impl SyntheticEnv {
    pub fn services(&mut self) -> Services<'_> {
        Services {
            terrain: &mut self.terrain,
            towns: &self.towns,
            stations: &mut self.stations,
            strings: &mut self.strings,
        }
    }
}
