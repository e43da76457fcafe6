//! Collaborator interfaces for the parts of the world this workspace does
//! not own: the tile map, towns and the station network.

use crate::ids::{CargoId, IndustryId, StationId, TownId};
use crate::pos::{Pos2, TilePos};
use crate::strings::StringId;

/// What the simulation needs to know about one surface tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Surface height in small-z units.
    pub base_z: u8,
    pub water: bool,
    /// Snow coverage level; zero means bare ground.
    pub snow_coverage: u8,
    pub has_tree: bool,
    /// An industrial ground claim and its growth stage.
    pub industry: Option<(IndustryId, u8)>,
    /// A building already stands here.
    pub occupied: bool,
}

/// Read-only map queries.
pub trait TerrainQuery {
    fn map_rows(&self) -> i32;
    fn map_columns(&self) -> i32;

    /// Surface of `tile`, `None` off the map.
    fn surface(&self, tile: TilePos) -> Option<SurfaceInfo>;

    /// Height difference between the highest and lowest surface around
    /// `pos`, in small-z units.
    fn mountain_height(&self, pos: Pos2) -> u8;

    /// Water tiles in the neighbourhood of `pos`.
    fn count_surrounding_water_tiles(&self, pos: Pos2) -> u32;

    /// Desert tiles in the neighbourhood of `pos`.
    fn count_surrounding_desert_tiles(&self, pos: Pos2) -> u32;

    /// Trees in the neighbourhood of `pos`.
    fn count_surrounding_trees(&self, pos: Pos2) -> u32;

    /// Whether `tile` lies strictly inside the usable map area.
    fn is_valid_tile(&self, tile: TilePos) -> bool {
        tile.x > 0 && tile.y > 0 && tile.x < self.map_columns() - 1 && tile.y < self.map_rows() - 1
    }
}

/// Map mutations performed by industries.
pub trait Terrain: TerrainQuery {
    /// A dry tile with nothing built on it. Existing industrial ground counts
    /// as claimable so farms can overlap.
    fn is_surface_claimable(&self, tile: TilePos) -> bool;

    /// Mark `tile` as grounds of `industry`. Returns `false` when the tile
    /// cannot be claimed.
    fn claim_surface(&mut self, tile: TilePos, industry: IndustryId, growth: u8, timer: u8) -> bool;

    /// Put a wall of `wall_type` on one edge of `tile`; rotation 0..=3.
    fn place_wall(&mut self, tile: TilePos, rotation: u8, wall_type: u8);

    /// Stand a building of `industry` on `tile`, levelling the surface to
    /// `base_z` and clearing trees. `clear_z` is the top of the building.
    fn place_building(&mut self, tile: TilePos, industry: IndustryId, base_z: u8, clear_z: u8);

    /// Drop every claim, wall and building of `industry`.
    fn release_industry(&mut self, industry: IndustryId);
}

/// Closest-town lookup result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClosestTown {
    pub town: TownId,
    /// Density class in `0..=3`, higher near the centre of large towns.
    pub density: u8,
}

/// Town information used for naming and placement.
pub trait TownRegistry {
    /// All towns in id order.
    fn towns(&self) -> Vec<TownId>;

    fn town_pos(&self, town: TownId) -> Option<Pos2>;

    fn town_name(&self, town: TownId) -> Option<StringId>;

    /// Closest town to `pos` by Manhattan distance together with its density
    /// class; `None` when no town is within reach.
    fn closest_town_and_density(&self, pos: Pos2) -> Option<ClosestTown>;

    /// The cargo most town buildings produce, if any.
    fn most_common_building_cargo(&self) -> Option<CargoId>;
}

/// Station queries and cargo hand-off.
pub trait StationNetwork {
    /// Stations with a tile inside the inclusive rectangle `from..=to`.
    fn stations_in_tiles(&self, from: TilePos, to: TilePos) -> Vec<StationId>;

    /// Rating of `station` for `cargo` when it accepts cargo from producers.
    fn producer_rating(&self, station: StationId, cargo: CargoId) -> Option<u8>;

    /// Hand `quantity` units to `stations`; returns how much was taken.
    fn deliver_cargo(&mut self, stations: &[StationId], cargo: CargoId, quantity: u16) -> u16;
}
