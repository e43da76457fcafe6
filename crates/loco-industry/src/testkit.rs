//! In-memory collaborators for unit tests.

use crate::manager::IndustryServices;
use crate::object::IndustryObject;
use loco_core::{
    CargoId, ClosestTown, IndustryId, MemoryStringTable, Pos2, Prng, ScenarioOptions, StationId,
    StationNetwork, StringId, SurfaceInfo, Terrain, TerrainQuery, TilePos, TownId, TownRegistry,
};
use loco_econ::Economy;
use std::collections::BTreeMap;

/// A flat, dry map with optional water, trees and fixed neighbourhood
/// counts.
pub struct FlatTerrain {
    cols: i32,
    rows: i32,
    tiles: Vec<SurfaceInfo>,
    pub mountain_height: u8,
    pub water_nearby: u32,
    pub desert_nearby: u32,
    pub trees_nearby: u32,
    /// `(tile, rotation, wall type)` in placement order.
    pub walls: Vec<(TilePos, u8, u8)>,
    /// `(tile, industry, base z, clear z)` in placement order.
    pub buildings: Vec<(TilePos, IndustryId, u8, u8)>,
}

impl FlatTerrain {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            tiles: vec![SurfaceInfo::default(); (cols * rows) as usize],
            mountain_height: 0,
            water_nearby: 0,
            desert_nearby: 0,
            trees_nearby: 0,
            walls: Vec::new(),
            buildings: Vec::new(),
        }
    }

    fn index(&self, tile: TilePos) -> Option<usize> {
        (tile.x >= 0 && tile.y >= 0 && tile.x < self.cols && tile.y < self.rows)
            .then(|| (tile.y * self.cols + tile.x) as usize)
    }

    fn tile_mut(&mut self, tile: TilePos) -> Option<&mut SurfaceInfo> {
        let idx = self.index(tile)?;
        self.tiles.get_mut(idx)
    }

    pub fn set_water(&mut self, tile: TilePos) {
        if let Some(s) = self.tile_mut(tile) {
            s.water = true;
        }
    }

    pub fn plant_tree(&mut self, tile: TilePos) {
        if let Some(s) = self.tile_mut(tile) {
            s.has_tree = true;
        }
    }

    #[allow(dead_code)]
    pub fn set_height(&mut self, tile: TilePos, base_z: u8) {
        if let Some(s) = self.tile_mut(tile) {
            s.base_z = base_z;
        }
    }

    pub fn occupy(&mut self, tile: TilePos) {
        if let Some(s) = self.tile_mut(tile) {
            s.occupied = true;
        }
    }

    /// Every claimed tile and its owner.
    pub fn claims(&self) -> impl Iterator<Item = (TilePos, IndustryId)> + '_ {
        self.tiles.iter().enumerate().filter_map(|(i, s)| {
            let i = i as i32;
            s.industry
                .map(|(owner, _)| (TilePos::new(i % self.cols, i / self.cols), owner))
        })
    }
}

impl TerrainQuery for FlatTerrain {
    fn map_rows(&self) -> i32 {
        self.rows
    }

    fn map_columns(&self) -> i32 {
        self.cols
    }

    fn surface(&self, tile: TilePos) -> Option<SurfaceInfo> {
        self.index(tile).map(|i| self.tiles[i])
    }

    fn mountain_height(&self, _pos: Pos2) -> u8 {
        self.mountain_height
    }

    fn count_surrounding_water_tiles(&self, _pos: Pos2) -> u32 {
        self.water_nearby
    }

    fn count_surrounding_desert_tiles(&self, _pos: Pos2) -> u32 {
        self.desert_nearby
    }

    fn count_surrounding_trees(&self, _pos: Pos2) -> u32 {
        self.trees_nearby
    }
}

impl Terrain for FlatTerrain {
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
        match self.tile_mut(tile) {
            Some(s) => {
                s.industry = Some((industry, growth));
                true
            }
            None => false,
        }
    }

    fn place_wall(&mut self, tile: TilePos, rotation: u8, wall_type: u8) {
        self.walls.push((tile, rotation, wall_type));
    }

    fn place_building(&mut self, tile: TilePos, industry: IndustryId, base_z: u8, clear_z: u8) {
        if let Some(s) = self.tile_mut(tile) {
            s.occupied = true;
            s.has_tree = false;
            s.industry = None;
            s.base_z = base_z;
        }
        self.buildings.push((tile, industry, base_z, clear_z));
    }

    fn release_industry(&mut self, industry: IndustryId) {
        let owned: Vec<TilePos> = self
            .buildings
            .iter()
            .filter(|b| b.1 == industry)
            .map(|b| b.0)
            .collect();
        for tile in owned {
            if let Some(s) = self.tile_mut(tile) {
                s.occupied = false;
            }
        }
        self.buildings.retain(|b| b.1 != industry);
        for s in &mut self.tiles {
            if matches!(s.industry, Some((owner, _)) if owner == industry) {
                s.industry = None;
            }
        }
    }
}

/// Stations with fixed ratings that accept everything offered.
#[derive(Default)]
pub struct Stations {
    pub ratings: BTreeMap<(StationId, CargoId), u8>,
    pub tiles: BTreeMap<TilePos, StationId>,
    /// `(stations, cargo, quantity)` per delivery.
    pub delivered: Vec<(Vec<StationId>, CargoId, u16)>,
}

impl StationNetwork for Stations {
    fn stations_in_tiles(&self, from: TilePos, to: TilePos) -> Vec<StationId> {
        let mut found: Vec<StationId> = TilePos::range(from, to)
            .filter_map(|t| self.tiles.get(&t).copied())
            .collect();
        found.sort();
        found.dedup();
        found
    }

    fn producer_rating(&self, station: StationId, cargo: CargoId) -> Option<u8> {
        self.ratings.get(&(station, cargo)).copied()
    }

    fn deliver_cargo(&mut self, stations: &[StationId], cargo: CargoId, quantity: u16) -> u16 {
        self.delivered.push((stations.to_vec(), cargo, quantity));
        if stations.is_empty() {
            0
        } else {
            quantity
        }
    }
}

/// Towns at fixed positions, all of density class 0.
#[derive(Default)]
pub struct Towns {
    pub towns: Vec<(Pos2, StringId)>,
    pub common_cargo: Option<CargoId>,
}

impl TownRegistry for Towns {
    fn towns(&self) -> Vec<TownId> {
        (0..self.towns.len() as u16).map(TownId).collect()
    }

    fn town_pos(&self, town: TownId) -> Option<Pos2> {
        self.towns.get(town.index()).map(|t| t.0)
    }

    fn town_name(&self, town: TownId) -> Option<StringId> {
        self.towns.get(town.index()).map(|t| t.1)
    }

    fn closest_town_and_density(&self, pos: Pos2) -> Option<ClosestTown> {
        self.towns
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| t.0.manhattan_distance(pos))
            .map(|(i, _)| ClosestTown {
                town: TownId(i as u16),
                density: 0,
            })
    }

    fn most_common_building_cargo(&self) -> Option<CargoId> {
        self.common_cargo
    }
}

/// A 64x64 flat map with one town in the middle and every collaborator an
/// industry update needs.
pub struct TestWorld {
    pub objects: Vec<IndustryObject>,
    pub economy: Economy,
    pub options: ScenarioOptions,
    pub prng: Prng,
    pub terrain: FlatTerrain,
    pub towns: Towns,
    pub stations: Stations,
    pub strings: MemoryStringTable,
    pub year: i32,
}

impl TestWorld {
    pub fn new(mut objects: Vec<IndustryObject>) -> Self {
        let mut strings = MemoryStringTable::new();
        for obj in &mut objects {
            obj.name_id = strings.intern_object_name(&obj.name);
        }
        let mut towns = Towns::default();
        towns.towns.push((Pos2::new(1024, 1024), StringId(1)));
        Self {
            objects,
            economy: Economy::new(),
            options: ScenarioOptions::default(),
            prng: Prng::new(1, 2),
            terrain: FlatTerrain::new(64, 64),
            towns,
            stations: Stations::default(),
            strings,
            year: 1950,
        }
    }

    pub fn services(&mut self) -> IndustryServices<'_> {
        IndustryServices {
            objects: &self.objects,
            economy: &self.economy,
            options: &self.options,
            prng: &mut self.prng,
            terrain: &mut self.terrain,
            towns: &self.towns,
            stations: &mut self.stations,
            strings: &mut self.strings,
            current_year: self.year,
        }
    }
}
