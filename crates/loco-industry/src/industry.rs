//! A single industry: its buildings, production statistics and the
//! per-day, per-month and per-tick behaviour that only touches itself.

use crate::object::{IndustryObject, IndustryObjectFlags, MAX_PRODUCED_CARGO, MAX_REQUIRED_CARGO};
use bitflags::bitflags;
use loco_core::{
    CargoId, IndustryId, IndustryObjectId, Pos2, Prng, StationId, StationNetwork, StringId, Terrain,
    TilePos, TownId, MAX_STATIONS, TILE_SIZE,
};
use serde::{Deserialize, Serialize};

/// Entries kept in each monthly production history.
pub const HISTORY_CAPACITY: usize = 240;
/// Production rate of a freshly founded industry, out of 256.
pub const INITIAL_PRODUCTION_RATE: u8 = 25;
/// Stations remembered per produced cargo.
pub const STATIONS_PER_CARGO: usize = 4;
/// Farm surface tiles examined per tick.
pub const TILE_LOOP_STEPS: usize = 100;

const STATION_WORDS: usize = MAX_STATIONS / 64;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct IndustryFlags: u16 {
        /// Preview placement; skipped by every update.
        const GHOST = 1 << 0;
        const CLOSING_DOWN = 1 << 2;
    }
}

/// Construction progress of an industry as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Construction {
    InProgress { buildings_completed: u8 },
    Complete,
}

/// One placed building. Large buildings cover the anchor tile and the
/// three tiles towards +x and +y.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryBuilding {
    /// World position of the anchor tile.
    pub pos: Pos2,
    pub base_z: u8,
    pub clear_z: u8,
    pub building_type: u8,
    pub rotation: u8,
    pub large: bool,
    pub constructed: bool,
    /// Progress of the current section, `0..=7`.
    pub section_progress: u8,
    /// Parts finished so far.
    pub num_sections: u8,
}

/// Footprint offsets of a building, anchor first.
pub fn building_footprint(large: bool) -> &'static [Pos2] {
    const SMALL: [Pos2; 1] = [Pos2::new(0, 0)];
    const LARGE: [Pos2; 4] = [
        Pos2::new(0, 0),
        Pos2::new(0, TILE_SIZE),
        Pos2::new(TILE_SIZE, TILE_SIZE),
        Pos2::new(TILE_SIZE, 0),
    ];
    if large {
        &LARGE
    } else {
        &SMALL
    }
}

impl IndustryBuilding {
    pub fn anchor_tile(&self) -> TilePos {
        self.pos.to_tile()
    }

    /// Far corner of the footprint in world space.
    pub fn max_pos(&self) -> Pos2 {
        if self.large {
            self.pos + Pos2::new(TILE_SIZE, TILE_SIZE)
        } else {
            self.pos
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        building_footprint(self.large)
            .iter()
            .map(move |offset| (self.pos + *offset).to_tile())
    }
}

/// Cursor walking every tile of the map, row by row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLoop {
    current: Pos2,
}

impl TileLoop {
    pub fn current(&self) -> Pos2 {
        self.current
    }

    /// Step one tile along x, wrapping to the next row and finally back to
    /// the origin. Returns the new position.
    pub fn next(&mut self, map_columns: i32, map_rows: i32) -> Pos2 {
        self.current.x += TILE_SIZE;
        if self.current.x >= map_columns * TILE_SIZE {
            self.current.x = 0;
            self.current.y += TILE_SIZE;
            if self.current.y >= map_rows * TILE_SIZE {
                self.current.y = 0;
            }
        }
        self.current
    }
}

/// Stations whose catchment touches the industry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSet {
    words: [u64; STATION_WORDS],
}

impl StationSet {
    pub fn insert(&mut self, station: StationId) {
        let idx = station.index();
        if idx < MAX_STATIONS {
            self.words[idx / 64] |= 1 << (idx % 64);
        }
    }

    pub fn contains(&self, station: StationId) -> bool {
        let idx = station.index();
        idx < MAX_STATIONS && self.words[idx / 64] & (1 << (idx % 64)) != 0
    }

    pub fn clear(&mut self) {
        self.words = [0; STATION_WORDS];
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = StationId> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &bits)| {
            (0..64u16)
                .filter(move |b| bits & (1 << b) != 0)
                .map(move |b| StationId(w as u16 * 64 + b))
        })
    }
}

/// Statistics for one produced cargo slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedCargo {
    pub daily_target: u16,
    pub daily_production: u16,
    pub output_buffer: u16,
    pub monthly_total: u16,
    pub previous_month: u16,
    pub delivered_monthly_total: u16,
    pub delivered_previous_month: u16,
    pub percent_transported: u8,
    /// Best-rated stations, highest first.
    pub stations: [Option<StationId>; STATIONS_PER_CARGO],
    pub ratings: [u8; STATIONS_PER_CARGO],
}

/// Statistics for one required cargo slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedCargo {
    pub daily_total: u16,
    pub monthly_total: u16,
    pub previous_month: u16,
}

/// What happened to an industry at a month boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonthlyOutcome {
    Unchanged,
    ProductionUp,
    ProductionDown,
    ClosingDown,
    /// Closing and no longer producing; the slot should be freed.
    RemovalRequested,
}

/// An occupied industry slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub id: IndustryId,
    pub name: StringId,
    pub object: IndustryObjectId,
    /// Centre of the buildings, tile aligned.
    pub pos: Pos2,
    pub flags: IndustryFlags,
    pub prng: Prng,
    pub town: TownId,
    pub founding_year: i32,
    pub construction: Construction,
    pub buildings: Vec<IndustryBuilding>,
    pub colour: u8,
    /// Share of the target produced each day, out of 256.
    pub production_rate: u8,
    pub num_farm_tiles: u16,
    pub num_idle_farm_tiles: u16,
    pub tile_loop: TileLoop,
    pub produced: [ProducedCargo; MAX_PRODUCED_CARGO],
    pub received: [ReceivedCargo; MAX_REQUIRED_CARGO],
    /// Monthly production history per produced cargo, oldest first.
    pub history: [Vec<u8>; MAX_PRODUCED_CARGO],
    pub stations_in_range: StationSet,
}

fn sat_add(a: u16, b: u16) -> u16 {
    a.saturating_add(b)
}

impl Industry {
    /// A freshly allocated industry with every counter reset.
    pub fn new(
        id: IndustryId,
        object: IndustryObjectId,
        pos: Pos2,
        prng: Prng,
        town: TownId,
        name: StringId,
        founding_year: i32,
    ) -> Self {
        Self {
            id,
            name,
            object,
            pos,
            flags: IndustryFlags::empty(),
            prng,
            town,
            founding_year,
            construction: Construction::InProgress {
                buildings_completed: 0,
            },
            buildings: Vec::new(),
            colour: 0,
            production_rate: INITIAL_PRODUCTION_RATE,
            num_farm_tiles: 0,
            num_idle_farm_tiles: 0,
            tile_loop: TileLoop::default(),
            produced: Default::default(),
            received: Default::default(),
            history: [vec![0], vec![0]],
            stations_in_range: StationSet::default(),
        }
    }

    pub fn is_ghost(&self) -> bool {
        self.flags.contains(IndustryFlags::GHOST)
    }

    pub fn is_closing_down(&self) -> bool {
        self.flags.contains(IndustryFlags::CLOSING_DOWN)
    }

    pub fn is_complete(&self) -> bool {
        self.construction == Construction::Complete
    }

    /// Cargo handed over by a station. Returns `false` when this industry
    /// does not accept `cargo`.
    pub fn receive_cargo(&mut self, obj: &IndustryObject, cargo: CargoId, quantity: u16) -> bool {
        let Some(slot) = obj.required_cargo.iter().position(|&c| c == cargo) else {
            return false;
        };
        let received = &mut self.received[slot];
        received.daily_total = sat_add(received.daily_total, quantity);
        received.monthly_total = sat_add(received.monthly_total, quantity);
        true
    }

    /// Turn received cargo into output, move production towards its target
    /// and ship full loads to the best stations.
    pub fn update_daily(&mut self, obj: &IndustryObject, stations: &mut dyn StationNetwork) {
        if self.is_ghost() {
            return;
        }

        let required = obj.required_cargo.len().min(MAX_REQUIRED_CARGO);
        let mut amount: u16 = 0;
        if obj.has_flags(IndustryObjectFlags::REQUIRES_ALL_CARGO) {
            amount = u16::MAX;
            for received in &self.received[..required] {
                amount = amount.min(received.daily_total);
            }
            if amount != 0 {
                for received in &mut self.received[..required] {
                    received.daily_total -= amount;
                }
            }
        } else {
            for received in &mut self.received[..required] {
                amount = sat_add(amount, received.daily_total);
                received.daily_total = 0;
            }
        }

        let produced_slots = obj.produced_cargo.len().min(MAX_PRODUCED_CARGO);
        if amount != 0 {
            for produced in &mut self.produced[..produced_slots] {
                produced.output_buffer = sat_add(produced.output_buffer, amount);
            }
        }

        // Unused input spoils.
        for received in &mut self.received {
            received.daily_total -= sat_add(received.daily_total, 15) / 16;
        }

        for (slot, &cargo) in obj.produced_cargo.iter().take(MAX_PRODUCED_CARGO).enumerate() {
            let rate = u32::from(self.production_rate);
            let produced = &mut self.produced[slot];
            let real_target = ((u32::from(produced.daily_target) * rate) / 256) as u16;
            if real_target < produced.daily_production {
                produced.daily_production -= 1;
            } else if real_target > produced.daily_production {
                produced.daily_production += 1;
            }

            produced.output_buffer = sat_add(produced.daily_production, produced.output_buffer);
            if produced.output_buffer < 8 {
                continue;
            }
            let quantity = produced.output_buffer.min(255);
            produced.output_buffer -= quantity;
            produced.monthly_total = sat_add(produced.monthly_total, quantity);

            let targets: Vec<StationId> = produced.stations.iter().flatten().copied().collect();
            let delivered = stations.deliver_cargo(&targets, cargo, quantity);
            produced.delivered_monthly_total = sat_add(delivered, produced.delivered_monthly_total);
        }
    }

    /// Production changes, closure, history and the monthly counter roll.
    ///
    /// `global` is the world stream; closure draws come from the industry's
    /// own stream.
    pub fn update_monthly(
        &mut self,
        obj: &IndustryObject,
        current_year: i32,
        close_down_allowed: bool,
        global: &mut Prng,
    ) -> MonthlyOutcome {
        if self.is_ghost() {
            return MonthlyOutcome::Unchanged;
        }
        if self.is_closing_down()
            && self.produced[0].daily_production == 0
            && self.produced[1].daily_production == 0
        {
            return MonthlyOutcome::RemovalRequested;
        }

        let mut outcome = MonthlyOutcome::Unchanged;
        if self.is_complete() && !self.is_closing_down() && obj.required(0).is_none() {
            if self.is_production_up(obj, global) {
                for produced in &mut self.produced {
                    produced.daily_target = produced.daily_target.saturating_mul(2).min(100);
                }
                outcome = MonthlyOutcome::ProductionUp;
            } else if self.is_production_down(obj, global) {
                for produced in &mut self.produced {
                    produced.daily_target /= 2;
                }
                outcome = MonthlyOutcome::ProductionDown;
            }
        }

        if outcome == MonthlyOutcome::Unchanged
            && close_down_allowed
            && self.is_complete()
            && !self.is_closing_down()
            && self.is_closing(obj, current_year)
        {
            self.flags |= IndustryFlags::CLOSING_DOWN;
            for produced in &mut self.produced {
                produced.daily_target = 0;
            }
            outcome = MonthlyOutcome::ClosingDown;
        }

        for (history, produced) in self.history.iter_mut().zip(&self.produced) {
            if history.len() == HISTORY_CAPACITY {
                history.remove(0);
            }
            history.push((produced.monthly_total.min(12750) / 50) as u8);
        }

        for produced in &mut self.produced {
            produced.previous_month = produced.monthly_total;
            produced.monthly_total = 0;
            produced.delivered_previous_month = produced.delivered_monthly_total;
            produced.delivered_monthly_total = 0;
            let transported = produced.previous_month.min(produced.delivered_previous_month);
            produced.percent_transported = if produced.previous_month != 0 {
                (u32::from(transported) * 100 / u32::from(produced.previous_month)) as u8
            } else {
                transported as u8
            };
        }

        for received in &mut self.received {
            received.previous_month = received.monthly_total;
            received.monthly_total = 0;
        }
        outcome
    }

    fn is_production_up(&self, obj: &IndustryObject, global: &mut Prng) -> bool {
        obj.has_flags(IndustryObjectFlags::CAN_INCREASE_PRODUCTION)
            && self.produced[0].percent_transported > 70
            && global.rand_next_to(31) == 0
            && self.produced[0].daily_target < 100
            && self.produced[1].daily_target < 100
    }

    fn is_production_down(&self, obj: &IndustryObject, global: &mut Prng) -> bool {
        if !obj.has_flags(IndustryObjectFlags::CAN_DECREASE_PRODUCTION) {
            return false;
        }
        let pct = self.produced[0].percent_transported;
        let target = self.produced[0].daily_target;
        (pct > 50 && target > 20 && global.rand_next_to(31) == 0)
            || (pct <= 50 && target > 10 && global.rand_next_to(15) == 0)
    }

    fn is_closing(&mut self, obj: &IndustryObject, current_year: i32) -> bool {
        (current_year > obj.obsolete_year && self.prng.rand_next_to(0xFFFF) < 102)
            || (obj.monthly_closure_chance != 0
                && i32::from(obj.monthly_closure_chance) > self.prng.rand_next_to(0xFFFF))
    }

    /// Scan the next stretch of the map for this industry's farm tiles.
    /// After a full pass the production rate is recomputed from the count.
    pub fn update(&mut self, obj: &IndustryObject, terrain: &mut dyn Terrain) {
        if self.is_ghost() || !self.is_complete() {
            return;
        }
        let (cols, rows) = (terrain.map_columns(), terrain.map_rows());
        for _ in 0..TILE_LOOP_STEPS {
            self.count_farm_tile(obj, terrain, self.tile_loop.current());
            if self.tile_loop.next(cols, rows) == Pos2::default() {
                self.calculate_farm_production(obj, terrain);
                break;
            }
        }
    }

    fn count_farm_tile(&mut self, obj: &IndustryObject, terrain: &dyn Terrain, pos: Pos2) {
        let Some(surface) = terrain.surface(pos.to_tile()) else {
            return;
        };
        let Some((owner, growth)) = surface.industry else {
            return;
        };
        if owner != self.id {
            return;
        }
        if growth == 0 || Some(growth) != obj.farm_growth_stage_no_production {
            self.num_farm_tiles = self.num_farm_tiles.saturating_add(1);
            let snowed = !obj.has_flags(IndustryObjectFlags::FARM_PRODUCTION_IGNORES_SNOW)
                && surface.snow_coverage != 0;
            if snowed || surface.has_tree {
                self.num_idle_farm_tiles = self.num_idle_farm_tiles.saturating_add(1);
            }
        }
    }

    fn calculate_farm_production(&mut self, obj: &IndustryObject, terrain: &mut dyn Terrain) {
        let farm = i32::from(self.num_farm_tiles);
        // A sixteenth of the fields always count as productive so winter
        // does not stop production entirely.
        let idle = (i32::from(self.num_idle_farm_tiles) - farm / 16).max(0);
        let relative_size = ((farm - idle) / 25).min(255);
        let fields = i32::from(obj.farm_num_fields);
        self.production_rate = if relative_size < fields {
            ((relative_size * 256) / fields) as u8
        } else {
            255
        };

        self.num_farm_tiles = 0;
        self.num_idle_farm_tiles = 0;

        if self.production_rate >= 224 {
            return;
        }
        let [first, second] = &self.produced;
        let shipping = first.previous_month / 8 <= first.delivered_previous_month
            || second.previous_month / 8 <= second.delivered_previous_month;
        if !shipping || !self.prng.rand_bool() {
            return;
        }

        let x = self.pos.x + self.prng.rand_next_range(-15, 16) * TILE_SIZE;
        let y = self.pos.y + self.prng.rand_next_range(-15, 16) * TILE_SIZE;
        let (mut wall, mut entrance) = (obj.wall_types[0], obj.wall_types[1]);
        if obj.wall_types[2].is_some() && self.prng.rand_bool() {
            wall = obj.wall_types[2];
            entrance = obj.wall_types[3];
        }
        let timer = self.prng.rand_next_to(7) as u8;
        self.expand_grounds(obj, terrain, Pos2::new(x, y), wall, entrance, 0, timer);
    }

    /// Claim the 5x5 block around `pos` as farm land, fencing its edges.
    /// Nothing happens unless at least 20 of the tiles are claimable.
    #[allow(clippy::too_many_arguments)]
    pub fn expand_grounds(
        &mut self,
        obj: &IndustryObject,
        terrain: &mut dyn Terrain,
        pos: Pos2,
        wall: Option<u8>,
        entrance: Option<u8>,
        mut growth: u8,
        mut timer: u8,
    ) {
        let centre = pos.to_tile();
        let low = centre - TilePos::new(2, 2);
        let high = centre + TilePos::new(2, 2);
        let clamp = |t: TilePos| {
            TilePos::new(
                t.x.clamp(0, terrain.map_columns() - 1),
                t.y.clamp(0, terrain.map_rows() - 1),
            )
        };
        let (from, to) = (clamp(low), clamp(high));

        let claimable = TilePos::range(from, to)
            .filter(|&t| terrain.is_surface_claimable(t))
            .count();
        if claimable < 20 {
            return;
        }

        let mut desync = obj
            .has_flags(IndustryObjectFlags::FARM_TILES_GROWTH_STAGE_DESYNCHRONIZED)
            .then_some(self.prng);
        let mut partial = obj
            .has_flags(IndustryObjectFlags::FARM_TILES_PARTIAL_COVERAGE)
            .then_some(self.prng);

        let mut entrance_mask: u32 = 0;
        if wall.is_some() && entrance.is_some() {
            let s0 = self.prng.srand_0();
            entrance_mask = (1 << (s0 & 0xF)) | (1 << ((s0 >> 4) & 0x1F));
        }

        let mut wall_index: u32 = 0;
        for tile in TilePos::range(from, to) {
            if let Some(p) = desync.as_mut() {
                let r = p.rand_next();
                growth = (((r & 0xFF) * u32::from(obj.farm_num_growth_stages)) / 256) as u8;
                timer = ((r >> 8) & 7) as u8;
            }
            let skip_claim = partial.as_mut().map_or(false, |p| p.rand_next() & 7 != 0);
            if !skip_claim {
                terrain.claim_surface(tile, self.id, growth, timer);
            }

            let Some(plain) = wall else {
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
                let use_entrance = wall_index < 32 && entrance_mask & (1 << wall_index) != 0;
                let kind = match (use_entrance, entrance) {
                    (true, Some(e)) => e,
                    _ => plain,
                };
                wall_index += 1;
                terrain.place_wall(tile, rotation, kind);
            }
        }
    }

    /// Rebuild the best-station list of every produced cargo from the
    /// stations collected since the last call, then forget them.
    pub fn update_produced_cargo_stats(&mut self, obj: &IndustryObject, stations: &dyn StationNetwork) {
        for (slot, &cargo) in obj.produced_cargo.iter().take(MAX_PRODUCED_CARGO).enumerate() {
            let stats = &mut self.produced[slot];
            stats.stations = [None; STATIONS_PER_CARGO];

            for station in self.stations_in_range.iter() {
                let Some(rating) = stations.producer_rating(station, cargo) else {
                    continue;
                };
                let Some(idx) = (0..STATIONS_PER_CARGO)
                    .find(|&i| stats.stations[i].is_none() || stats.ratings[i] <= rating)
                else {
                    continue;
                };
                stats.stations[idx..].rotate_right(1);
                stats.ratings[idx..].rotate_right(1);
                stats.stations[idx] = Some(station);
                stats.ratings[idx] = rating;
            }

            // Each station takes its rating's share of what the better ones left.
            let mut fraction: u32 = 0xFF;
            for rating in &mut stats.ratings {
                *rating = ((u32::from(*rating) * fraction) / 256) as u8;
                fraction = u32::from(0u8.wrapping_sub(*rating));
            }
        }
        self.stations_in_range.clear();
    }
}
