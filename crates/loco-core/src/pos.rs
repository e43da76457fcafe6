//! World and tile coordinates.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// World units per tile edge.
pub const TILE_SIZE: i32 = 32;
/// Height units per small-z step.
pub const SMALL_Z_STEP: i32 = 4;
/// Default map size in tiles.
pub const MAP_ROWS: u32 = 384;
pub const MAP_COLUMNS: u32 = 384;

/// A point in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos2 {
    pub x: i32,
    pub y: i32,
}

impl Pos2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `|dx| + |dy|`.
    pub fn manhattan_distance(self, other: Pos2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Straight-line distance, truncated.
    pub fn distance(self, other: Pos2) -> i32 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        isqrt((dx * dx + dy * dy) as u64) as i32
    }

    pub fn to_tile(self) -> TilePos {
        TilePos::new(self.x.div_euclid(TILE_SIZE), self.y.div_euclid(TILE_SIZE))
    }
}

impl Add for Pos2 {
    type Output = Pos2;
    fn add(self, rhs: Pos2) -> Pos2 {
        Pos2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pos2 {
    type Output = Pos2;
    fn sub(self, rhs: Pos2) -> Pos2 {
        Pos2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A tile coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_world(self) -> Pos2 {
        Pos2::new(self.x * TILE_SIZE, self.y * TILE_SIZE)
    }

    /// Every tile in the inclusive rectangle `a..=b`; x varies fastest.
    pub fn range(a: TilePos, b: TilePos) -> impl Iterator<Item = TilePos> {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| TilePos::new(x, y)))
    }
}

impl Add for TilePos {
    type Output = TilePos;
    fn add(self, rhs: TilePos) -> TilePos {
        TilePos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for TilePos {
    type Output = TilePos;
    fn sub(self, rhs: TilePos) -> TilePos {
        TilePos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

fn isqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}
