#![deny(warnings)]

//! Core types for the transport simulation: the rotate/add random generator,
//! the calendar and game clock, ids, coordinates, string tables, scenario
//! options and the interfaces to map, town and station collaborators.

pub mod clock;
pub mod config;
pub mod date;
pub mod env;
pub mod error;
pub mod ids;
pub mod pos;
pub mod prng;
pub mod strings;

pub use clock::{DayChange, GameClock, DAY_PROGRESSION_STEP};
pub use config::{load_yaml, GameConfig, RngSeed, ScenarioOptions, TopographyStyle};
pub use date::{calc_date, calc_days, is_leap_year, month_total_days, Date, Month, BASE_YEAR};
pub use env::{ClosestTown, StationNetwork, SurfaceInfo, Terrain, TerrainQuery, TownRegistry};
pub use error::{ConfigError, InvariantViolation};
pub use ids::*;
pub use pos::{Pos2, TilePos, SMALL_Z_STEP, TILE_SIZE};
pub use prng::Prng;
pub use strings::{FormatArg, MemoryStringTable, StringId, StringTable};

/// Signed money amount in the game's base currency unit.
pub type Currency = i64;
