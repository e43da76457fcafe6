//! Entity identifiers and fixed capacities.
//!
//! Ids are slot indices into fixed arrays; a slot keeps its id until it is
//! explicitly freed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Company slots.
pub const MAX_COMPANIES: usize = 15;
/// Industry slots.
pub const MAX_INDUSTRIES: usize = 128;
/// Station ids addressable from an industry's catchment bitset.
pub const MAX_STATIONS: usize = 1024;
/// Cargo object slots.
pub const MAX_CARGO: usize = 32;
/// Industry object slots.
pub const MAX_INDUSTRY_OBJECTS: usize = 16;
/// Competitor object slots.
pub const MAX_COMPETITORS: usize = 32;

macro_rules! slot_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl $name {
            /// Slot index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

slot_id!(
    /// Index into the company table.
    CompanyId(u8)
);
slot_id!(
    /// Index into the industry table.
    IndustryId(u8)
);
slot_id!(
    /// Station owned by the station network.
    StationId(u16)
);
slot_id!(
    /// Town owned by the town registry.
    TownId(u16)
);
slot_id!(
    /// Loaded cargo object.
    CargoId(u8)
);
slot_id!(
    /// Loaded industry object.
    IndustryObjectId(u8)
);
slot_id!(
    /// Loaded competitor object.
    CompetitorId(u8)
);
