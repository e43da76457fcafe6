//! Competitor objects: the owners AI companies are built around.

use loco_core::StringId;
use serde::{Deserialize, Serialize};

/// A loaded competitor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorObject {
    /// Owner's full name.
    pub name: StringId,
    pub last_name: StringId,
    /// Bit `n` allows company name prefix `n`.
    pub available_name_prefixes: u32,
    /// Bit `n` allows playstyle `n`.
    pub available_playstyles: u32,
    pub intelligence: u8,
    pub aggressiveness: u8,
    pub competitiveness: u8,
}

impl CompetitorObject {
    /// Pick an entry of `mask` with the low byte of `r`; `None` for an
    /// empty mask.
    pub(crate) fn pick_bit(mask: u32, r: u32) -> Option<u8> {
        let available: Vec<u8> = (0..32u8).filter(|bit| mask & (1 << bit) != 0).collect();
        let index = (available.len() * (r & 0xFF) as usize) / 256;
        available.get(index).copied()
    }
}
