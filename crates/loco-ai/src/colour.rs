//! Company colours and the tables that pair and separate them.

use serde::{Deserialize, Serialize};

/// Number of selectable colours.
pub const COLOUR_COUNT: u8 = 31;

/// Palette colour, in palette order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Colour {
    Black,
    Grey,
    White,
    MutedDarkPurple,
    MutedPurple,
    Purple,
    DarkBlue,
    Blue,
    MutedDarkTeal,
    MutedTeal,
    DarkGreen,
    MutedSeaGreen,
    MutedGrassGreen,
    Green,
    MutedAvocadoGreen,
    MutedOliveGreen,
    Yellow,
    DarkYellow,
    Orange,
    Amber,
    DarkOrange,
    MutedDarkYellow,
    MutedYellow,
    Brown,
    MutedOrange,
    MutedDarkRed,
    DarkRed,
    Red,
    DarkPink,
    Pink,
    MutedRed,
}

use Colour::*;

const ALL: [Colour; COLOUR_COUNT as usize] = [
    Black,
    Grey,
    White,
    MutedDarkPurple,
    MutedPurple,
    Purple,
    DarkBlue,
    Blue,
    MutedDarkTeal,
    MutedTeal,
    DarkGreen,
    MutedSeaGreen,
    MutedGrassGreen,
    Green,
    MutedAvocadoGreen,
    MutedOliveGreen,
    Yellow,
    DarkYellow,
    Orange,
    Amber,
    DarkOrange,
    MutedDarkYellow,
    MutedYellow,
    Brown,
    MutedOrange,
    MutedDarkRed,
    DarkRed,
    Red,
    DarkPink,
    Pink,
    MutedRed,
];

/// Colours that look too alike to share between two companies, as a bitset
/// of palette indices.
const SIMILAR_COLOUR_MASK: [u32; COLOUR_COUNT as usize] = [
    0b11,
    0b11,
    0b100,
    0b11000,
    0b11000,
    0b100000,
    0b11000000,
    0b11000000,
    0b1100000000,
    0b1100000000,
    0b11110000000000,
    0b11110000000000,
    0b11110000000000,
    0b11110000000000,
    0b1100000000000000,
    0b1100000000000000,
    0b10110000000000000000,
    0b10110000000000000000,
    0b101000000000000000000,
    0b10110000000000000000,
    0b101000000000000000000,
    0b11000000000000000000000,
    0b11000000000000000000000,
    0b100000000000000000000000,
    0b1000000000000000000000000,
    0b10000000000000000000000000,
    0b1100000000000000000000000000,
    0b1100000000000000000000000000,
    0b110000000000000000000000000000,
    0b110000000000000000000000000000,
    0b1000000000000000000000000000000,
];

const PRIMARY_TO_SECONDARY: [Colour; COLOUR_COUNT as usize] = [
    MutedDarkPurple,
    MutedDarkRed,
    MutedTeal,
    White,
    MutedPurple,
    White,
    White,
    Blue,
    White,
    DarkRed,
    MutedGrassGreen,
    White,
    Yellow,
    MutedGrassGreen,
    DarkGreen,
    Yellow,
    Red,
    MutedOrange,
    MutedYellow,
    Amber,
    White,
    MutedDarkRed,
    White,
    Yellow,
    White,
    White,
    Yellow,
    White,
    DarkPink,
    White,
    MutedDarkRed,
];

/// Every palette index below `COLOUR_COUNT`.
pub const ALL_COLOURS_MASK: u32 = (1 << COLOUR_COUNT) - 1;

impl Colour {
    pub fn from_index(index: u8) -> Option<Colour> {
        ALL.get(usize::from(index)).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    /// Colours that clash with this one.
    pub fn similar_mask(self) -> u32 {
        SIMILAR_COLOUR_MASK[usize::from(self.index())]
    }

    /// The secondary colour a company with this primary gets.
    pub fn secondary(self) -> Colour {
        PRIMARY_TO_SECONDARY[usize::from(self.index())]
    }

    /// Colour picked by the low byte of a draw, scaled onto the palette.
    pub fn from_draw(r: u32) -> Colour {
        let index = ((r & 0xFF) * u32::from(COLOUR_COUNT)) / 256;
        ALL[index as usize]
    }
}

/// Primary and secondary colour of a company.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColourScheme {
    pub primary: Colour,
    pub secondary: Colour,
}

impl ColourScheme {
    pub fn from_primary(primary: Colour) -> Self {
        Self {
            primary,
            secondary: primary.secondary(),
        }
    }
}

impl Default for ColourScheme {
    fn default() -> Self {
        Self::from_primary(MutedSeaGreen)
    }
}
