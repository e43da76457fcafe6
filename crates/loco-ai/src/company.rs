//! Company records.

use crate::colour::ColourScheme;
use bitflags::bitflags;
use loco_core::{CompanyId, CompetitorId, Currency, StringId, TownId};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Status and challenge flags of a company.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CompanyFlags: u32 {
        const SORTED = 1 << 3;
        const INCREASED_PERFORMANCE = 1 << 4;
        const DECREASED_PERFORMANCE = 1 << 5;
        const CHALLENGE_COMPLETED = 1 << 6;
        const CHALLENGE_FAILED = 1 << 7;
        const CHALLENGE_BEATEN_BY_OPPONENT = 1 << 8;
        const BANKRUPT = 1 << 9;
    }
}

bitflags! {
    /// Behaviour switches picked with an AI company's playstyle. Bits 0..=6
    /// steer the thinker; `TOWN_ID_SET` marks a company named after a town.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AiPlaystyleFlags: u8 {
        const STYLE_0 = 1 << 0;
        const STYLE_1 = 1 << 1;
        const STYLE_2 = 1 << 2;
        const STYLE_3 = 1 << 3;
        const STYLE_4 = 1 << 4;
        const STYLE_5 = 1 << 5;
        const STYLE_6 = 1 << 6;
        const TOWN_ID_SET = 1 << 7;
    }
}

/// Number of AI name prefixes and playstyles.
pub const NUM_NAME_PREFIXES: usize = 13;
pub const NUM_PLAYSTYLES: usize = 13;
/// Prefix whose name is taken from a town.
pub const TOWN_NAME_PREFIX: u8 = 12;

/// Playstyle flags, indexed by playstyle.
pub const PLAYSTYLE_FLAGS: [AiPlaystyleFlags; NUM_PLAYSTYLES] = {
    type F = AiPlaystyleFlags;
    let rail = F::STYLE_1.union(F::STYLE_2).union(F::STYLE_4).union(F::STYLE_5);
    [
        F::empty(),
        F::empty(),
        F::empty(),
        rail,
        F::STYLE_0.union(F::STYLE_2).union(F::STYLE_4).union(F::STYLE_5),
        F::STYLE_0
            .union(F::STYLE_1)
            .union(F::STYLE_2)
            .union(F::STYLE_3)
            .union(F::STYLE_5),
        rail,
        F::STYLE_6,
        rail,
        F::STYLE_6,
        F::STYLE_6,
        F::STYLE_6,
        F::STYLE_0
            .union(F::STYLE_1)
            .union(F::STYLE_3)
            .union(F::STYLE_4)
            .union(F::STYLE_5),
    ]
};

/// One occupied company slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: StringId,
    pub owner_name: StringId,
    /// Competitor object the owner face and name come from.
    pub competitor: Option<CompetitorId>,
    pub challenge_flags: CompanyFlags,
    pub colours: ColourScheme,
    pub ai_playstyle_flags: AiPlaystyleFlags,
    pub ai_playstyle_town: Option<TownId>,
    /// Cursor into the AI think state machine.
    pub think_state: u8,
    pub cash: Currency,
    pub current_loan: Currency,
    /// Day counter value the company was founded on.
    pub started_date: u32,
    pub performance_index: i16,
    pub history_size: u8,
}

impl Company {
    /// A fresh record with the defaults every new company starts from.
    pub fn new(id: CompanyId, competitor: Option<CompetitorId>, started_date: u32) -> Self {
        Self {
            id,
            name: StringId::NEW_COMPANY,
            owner_name: StringId::NEW_OWNER,
            competitor,
            challenge_flags: CompanyFlags::empty(),
            colours: ColourScheme::default(),
            ai_playstyle_flags: AiPlaystyleFlags::empty(),
            ai_playstyle_town: None,
            think_state: 0,
            cash: 0,
            current_loan: 0,
            started_date,
            performance_index: 0,
            history_size: 1,
        }
    }

    pub fn is_town_named(&self) -> bool {
        self.ai_playstyle_flags.contains(AiPlaystyleFlags::TOWN_ID_SET)
    }
}
