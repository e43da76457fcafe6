#![deny(warnings)]

//! Company directory: fixed company slots, the AI think round-robin and
//! competitor spawning with name and colour allocation.

pub mod colour;
pub mod company;
pub mod competitor;
pub mod manager;
pub mod think;

pub use colour::{Colour, ColourScheme};
pub use company::{AiPlaystyleFlags, Company, CompanyFlags};
pub use competitor::CompetitorObject;
pub use manager::{CompanyManager, CompanyServices, PRODUCE_AI_COMPANY_INTERVAL};
pub use think::{AiThinker, IdleThinker};
