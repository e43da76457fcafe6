#![deny(warnings)]

//! Industries: object descriptions, the fixed industry table, site search,
//! the creation command and the daily, monthly and per-tick lifecycle.

pub mod command;
pub mod industry;
pub mod manager;
pub mod object;
pub mod placement;

#[cfg(test)]
mod testkit;

pub use command::{
    create_industry, remove_industry, CommandDispatch, CommandError, CreateIndustryCommand,
    CreatedIndustry,
};
pub use industry::{
    Construction, Industry, IndustryBuilding, IndustryFlags, MonthlyOutcome, ProducedCargo,
    ReceivedCargo, StationSet, HISTORY_CAPACITY, INITIAL_PRODUCTION_RATE,
};
pub use manager::{
    IndustryManager, IndustryServices, MAP_GENERATION_ATTEMPTS, MONTHLY_CREATION_ATTEMPTS,
};
pub use object::{BuildingType, IndustryObject, IndustryObjectFlags, ProductionRange};
pub use placement::{cap_of_type_of_industry, IndustryPlacementArgs, FIND_LOCATION_ATTEMPTS};
