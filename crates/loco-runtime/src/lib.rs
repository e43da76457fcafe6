#![deny(warnings)]

//! Headless runtime: the world state and its tick ordering, synthetic map,
//! town and station collaborators, scenario loading and state digests.

pub mod error;
pub mod scenario;
pub mod sim;
pub mod synthetic;
pub mod world;

pub use error::RuntimeError;
pub use scenario::{CompetitorSpec, MapSpec, ScenarioFile, TownSpec};
pub use sim::{
    clone_world_state, init_world, run_months, run_months_in_place, Simulation, Snapshot,
    MAX_TICKS_PER_MONTH,
};
pub use synthetic::{
    SyntheticEnv, SyntheticStations, SyntheticTerrain, SyntheticTown, SyntheticTowns,
};
pub use world::{Services, WorldObjects, WorldState};

/// The scenario shipped with the repository.
pub const DEFAULT_SCENARIO_YAML: &str = include_str!("../../../assets/scenarios/default.yaml");

/// Parse [`DEFAULT_SCENARIO_YAML`].
pub fn default_scenario() -> Result<ScenarioFile, loco_core::ConfigError> {
    ScenarioFile::from_yaml_str(DEFAULT_SCENARIO_YAML)
}
