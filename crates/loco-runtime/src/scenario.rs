//! Scenario files: options plus the cargo, industry and competitor tables a
//! headless run loads.

use loco_ai::CompetitorObject;
use loco_core::{
    load_yaml, CargoId, ConfigError, GameConfig, MemoryStringTable, ScenarioOptions, TilePos,
    MAX_CARGO, MAX_COMPETITORS, MAX_INDUSTRY_OBJECTS,
};
use loco_econ::{CargoObject, NUM_FACTORS};
use loco_industry::IndustryObject;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Size of the synthetic map, in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSpec {
    pub columns: i32,
    pub rows: i32,
}

impl Default for MapSpec {
    fn default() -> Self {
        Self {
            columns: 128,
            rows: 128,
        }
    }
}

/// A town placed at a tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownSpec {
    pub name: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub population: u32,
}

/// A competitor with plain-text names; interned when the world is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorSpec {
    pub name: String,
    pub last_name: String,
    pub available_name_prefixes: u32,
    pub available_playstyles: u32,
    #[serde(default)]
    pub intelligence: u8,
    #[serde(default)]
    pub aggressiveness: u8,
    #[serde(default)]
    pub competitiveness: u8,
}

impl CompetitorSpec {
    pub fn intern(&self, strings: &mut MemoryStringTable) -> CompetitorObject {
        CompetitorObject {
            name: strings.intern(self.name.as_str()),
            last_name: strings.intern(self.last_name.as_str()),
            available_name_prefixes: self.available_name_prefixes,
            available_playstyles: self.available_playstyles,
            intelligence: self.intelligence,
            aggressiveness: self.aggressiveness,
            competitiveness: self.competitiveness,
        }
    }
}

/// Everything needed to start a world.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioFile {
    pub options: ScenarioOptions,
    pub config: GameConfig,
    pub map: MapSpec,
    pub cargo: Vec<CargoObject>,
    pub industries: Vec<IndustryObject>,
    pub competitors: Vec<CompetitorSpec>,
    pub towns: Vec<TownSpec>,
    /// Station tiles; one per town centre when empty.
    pub stations: Vec<TilePos>,
    /// Cargo produced by town buildings.
    pub town_cargo: Option<CargoId>,
}

impl ScenarioFile {
    /// Read and validate a YAML scenario.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let scenario: ScenarioFile = load_yaml(path)?;
        scenario.validate()?;
        info!(
            cargo = scenario.cargo.len(),
            industries = scenario.industries.len(),
            competitors = scenario.competitors.len(),
            towns = scenario.towns.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let scenario: ScenarioFile = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.options.validate()?;

        let map = self.map;
        if !(16..=384).contains(&map.columns) || !(16..=384).contains(&map.rows) {
            return Err(ConfigError::Invalid(format!(
                "map of {}x{} tiles is outside 16..=384",
                map.columns, map.rows
            )));
        }
        check_len("cargo", self.cargo.len(), MAX_CARGO)?;
        check_len("industries", self.industries.len(), MAX_INDUSTRY_OBJECTS)?;
        check_len("competitors", self.competitors.len(), MAX_COMPETITORS)?;

        for cargo in &self.cargo {
            if usize::from(cargo.payment_index) >= NUM_FACTORS {
                return Err(ConfigError::Invalid(format!(
                    "{}: payment index {} has no inflation factor",
                    cargo.name, cargo.payment_index
                )));
            }
        }
        let known_cargo = |c: &CargoId| c.index() < self.cargo.len();
        for obj in &self.industries {
            obj.validate()?;
            if usize::from(obj.cost_index) >= NUM_FACTORS {
                return Err(ConfigError::Invalid(format!(
                    "{}: cost index {} has no inflation factor",
                    obj.name, obj.cost_index
                )));
            }
            if let Some(cargo) = obj
                .produced_cargo
                .iter()
                .chain(&obj.required_cargo)
                .find(|c| !known_cargo(c))
            {
                return Err(ConfigError::Invalid(format!(
                    "{}: cargo {cargo} is not loaded",
                    obj.name
                )));
            }
        }
        if let Some(cargo) = self.town_cargo.filter(|c| !known_cargo(c)) {
            return Err(ConfigError::Invalid(format!("town cargo {cargo} is not loaded")));
        }

        let on_map = |x: i32, y: i32| x >= 0 && y >= 0 && x < map.columns && y < map.rows;
        if let Some(town) = self.towns.iter().find(|t| !on_map(t.x, t.y)) {
            return Err(ConfigError::Invalid(format!(
                "town {} at ({}, {}) is off the map",
                town.name, town.x, town.y
            )));
        }
        if let Some(tile) = self.stations.iter().find(|t| !on_map(t.x, t.y)) {
            return Err(ConfigError::Invalid(format!(
                "station at ({}, {}) is off the map",
                tile.x, tile.y
            )));
        }
        Ok(())
    }
}

fn check_len(field: &'static str, len: usize, max: usize) -> Result<(), ConfigError> {
    if len > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: len as i64,
            range: "table capacity",
        });
    }
    Ok(())
}
