//! Scenario options and global game configuration.
//!
//! Both are plain serde structs so they can be embedded in scenario YAML
//! files. Call `validate` after deserializing.

use crate::error::ConfigError;
use crate::ids::MAX_COMPANIES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Seed for the global stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngSeed {
    pub srand0: u32,
    pub srand1: u32,
}

impl Default for RngSeed {
    fn default() -> Self {
        Self {
            srand0: 0x1234_5678,
            srand1: 0x9ABC_DEF0,
        }
    }
}

/// Landscape generator style. Only recorded; terrain is supplied by a
/// collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopographyStyle {
    #[default]
    FlatLand,
    SmallHills,
    Mountains,
    HalfMountainsHalfHills,
    HalfMountainsHalfFlat,
}

/// Per-scenario numeric settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOptions {
    pub start_year: i32,
    pub rng_seed: RngSeed,
    /// Industry density: 0 low, 1 medium, 2 high.
    pub number_of_industries: u8,
    pub max_competing_companies: u8,
    /// Months before the first competitor may appear.
    pub competitor_start_delay: u8,
    /// Base starting loan before inflation.
    pub starting_loan_size: u16,
    pub min_land_height: u8,
    pub hill_density: u8,
    pub topography_style: TopographyStyle,
    /// Surfaces at or above this base height are snowy all year.
    pub summer_snow_line: u8,
    /// Surfaces above this base height see snow in winter.
    pub winter_snow_line: u8,
    pub disallow_industries_start_up: bool,
    pub disallow_industries_close_down: bool,
    /// Found the starting industries when the map is populated. Off, the
    /// map starts empty and industries only appear through the monthly
    /// founding pass.
    pub generate_industries: bool,
    /// Scenario editor: no ticks, no AI.
    pub editor_mode: bool,
    /// Create a player-controlled company at start.
    pub create_player_company: bool,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            start_year: 1900,
            rng_seed: RngSeed::default(),
            number_of_industries: 1,
            max_competing_companies: 8,
            competitor_start_delay: 0,
            starting_loan_size: 1250,
            min_land_height: 2,
            hill_density: 50,
            topography_style: TopographyStyle::default(),
            summer_snow_line: 0x94,
            winter_snow_line: 0x50,
            disallow_industries_start_up: false,
            disallow_industries_close_down: false,
            generate_industries: true,
            editor_mode: false,
            create_player_company: true,
        }
    }
}

impl ScenarioOptions {
    /// Check documented ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1800..=2100).contains(&self.start_year) {
            return Err(ConfigError::OutOfRange {
                field: "start_year",
                value: i64::from(self.start_year),
                range: "1800..=2100",
            });
        }
        if self.number_of_industries > 2 {
            return Err(ConfigError::OutOfRange {
                field: "number_of_industries",
                value: i64::from(self.number_of_industries),
                range: "0..=2",
            });
        }
        if usize::from(self.max_competing_companies) >= MAX_COMPANIES {
            return Err(ConfigError::OutOfRange {
                field: "max_competing_companies",
                value: i64::from(self.max_competing_companies),
                range: "0..=14",
            });
        }
        if self.winter_snow_line > self.summer_snow_line {
            return Err(ConfigError::Invalid(format!(
                "winter snow line {} is above summer snow line {}",
                self.winter_snow_line, self.summer_snow_line
            )));
        }
        Ok(())
    }
}

/// Process-wide switches that are not part of a scenario.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub company_ai_disabled: bool,
    /// Vehicle-list filter; carried for completeness.
    pub display_locked_vehicles: bool,
}

/// Read and deserialize a YAML document.
pub fn load_yaml<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "loading yaml");
    Ok(serde_yaml::from_str(&text)?)
}
