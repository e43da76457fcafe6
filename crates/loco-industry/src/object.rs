//! Industry object definitions as loaded from a scenario.

use bitflags::bitflags;
use loco_core::{CargoId, ConfigError, StringId};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Placement rules and production behaviour of an industry type.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct IndustryObjectFlags: u32 {
        const BUILT_IN_CLUSTERS = 1 << 0;
        const BUILT_ON_HIGH_GROUND = 1 << 1;
        const BUILT_ON_LOW_GROUND = 1 << 2;
        const BUILT_ON_SNOW = 1 << 3;
        const BUILT_BELOW_SNOW_LINE = 1 << 4;
        const BUILT_ON_FLAT_GROUND = 1 << 5;
        const BUILT_IN_DESERT = 1 << 6;
        const BUILT_NEAR_DESERT = 1 << 7;
        const BUILT_ON_WATER = 1 << 8;
        const BUILT_NEAR_WATER = 1 << 9;
        const BUILT_AWAY_FROM_WATER = 1 << 10;
        const BUILT_NEAR_TOWN = 1 << 11;
        const BUILT_AWAY_FROM_TOWN = 1 << 12;
        const BUILT_NEAR_TREES = 1 << 13;
        const BUILT_REQUIRES_OPEN_SPACE = 1 << 14;
        const CAN_INCREASE_PRODUCTION = 1 << 16;
        const CAN_DECREASE_PRODUCTION = 1 << 17;
        const REQUIRES_ALL_CARGO = 1 << 18;
        const NOT_ROTATABLE = 1 << 19;
        const FARM_PRODUCTION_IGNORES_SNOW = 1 << 20;
        const FARM_TILES_GROWTH_STAGE_DESYNCHRONIZED = 1 << 21;
        const FARM_TILES_PARTIAL_COVERAGE = 1 << 22;
    }
}

/// Most cargo kinds an industry produces.
pub const MAX_PRODUCED_CARGO: usize = 2;
/// Most cargo kinds an industry accepts.
pub const MAX_REQUIRED_CARGO: usize = 3;
/// Upper bound on industries of one type.
pub const MAX_TOTAL_OF_TYPE: u8 = 32;

/// Inclusive range for a new industry's daily production target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRange {
    pub min: u16,
    pub max: u16,
}

/// A building type: its parts, bottom first, and whether it covers 2x2 tiles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingType {
    pub parts: Vec<u8>,
    #[serde(default)]
    pub large: bool,
}

/// Static description of an industry type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryObject {
    pub name: String,
    /// Plain name template; the numbered variant sits at `name_id.next()`.
    /// Filled in when the object is registered with a string table.
    #[serde(default)]
    pub name_id: StringId,
    #[serde(default)]
    pub flags: IndustryObjectFlags,
    pub designed_year: i32,
    pub obsolete_year: i32,
    pub total_of_type_in_scenario: u8,
    pub cost_factor: i64,
    pub cost_index: u8,
    pub min_num_buildings: u8,
    pub max_num_buildings: u8,
    /// Height of every building part, in height units.
    pub building_part_heights: Vec<u8>,
    pub building_types: Vec<BuildingType>,
    /// Building type placed at each building slot, in placement order.
    pub buildings: Vec<u8>,
    #[serde(default)]
    pub produced_cargo: Vec<CargoId>,
    #[serde(default)]
    pub required_cargo: Vec<CargoId>,
    #[serde(default)]
    pub initial_production_rate: [ProductionRange; MAX_PRODUCED_CARGO],
    /// Bit `n` set means colour `n` may be picked.
    #[serde(default)]
    pub available_colours: u32,
    /// Monthly closure chance out of 65536.
    #[serde(default)]
    pub monthly_closure_chance: u16,
    #[serde(default)]
    pub farm_num_fields: u8,
    #[serde(default)]
    pub farm_num_growth_stages: u8,
    /// Growth stage of farm tiles that yields nothing, if the type has one.
    #[serde(default)]
    pub farm_growth_stage_no_production: Option<u8>,
    /// Field walls: plain, entrance, alternate plain, alternate entrance.
    #[serde(default)]
    pub wall_types: [Option<u8>; 4],
    #[serde(default)]
    pub building_wall: Option<u8>,
    #[serde(default)]
    pub building_wall_entrance: Option<u8>,
}

impl IndustryObject {
    pub fn has_flags(&self, flags: IndustryObjectFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn produced(&self, slot: usize) -> Option<CargoId> {
        self.produced_cargo.get(slot).copied()
    }

    pub fn required(&self, slot: usize) -> Option<CargoId> {
        self.required_cargo.get(slot).copied()
    }

    pub fn produces(&self, cargo: CargoId) -> bool {
        self.produced_cargo.contains(&cargo)
    }

    /// Produced cargo as a bitset over cargo ids.
    pub fn produced_mask(&self) -> u32 {
        cargo_mask(&self.produced_cargo)
    }

    /// Required cargo as a bitset over cargo ids.
    pub fn required_mask(&self) -> u32 {
        cargo_mask(&self.required_cargo)
    }

    /// Whether the type can be founded in `year`.
    pub fn is_available(&self, year: i32) -> bool {
        self.designed_year <= year && year < self.obsolete_year
    }

    pub fn is_large(&self, building_type: u8) -> bool {
        self.building_types
            .get(usize::from(building_type))
            .map_or(false, |b| b.large)
    }

    pub fn building_parts(&self, building_type: u8) -> &[u8] {
        self.building_types
            .get(usize::from(building_type))
            .map_or(&[], |b| b.parts.as_slice())
    }

    /// Summed height of every part of `building_type`.
    pub fn building_height(&self, building_type: u8) -> i32 {
        self.building_parts(building_type)
            .iter()
            .map(|&p| {
                self.building_part_heights
                    .get(usize::from(p))
                    .copied()
                    .map_or(0, i32::from)
            })
            .sum()
    }

    /// Colour indices this type may be painted in, lowest first.
    pub fn colours(&self) -> Vec<u8> {
        (0..32u8)
            .filter(|bit| self.available_colours & (1 << bit) != 0)
            .collect()
    }

    /// Check field ranges and cross references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(format!("{}: {msg}", self.name)));

        if self.max_num_buildings < self.min_num_buildings {
            return invalid(format!(
                "max_num_buildings {} is below min_num_buildings {}",
                self.max_num_buildings, self.min_num_buildings
            ));
        }
        if usize::from(self.max_num_buildings) > self.buildings.len() {
            return invalid(format!(
                "{} buildings listed for up to {} placements",
                self.buildings.len(),
                self.max_num_buildings
            ));
        }
        if !(1..=MAX_TOTAL_OF_TYPE).contains(&self.total_of_type_in_scenario) {
            return Err(ConfigError::OutOfRange {
                field: "total_of_type_in_scenario",
                value: i64::from(self.total_of_type_in_scenario),
                range: "1..=32",
            });
        }
        if self.produced_cargo.len() > MAX_PRODUCED_CARGO {
            return invalid(format!("{} produced cargo types", self.produced_cargo.len()));
        }
        if self.required_cargo.len() > MAX_REQUIRED_CARGO {
            return invalid(format!("{} required cargo types", self.required_cargo.len()));
        }
        for rate in &self.initial_production_rate {
            if rate.min > 100 || rate.max < rate.min {
                return invalid(format!("production range {}..={}", rate.min, rate.max));
            }
        }
        for (idx, building) in self.building_types.iter().enumerate() {
            if building.parts.is_empty() {
                return invalid(format!("building type {idx} has no parts"));
            }
            if let Some(part) = building
                .parts
                .iter()
                .find(|&&p| usize::from(p) >= self.building_part_heights.len())
            {
                return invalid(format!("building type {idx} uses unknown part {part}"));
            }
        }
        if let Some(t) = self
            .buildings
            .iter()
            .find(|&&t| usize::from(t) >= self.building_types.len())
        {
            return invalid(format!("unknown building type {t}"));
        }
        if let Some(stage) = self.farm_growth_stage_no_production {
            if self.farm_num_growth_stages != 0 && stage >= self.farm_num_growth_stages {
                return invalid(format!("idle growth stage {stage} is past the last stage"));
            }
        }
        Ok(())
    }
}

fn cargo_mask(cargo: &[CargoId]) -> u32 {
    cargo
        .iter()
        .filter(|c| c.index() < 32)
        .fold(0, |mask, c| mask | (1 << c.0))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn fixtures_validate() {
        coal_mine().validate().unwrap();
        farm().validate().unwrap();
        factory().validate().unwrap();
    }

    #[test]
    fn derived_values() {
        let obj = coal_mine();
        assert_eq!(obj.building_height(0), 24);
        assert_eq!(obj.building_height(1), 16);
        assert!(obj.is_large(1));
        assert!(!obj.is_large(7));
        assert_eq!(obj.colours(), vec![1, 3]);
        assert_eq!(obj.produced_mask(), 0b1);
        assert_eq!(factory().required_mask(), 0b11);
        assert!(obj.is_available(1800));
        assert!(!obj.is_available(2100));
    }

    #[test]
    fn validation_rejects_bad_objects() {
        let obj = IndustryObject {
            total_of_type_in_scenario: 0,
            ..coal_mine()
        };
        assert!(matches!(obj.validate(), Err(ConfigError::OutOfRange { .. })));

        let obj = IndustryObject {
            min_num_buildings: 5,
            ..coal_mine()
        };
        assert!(obj.validate().is_err());

        let mut obj = coal_mine();
        obj.building_types[0].parts.clear();
        assert!(matches!(obj.validate(), Err(ConfigError::Invalid(_))));

        let mut obj = coal_mine();
        obj.initial_production_rate[0] = ProductionRange { min: 101, max: 120 };
        assert!(obj.validate().is_err());
    }

    #[test]
    fn every_building_slot_needs_a_listed_building() {
        let mut obj = coal_mine();
        obj.buildings.truncate(3);
        match obj.validate() {
            Err(ConfigError::Invalid(msg)) => {
                assert!(msg.contains("3 buildings listed for up to 4"), "{msg}")
            }
            other => panic!("expected a rejection, got {other:?}"),
        }

        // A shorter list is fine once the cap fits inside it.
        obj.max_num_buildings = 3;
        obj.validate().unwrap();
    }

    #[test]
    fn parses_flags_from_yaml() {
        let yaml = r#"
name: Sawmill
flags: BUILT_NEAR_TREES | CAN_INCREASE_PRODUCTION
designed_year: 1850
obsolete_year: 2100
total_of_type_in_scenario: 6
cost_factor: 300
cost_index: 4
min_num_buildings: 1
max_num_buildings: 2
building_part_heights: [8]
building_types:
  - parts: [0]
buildings: [0, 0]
produced_cargo: [3]
"#;
        let obj: IndustryObject = serde_yaml::from_str(yaml).unwrap();
        assert!(obj.has_flags(IndustryObjectFlags::BUILT_NEAR_TREES));
        assert!(!obj.has_flags(IndustryObjectFlags::BUILT_IN_CLUSTERS));
        assert_eq!(obj.produced(0), Some(CargoId(3)));
        assert_eq!(obj.required(0), None);
        obj.validate().unwrap();
    }
}
