//! Static configuration used to seed a fresh ledger.

use crate::{validate_config, EquipmentItem, SupplyItem, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Starting money and the supply/equipment catalogs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Money on hand at the start of a new game.
    pub initial_money: Decimal,
    /// Supply catalog with starting quantities and unit prices.
    pub supplies: Vec<SupplyItem>,
    /// Equipment catalog with starting counts.
    pub equipment: Vec<EquipmentItem>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid config: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

fn supply(name: &str, unit: &str, quantity: i64, cost: Decimal) -> SupplyItem {
    SupplyItem {
        name: name.to_string(),
        unit: unit.to_string(),
        quantity: Decimal::new(quantity, 0),
        cost,
    }
}

fn equipment(name: &str, quantity: u32) -> EquipmentItem {
    EquipmentItem {
        name: name.to_string(),
        quantity,
        hours_used: 0,
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_money: Decimal::new(10_000, 0),
            supplies: vec![
                supply(crate::FLOUR, "bags", 10, Decimal::new(10, 0)),
                supply(crate::SALT, "bags", 10, Decimal::new(5, 0)),
                supply(crate::YEAST, "packets", 20, Decimal::new(1, 0)),
                supply(crate::PAPER_BAGS, "bags", 100, Decimal::new(1, 1)),
            ],
            equipment: vec![equipment("oven", 1), equipment("mixer", 1)],
        }
    }
}

impl GameConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        info!(
            path = %path.as_ref().display(),
            supplies = config.supplies.len(),
            equipment = config.equipment.len(),
            "loaded game config"
        );
        Ok(config)
    }
}
