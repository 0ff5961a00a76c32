#![deny(warnings)]

//! Core ledger models and invariants for Baker.
//!
//! This crate defines the serializable game state (money, debt, day counter,
//! supplies and equipment), name-based ledger operations, and validation
//! helpers that guard the basic invariants of a session.

mod config;

pub use config::{ConfigError, GameConfig};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Supply name for flour.
pub const FLOUR: &str = "flour";
/// Supply name for salt.
pub const SALT: &str = "salt";
/// Supply name for yeast.
pub const YEAST: &str = "yeast";
/// Supply name for paper bags (one per loaf sold).
pub const PAPER_BAGS: &str = "paper bags";

/// Baking ingredients, in the order shortages are reported.
pub const INGREDIENTS: [&str; 3] = [FLOUR, SALT, YEAST];

/// Supplies every ledger must carry for the day simulation to run.
pub const REQUIRED_SUPPLIES: [&str; 4] = [FLOUR, SALT, YEAST, PAPER_BAGS];

/// A consumable supply held in the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplyItem {
    /// Identifier, e.g. "flour".
    pub name: String,
    /// Display unit, e.g. "bags".
    pub unit: String,
    /// Quantity on hand (>= 0, may be fractional).
    pub quantity: Decimal,
    /// Unit price.
    pub cost: Decimal,
}

/// A piece of equipment and its cumulative usage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentItem {
    /// Identifier, e.g. "oven".
    pub name: String,
    /// Number of units owned.
    pub quantity: u32,
    /// Cumulative hours of use.
    #[serde(default)]
    pub hours_used: u64,
}

/// The ledger for a single session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Cash on hand.
    pub money: Decimal,
    /// Outstanding debt (>= 0).
    #[serde(default)]
    pub debt: Decimal,
    /// Current day, starting at 1.
    pub day: u32,
    /// Supplies in catalog order.
    pub supplies: Vec<SupplyItem>,
    /// Equipment in catalog order.
    pub equipment: Vec<EquipmentItem>,
}

/// Errors raised by ledger operations.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    /// A supply or equipment name is absent from the ledger.
    #[error("no ledger record named {0:?}")]
    MissingRecord(String),
    /// A debit would exceed the money on hand.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },
    /// A quantity change would leave a supply below zero.
    #[error("quantity of {name:?} would become negative")]
    NegativeQuantity { name: String },
    /// Monetary amounts passed to credit/debit must be non-negative.
    #[error("invalid monetary amount {0}")]
    InvalidAmount(Decimal),
    /// The result exceeds the representable decimal range.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Validation errors for ledger and configuration invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Day counter must start at 1.
    #[error("day must be >= 1, got {0}")]
    DayOutOfRange(u32),
    /// Money, debt and costs must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Supply quantities must be non-negative.
    #[error("negative quantity for {0:?}")]
    NegativeQuantity(String),
    /// Record names must be non-blank.
    #[error("record name must not be empty")]
    EmptyName,
    /// Record names must be unique within their list.
    #[error("duplicate record name: {0}")]
    DuplicateName(String),
    /// A required supply is not present.
    #[error("required supply not found: {0}")]
    MissingSupply(String),
}

impl GameState {
    /// Fresh ledger seeded from static configuration.
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            money: config.initial_money,
            debt: Decimal::ZERO,
            day: 1,
            supplies: config.supplies.clone(),
            equipment: config.equipment.clone(),
        }
    }

    /// Look up a supply by name.
    pub fn supply(&self, name: &str) -> Result<&SupplyItem, LedgerError> {
        self.supplies
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| LedgerError::MissingRecord(name.to_string()))
    }

    /// Look up a supply by name for mutation.
    pub fn supply_mut(&mut self, name: &str) -> Result<&mut SupplyItem, LedgerError> {
        self.supplies
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| LedgerError::MissingRecord(name.to_string()))
    }

    /// Quantity on hand of a supply.
    pub fn supply_quantity(&self, name: &str) -> Result<Decimal, LedgerError> {
        self.supply(name).map(|s| s.quantity)
    }

    /// Look up an equipment record by name.
    pub fn equipment(&self, name: &str) -> Result<&EquipmentItem, LedgerError> {
        self.equipment
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| LedgerError::MissingRecord(name.to_string()))
    }

    /// Apply a quantity delta to a supply and return the new quantity.
    ///
    /// The change is rejected, leaving the ledger untouched, if it would make
    /// the quantity negative.
    pub fn adjust_supply(&mut self, name: &str, delta: Decimal) -> Result<Decimal, LedgerError> {
        let supply = self.supply_mut(name)?;
        let next = supply
            .quantity
            .checked_add(delta)
            .ok_or(LedgerError::Overflow)?;
        if next < Decimal::ZERO {
            return Err(LedgerError::NegativeQuantity {
                name: name.to_string(),
            });
        }
        supply.quantity = next;
        Ok(next)
    }

    /// Add money to the balance.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.money = self
            .money
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Remove money from the balance; never drives the balance negative.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if amount > self.money {
            return Err(LedgerError::InsufficientFunds {
                needed: amount,
                available: self.money,
            });
        }
        self.money -= amount;
        Ok(())
    }

    /// Add usage hours to every equipment item.
    pub fn log_equipment_hours(&mut self, hours: u64) {
        for e in &mut self.equipment {
            e.hours_used = e.hours_used.saturating_add(hours);
        }
    }
}

fn validate_supplies(supplies: &[SupplyItem]) -> Result<(), ValidationError> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for s in supplies {
        if s.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !names.insert(&s.name) {
            return Err(ValidationError::DuplicateName(s.name.clone()));
        }
        if s.quantity < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity(s.name.clone()));
        }
        if s.cost < Decimal::ZERO {
            return Err(ValidationError::NegativeMoney);
        }
    }
    for required in REQUIRED_SUPPLIES {
        if !names.contains(required) {
            return Err(ValidationError::MissingSupply(required.to_string()));
        }
    }
    Ok(())
}

fn validate_equipment(equipment: &[EquipmentItem]) -> Result<(), ValidationError> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for e in equipment {
        if e.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !names.insert(&e.name) {
            return Err(ValidationError::DuplicateName(e.name.clone()));
        }
    }
    Ok(())
}

/// Validate a ledger, e.g. one restored from a snapshot.
pub fn validate_state(state: &GameState) -> Result<(), ValidationError> {
    if state.day == 0 {
        return Err(ValidationError::DayOutOfRange(state.day));
    }
    if state.money < Decimal::ZERO || state.debt < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    validate_supplies(&state.supplies)?;
    validate_equipment(&state.equipment)
}

/// Validate static configuration before it seeds a ledger.
pub fn validate_config(config: &GameConfig) -> Result<(), ValidationError> {
    if config.initial_money < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    validate_supplies(&config.supplies)?;
    validate_equipment(&config.equipment)
}
