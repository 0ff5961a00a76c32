//! Player orders and parsing of submitted form values.

use baker_core::{GameState, LedgerError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a submitted quantity; anything non-numeric or non-positive is 0.
/// Fractions are truncated.
pub fn parse_quantity(input: &str) -> u32 {
    let amount = parse_amount(input);
    amount.trunc().to_u32().unwrap_or(u32::MAX)
}

/// Parse a submitted monetary amount; anything non-numeric or non-positive is 0.
pub fn parse_amount(input: &str) -> Decimal {
    match Decimal::from_str(input.trim()) {
        Ok(v) if v > Decimal::ZERO => v,
        _ => Decimal::ZERO,
    }
}

/// Requested quantities per supply name, in submission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PurchaseOrder {
    lines: Vec<(String, u32)>,
}

impl PurchaseOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style line addition.
    pub fn with(mut self, name: impl Into<String>, quantity: u32) -> Self {
        self.set(name, quantity);
        self
    }

    /// Set the requested quantity for a supply, replacing any earlier request.
    pub fn set(&mut self, name: impl Into<String>, quantity: u32) {
        let name = name.into();
        match self.lines.iter_mut().find(|(n, _)| *n == name) {
            Some(line) => line.1 = quantity,
            None => self.lines.push((name, quantity)),
        }
    }

    /// Build an order from raw form values.
    pub fn from_inputs<'a, I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut order = Self::new();
        for (name, raw) in inputs {
            order.set(name, parse_quantity(raw));
        }
        order
    }

    /// Lines with a positive quantity.
    pub fn lines(&self) -> impl Iterator<Item = (&str, u32)> {
        self.lines
            .iter()
            .filter(|(_, q)| *q > 0)
            .map(|(n, q)| (n.as_str(), *q))
    }

    /// True when nothing would be bought.
    pub fn is_empty(&self) -> bool {
        self.lines().next().is_none()
    }

    /// Sum of quantity × unit cost, priced from the ledger.
    pub fn total_cost(&self, state: &GameState) -> Result<Decimal, LedgerError> {
        let mut total = Decimal::ZERO;
        for (name, quantity) in self.lines() {
            total = Decimal::from(quantity)
                .checked_mul(state.supply(name)?.cost)
                .and_then(|line| total.checked_add(line))
                .ok_or(LedgerError::Overflow)?;
        }
        Ok(total)
    }
}

/// Leverage cap: borrowing is limited to twice the money on hand.
///
/// Saturates at `Decimal::MAX`.
pub fn max_loan(state: &GameState) -> Decimal {
    state
        .money
        .checked_mul(Decimal::new(2, 0))
        .unwrap_or(Decimal::MAX)
}

/// Interest folded into the debt when a loan is taken (10%).
pub fn loan_interest_factor() -> Decimal {
    Decimal::new(11, 1)
}

/// Money and debt after borrowing `amount`, or `None` when the loan is
/// outside `(0, max_loan]` or either balance would overflow.
pub fn loan_outcome(state: &GameState, amount: Decimal) -> Option<(Decimal, Decimal)> {
    if amount <= Decimal::ZERO || amount > max_loan(state) {
        return None;
    }
    let money = state.money.checked_add(amount)?;
    let debt = amount
        .checked_mul(loan_interest_factor())
        .and_then(|owed| state.debt.checked_add(owed))?;
    Some((money, debt))
}

/// Whether a loan of `amount` is allowed against the current ledger.
pub fn loan_allowed(state: &GameState, amount: Decimal) -> bool {
    loan_outcome(state, amount).is_some()
}
