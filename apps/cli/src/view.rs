//! Plain-text rendering of the ledger.

use baker_core::GameState;
use std::fmt::Write;

/// Status block: money, debt, supplies (rounded up) and equipment hours.
pub fn render_status(state: &GameState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Money: {:.2}", state.money);
    let _ = writeln!(out, "Debt: {:.2}", state.debt);
    let _ = writeln!(out, "Supplies");
    for item in &state.supplies {
        let _ = writeln!(out, "  {}: {} {}", item.name, item.quantity.ceil(), item.unit);
    }
    let _ = writeln!(out, "Equipment");
    for item in &state.equipment {
        let _ = writeln!(out, "  {}: {} hours used", item.name, item.hours_used);
    }
    out
}
