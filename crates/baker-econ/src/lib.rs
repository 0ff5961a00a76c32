#![deny(warnings)]

//! Day simulation for Baker: customer demand, bounded production and sales.
//!
//! One simulated day draws a customer count, bakes as many loaves as the
//! scarcest ingredient and the paper bag stock allow, sells up to the
//! customer count, and records consumption and revenue in the ledger.

use baker_core::{GameState, LedgerError, FLOUR, INGREDIENTS, PAPER_BAGS, SALT, YEAST};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use tracing::debug;

/// Source of the daily customer count.
///
/// Implementations return an integer uniformly drawn from `low..=high`.
pub trait CustomerSource {
    fn draw(&mut self, low: u32, high: u32) -> u32;
}

/// Seeded, reproducible customer draws.
#[derive(Clone, Debug)]
pub struct SeededCustomers {
    rng: ChaCha8Rng,
}

impl SeededCustomers {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Unseeded source for interactive play.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl CustomerSource for SeededCustomers {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }
}

/// Replays a fixed sequence of customer counts, cycling when exhausted.
///
/// Values are clamped into the requested range; an empty script always
/// yields the lower bound.
#[derive(Clone, Debug, Default)]
pub struct ScriptedCustomers {
    script: Vec<u32>,
    next: usize,
}

impl ScriptedCustomers {
    pub fn new(script: Vec<u32>) -> Self {
        Self { script, next: 0 }
    }

    /// The same count every day.
    pub fn constant(customers: u32) -> Self {
        Self::new(vec![customers])
    }
}

impl CustomerSource for ScriptedCustomers {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        if self.script.is_empty() {
            return low;
        }
        let v = self.script[self.next % self.script.len()];
        self.next = self.next.wrapping_add(1);
        v.clamp(low, high)
    }
}

/// Fixed parameters of the bakery day.
#[derive(Clone, Debug, PartialEq)]
pub struct BakeryRules {
    /// Fewest customers in a day (inclusive).
    pub customers_min: u32,
    /// Most customers in a day (inclusive).
    pub customers_max: u32,
    /// Loaves per unit of each ingredient (0.1 unit per loaf => 10).
    pub loaves_per_unit: u32,
    /// Sale price of one loaf.
    pub loaf_price: Decimal,
    /// Equipment hours logged per baking shift.
    pub shift_hours: u64,
}

impl Default for BakeryRules {
    fn default() -> Self {
        Self {
            customers_min: 10,
            customers_max: 30,
            loaves_per_unit: 10,
            loaf_price: Decimal::new(5, 0),
            shift_hours: 8,
        }
    }
}

/// Why a day ended with no sales.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shortage {
    /// Ingredients ran out; lists each depleted one among flour, salt, yeast.
    Ingredients(Vec<&'static str>),
    /// No paper bags left to pack a loaf.
    PaperBags,
    /// Ingredients remain but not enough for a whole loaf.
    PartialLoaf,
}

/// Outcome of one simulated day.
#[derive(Clone, Debug, PartialEq)]
pub struct DayReport {
    /// Day number the report refers to.
    pub day: u32,
    pub customers: u32,
    pub loaves_sold: u32,
    pub revenue: Decimal,
    /// Set when nothing was sold.
    pub shortage: Option<Shortage>,
}

impl fmt::Display for DayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}: {} customers. ", self.day, self.customers)?;
        if self.loaves_sold > 0 {
            return write!(
                f,
                "Sold {} loaves for {:.2}.",
                self.loaves_sold, self.revenue
            );
        }
        write!(f, "Sold 0 loaves.")?;
        match &self.shortage {
            Some(Shortage::Ingredients(missing)) => write!(
                f,
                " Not enough supplies to bake bread. Missing: {}",
                missing.join(", ")
            ),
            Some(Shortage::PaperBags) => write!(f, " Missing: {PAPER_BAGS}"),
            Some(Shortage::PartialLoaf) => write!(f, " Not enough supplies for a whole loaf."),
            None => Ok(()),
        }
    }
}

/// Whole units available from a quantity, floored and saturating.
fn whole_units(quantity: Decimal) -> u32 {
    if quantity <= Decimal::ZERO {
        return 0;
    }
    quantity.floor().to_u32().unwrap_or(u32::MAX)
}

/// Maximum loaves the scarcest ingredient allows.
///
/// Returns 0 when any ingredient is depleted.
pub fn max_loaves(state: &GameState, rules: &BakeryRules) -> Result<u32, LedgerError> {
    let scarcest = state
        .supply_quantity(FLOUR)?
        .min(state.supply_quantity(SALT)?)
        .min(state.supply_quantity(YEAST)?);
    Ok(scarcest
        .checked_mul(Decimal::from(rules.loaves_per_unit))
        .map_or(u32::MAX, whole_units))
}

/// Simulate one day with the default rules.
pub fn simulate_day<C: CustomerSource + ?Sized>(
    state: &mut GameState,
    customers: &mut C,
) -> Result<DayReport, LedgerError> {
    simulate_day_with(state, customers, &BakeryRules::default())
}

/// Simulate one day and advance the day counter.
///
/// Ledger lookups and the revenue credit happen before any consumption, so a
/// `MissingRecord` or `Overflow` error leaves the state untouched.
pub fn simulate_day_with<C: CustomerSource + ?Sized>(
    state: &mut GameState,
    customers: &mut C,
    rules: &BakeryRules,
) -> Result<DayReport, LedgerError> {
    let day = state.day;
    let demand = customers.draw(rules.customers_min, rules.customers_max);

    let mut depleted = Vec::new();
    for name in INGREDIENTS {
        if state.supply_quantity(name)? <= Decimal::ZERO {
            depleted.push(name);
        }
    }
    let bags = whole_units(state.supply_quantity(PAPER_BAGS)?);

    let mut report = DayReport {
        day,
        customers: demand,
        loaves_sold: 0,
        revenue: Decimal::ZERO,
        shortage: None,
    };

    if !depleted.is_empty() {
        report.shortage = Some(Shortage::Ingredients(depleted));
    } else {
        let capacity = max_loaves(state, rules)?;
        let sold = capacity.min(demand).min(bags);
        if sold > 0 {
            let revenue = Decimal::from(sold)
                .checked_mul(rules.loaf_price)
                .ok_or(LedgerError::Overflow)?;
            state.credit(revenue)?;
            let used = Decimal::from(sold) / Decimal::from(rules.loaves_per_unit);
            for name in INGREDIENTS {
                state.adjust_supply(name, -used)?;
            }
            state.adjust_supply(PAPER_BAGS, -Decimal::from(sold))?;
            state.log_equipment_hours(rules.shift_hours);
            report.loaves_sold = sold;
            report.revenue = revenue;
        } else if demand == 0 {
            // Nobody came; nothing was short.
        } else if bags == 0 {
            report.shortage = Some(Shortage::PaperBags);
        } else if capacity == 0 {
            report.shortage = Some(Shortage::PartialLoaf);
        }
    }

    state.day = state.day.saturating_add(1);
    debug!(
        day,
        customers = demand,
        loaves_sold = report.loaves_sold,
        revenue = %report.revenue,
        "simulated day"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use baker_core::GameConfig;
    use proptest::prelude::*;

    fn state_with(flour: Decimal, salt: Decimal, yeast: Decimal, bags: Decimal) -> GameState {
        let mut s = GameState::from_config(&GameConfig::default());
        s.supply_mut(FLOUR).unwrap().quantity = flour;
        s.supply_mut(SALT).unwrap().quantity = salt;
        s.supply_mut(YEAST).unwrap().quantity = yeast;
        s.supply_mut(PAPER_BAGS).unwrap().quantity = bags;
        s
    }

    fn d(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn sells_up_to_customer_count() {
        let mut s = state_with(d(5), d(5), d(5), d(50));
        let money = s.money;
        let report = simulate_day(&mut s, &mut ScriptedCustomers::constant(12)).unwrap();
        assert_eq!(report.loaves_sold, 12);
        assert_eq!(report.revenue, d(60));
        assert_eq!(report.shortage, None);
        for name in INGREDIENTS {
            assert_eq!(s.supply_quantity(name).unwrap(), Decimal::new(38, 1));
        }
        assert_eq!(s.supply_quantity(PAPER_BAGS).unwrap(), d(38));
        assert_eq!(s.money, money + d(60));
        assert!(s.equipment.iter().all(|e| e.hours_used == 8));
        assert_eq!(s.day, 2);
        assert_eq!(
            report.to_string(),
            "Day 1: 12 customers. Sold 12 loaves for 60.00."
        );
    }

    #[test]
    fn scarce_ingredient_bounds_production() {
        let mut s = state_with(Decimal::new(7, 1), d(5), d(5), d(50));
        let report = simulate_day(&mut s, &mut ScriptedCustomers::constant(20)).unwrap();
        assert_eq!(report.loaves_sold, 7);
        assert_eq!(s.supply_quantity(FLOUR).unwrap(), Decimal::ZERO);
        assert_eq!(s.supply_quantity(SALT).unwrap(), Decimal::new(43, 1));
    }

    #[test]
    fn paper_bags_bound_production() {
        let mut s = state_with(d(5), d(5), d(5), Decimal::new(35, 1));
        let report = simulate_day(&mut s, &mut ScriptedCustomers::constant(20)).unwrap();
        assert_eq!(report.loaves_sold, 3);
        assert_eq!(s.supply_quantity(PAPER_BAGS).unwrap(), Decimal::new(5, 1));
    }

    #[test]
    fn depleted_ingredient_is_reported() {
        let mut s = state_with(Decimal::ZERO, d(5), Decimal::ZERO, d(50));
        let before = s.clone();
        let report = simulate_day(&mut s, &mut ScriptedCustomers::constant(15)).unwrap();
        assert_eq!(report.loaves_sold, 0);
        assert_eq!(
            report.shortage,
            Some(Shortage::Ingredients(vec![FLOUR, YEAST]))
        );
        assert_eq!(
            report.to_string(),
            "Day 1: 15 customers. Sold 0 loaves. Not enough supplies to bake bread. Missing: flour, yeast"
        );
        assert_eq!(s.supplies, before.supplies);
        assert_eq!(s.equipment, before.equipment);
        assert_eq!(s.money, before.money);
        assert_eq!(s.day, before.day + 1);
    }

    #[test]
    fn exhausted_paper_bags_are_named() {
        let mut s = state_with(d(5), d(5), d(5), Decimal::ZERO);
        let report = simulate_day(&mut s, &mut ScriptedCustomers::constant(15)).unwrap();
        assert_eq!(report.loaves_sold, 0);
        assert_eq!(report.shortage, Some(Shortage::PaperBags));
        assert!(report.to_string().ends_with("Missing: paper bags"));
        assert!(s.equipment.iter().all(|e| e.hours_used == 0));
    }

    #[test]
    fn less_than_one_loaf_of_ingredients() {
        let mut s = state_with(Decimal::new(5, 2), d(5), d(5), d(50));
        let report = simulate_day(&mut s, &mut ScriptedCustomers::constant(15)).unwrap();
        assert_eq!(report.loaves_sold, 0);
        assert_eq!(report.shortage, Some(Shortage::PartialLoaf));
        assert_eq!(s.supply_quantity(FLOUR).unwrap(), Decimal::new(5, 2));
    }

    #[test]
    fn zero_customer_day_reports_no_shortage() {
        let rules = BakeryRules {
            customers_min: 0,
            ..BakeryRules::default()
        };
        let mut s = state_with(d(5), d(5), d(5), d(50));
        let report =
            simulate_day_with(&mut s, &mut ScriptedCustomers::constant(0), &rules).unwrap();
        assert_eq!(report.loaves_sold, 0);
        assert_eq!(report.shortage, None);
        assert_eq!(report.to_string(), "Day 1: 0 customers. Sold 0 loaves.");
        assert_eq!(s.day, 2);
    }

    #[test]
    fn revenue_overflow_leaves_supplies_untouched() {
        let mut s = state_with(d(5), d(5), d(5), d(50));
        s.money = Decimal::MAX;
        let before = s.clone();
        let err = simulate_day(&mut s, &mut ScriptedCustomers::constant(12)).unwrap_err();
        assert_eq!(err, LedgerError::Overflow);
        assert_eq!(s, before);
    }

    #[test]
    fn missing_record_leaves_state_untouched() {
        let mut s = GameState::from_config(&GameConfig::default());
        s.supplies.retain(|x| x.name != PAPER_BAGS);
        let before = s.clone();
        let err = simulate_day(&mut s, &mut ScriptedCustomers::constant(15)).unwrap_err();
        assert_eq!(err, LedgerError::MissingRecord(PAPER_BAGS.to_string()));
        assert_eq!(s, before);
    }

    #[test]
    fn scripted_customers_cycle_and_clamp() {
        let mut src = ScriptedCustomers::new(vec![5, 12, 99]);
        assert_eq!(src.draw(10, 30), 10);
        assert_eq!(src.draw(10, 30), 12);
        assert_eq!(src.draw(10, 30), 30);
        assert_eq!(src.draw(10, 30), 10);
        assert_eq!(ScriptedCustomers::default().draw(10, 30), 10);
    }

    #[test]
    fn seeded_customers_are_reproducible_and_in_range() {
        let mut a = SeededCustomers::new(42);
        let mut b = SeededCustomers::new(42);
        for _ in 0..200 {
            let x = a.draw(10, 30);
            assert_eq!(x, b.draw(10, 30));
            assert!((10..=30).contains(&x));
        }
    }

    proptest! {
        #[test]
        fn quantities_never_negative(flour in 0i64..2_000, salt in 0i64..2_000, yeast in 0i64..2_000,
                                     bags in 0i64..500, customers in 10u32..=30) {
            let mut s = state_with(
                Decimal::new(flour, 2),
                Decimal::new(salt, 2),
                Decimal::new(yeast, 2),
                Decimal::new(bags, 1),
            );
            let money = s.money;
            let report = simulate_day(&mut s, &mut ScriptedCustomers::constant(customers)).unwrap();
            prop_assert!(s.supplies.iter().all(|x| x.quantity >= Decimal::ZERO));
            prop_assert!(report.loaves_sold <= customers);
            prop_assert_eq!(s.money, money + Decimal::from(report.loaves_sold) * Decimal::new(5, 0));
            prop_assert_eq!(s.day, 2);
        }
    }
}
