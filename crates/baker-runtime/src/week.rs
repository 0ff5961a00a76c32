//! Week driver: weekly debt service followed by seven sequential days.

use baker_core::{GameState, LedgerError};
use baker_econ::{simulate_day_with, BakeryRules, CustomerSource, DayReport};
use rust_decimal::Decimal;

/// Simulated days per week.
pub const DAYS_PER_WEEK: u32 = 7;

/// Fraction of outstanding debt due each week (2%).
pub fn weekly_payment_rate() -> Decimal {
    Decimal::new(2, 2)
}

/// Result of the weekly debt payment.
#[derive(Clone, Debug, PartialEq)]
pub enum DebtService {
    /// No outstanding debt.
    NoDebt,
    /// Payment deducted from money and debt.
    Paid(Decimal),
    /// Money did not cover the payment; nothing was deducted.
    Missed { due: Decimal },
}

impl DebtService {
    pub fn message(&self) -> Option<String> {
        match self {
            DebtService::NoDebt => None,
            DebtService::Paid(amount) => Some(format!("Paid {amount:.2} towards your loan.")),
            DebtService::Missed { .. } => {
                Some("You don't have enough money to make your loan payment.".to_string())
            }
        }
    }
}

/// Outcome of one simulated week.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekReport {
    pub debt_service: DebtService,
    pub days: Vec<DayReport>,
}

impl WeekReport {
    pub fn loaves_sold(&self) -> u64 {
        self.days.iter().map(|d| u64::from(d.loaves_sold)).sum()
    }

    pub fn revenue(&self) -> Decimal {
        self.days.iter().map(|d| d.revenue).sum()
    }
}

/// Hooks invoked while a week runs, in order.
pub trait WeekObserver {
    fn debt_serviced(&mut self, _state: &GameState, _outcome: &DebtService) {}
    fn day_closed(&mut self, _state: &GameState, _report: &DayReport) {}
}

impl WeekObserver for () {}

/// Apply the weekly debt payment if money covers it.
pub fn service_debt(state: &mut GameState) -> DebtService {
    if state.debt <= Decimal::ZERO {
        return DebtService::NoDebt;
    }
    let payment = state.debt * weekly_payment_rate();
    if state.debit(payment).is_err() {
        return DebtService::Missed { due: payment };
    }
    state.debt -= payment;
    DebtService::Paid(payment)
}

/// Run one week with default rules and no observer.
pub fn simulate_week<C: CustomerSource + ?Sized>(
    state: &mut GameState,
    customers: &mut C,
) -> Result<WeekReport, LedgerError> {
    simulate_week_with(state, customers, &BakeryRules::default(), &mut ())
}

/// Service debt, then simulate `DAYS_PER_WEEK` days in sequence; each day
/// starts from the state the previous one left behind.
pub fn simulate_week_with<C, O>(
    state: &mut GameState,
    customers: &mut C,
    rules: &BakeryRules,
    observer: &mut O,
) -> Result<WeekReport, LedgerError>
where
    C: CustomerSource + ?Sized,
    O: WeekObserver + ?Sized,
{
    let debt_service = service_debt(state);
    observer.debt_serviced(state, &debt_service);

    let mut days = Vec::with_capacity(DAYS_PER_WEEK as usize);
    for _ in 0..DAYS_PER_WEEK {
        let report = simulate_day_with(state, customers, rules)?;
        observer.day_closed(state, &report);
        days.push(report);
    }
    Ok(WeekReport { debt_service, days })
}
