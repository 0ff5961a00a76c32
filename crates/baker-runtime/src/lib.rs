#![deny(warnings)]

//! Session runtime for Baker: decision handling, purchases, loans and the
//! weekly simulation loop over an explicitly owned game state.
//!
//! A [`Session`] owns the ledger, the append-only message log, the customer
//! source and the snapshot store. Every state-mutating operation persists the
//! ledger afterwards; persistence failures are logged and do not interrupt
//! play.

mod orders;
mod week;

pub use orders::{
    loan_allowed, loan_interest_factor, loan_outcome, max_loan, parse_amount, parse_quantity,
    PurchaseOrder,
};
pub use week::{
    service_debt, simulate_week, simulate_week_with, weekly_payment_rate, DebtService,
    WeekObserver, WeekReport, DAYS_PER_WEEK,
};

use baker_core::{
    validate_config, validate_state, GameConfig, GameState, LedgerError, ValidationError,
};
use baker_econ::{BakeryRules, CustomerSource, DayReport};
use persistence::SnapshotStore;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by session operations. User-facing variants are also
/// recorded in the message log.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// A purchase costs more than the money on hand.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },
    /// Loan amount outside `0 < amount <= 2 × money`.
    #[error("invalid loan amount {0}")]
    InvalidLoanRequest(Decimal),
    /// A supply or equipment name is absent from the ledger.
    #[error("no ledger record named {0:?}")]
    MissingRecord(String),
    /// Static configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
    /// Any other ledger invariant violation.
    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for SessionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::MissingRecord(name) => SessionError::MissingRecord(name),
            LedgerError::InsufficientFunds { needed, available } => {
                SessionError::InsufficientFunds { needed, available }
            }
            other => SessionError::Ledger(other),
        }
    }
}

/// Append-only log of plain-text messages for the presentation layer.
#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        let text = message.into();
        if text.trim().is_empty() {
            return;
        }
        self.entries.push(text);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Messages appended at or after `cursor`.
    pub fn since(&self, cursor: usize) -> &[String] {
        self.entries.get(cursor..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A player's choice at the decision phase.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    /// Buy supplies, then simulate a week.
    Purchase(PurchaseOrder),
    /// Borrow money, then simulate a week.
    Loan(Decimal),
    /// Simulate a week without acting.
    Nothing,
}

fn persist<S: SnapshotStore + ?Sized>(store: &mut S, state: &GameState) {
    if let Err(e) = store.save(state) {
        warn!(error = %e, "failed to save game state");
    }
}

/// Writes each week event to the message log and persists after every day.
struct Recorder<'a, S: ?Sized> {
    log: &'a mut MessageLog,
    store: &'a mut S,
}

impl<S: SnapshotStore + ?Sized> WeekObserver for Recorder<'_, S> {
    fn debt_serviced(&mut self, _state: &GameState, outcome: &DebtService) {
        if let DebtService::Missed { due } = outcome {
            warn!(%due, "missed loan payment");
        }
        if let Some(msg) = outcome.message() {
            self.log.push(msg);
        }
    }

    fn day_closed(&mut self, state: &GameState, report: &DayReport) {
        self.log.push(report.to_string());
        persist(&mut *self.store, state);
    }
}

/// One player's running game.
pub struct Session<C, S> {
    state: GameState,
    log: MessageLog,
    customers: C,
    store: S,
    rules: BakeryRules,
}

impl<C: CustomerSource, S: SnapshotStore> Session<C, S> {
    /// Restore the saved game from `store`, or start fresh from `config`.
    ///
    /// A snapshot that cannot be decoded or fails validation is replaced by a
    /// fresh game.
    pub fn open(config: &GameConfig, mut store: S, customers: C) -> Result<Self, SessionError> {
        validate_config(config)?;
        let fresh = GameState::from_config(config);
        let mut log = MessageLog::default();
        let state = match store.load(&fresh) {
            Ok(Some(saved)) => match validate_state(&saved) {
                Ok(()) => {
                    info!(day = saved.day, money = %saved.money, "restored saved game");
                    saved
                }
                Err(e) => {
                    warn!(error = %e, "saved game failed validation; starting fresh");
                    log.push("Saved game could not be restored; starting a new bakery.");
                    fresh
                }
            },
            Ok(None) => {
                info!("no saved game; starting fresh");
                fresh
            }
            Err(e) => {
                warn!(error = %e, "saved game unreadable; starting fresh");
                log.push("Saved game could not be restored; starting a new bakery.");
                fresh
            }
        };
        persist(&mut store, &state);
        log.push("Welcome to Baker!");
        Ok(Self {
            state,
            log,
            customers,
            store,
            rules: BakeryRules::default(),
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append a message from the presentation layer (e.g. unavailable options).
    pub fn notify<M: Into<String>>(&mut self, message: M) {
        self.log.push(message);
    }

    /// Current borrowing cap.
    pub fn max_loan(&self) -> Decimal {
        max_loan(&self.state)
    }

    /// Dispatch a decision. Returns the simulated week, or `None` when the
    /// decision was a no-op.
    pub fn decide(&mut self, decision: Decision) -> Result<Option<WeekReport>, SessionError> {
        match decision {
            Decision::Purchase(order) => self.purchase(&order),
            Decision::Loan(amount) => self.take_loan(amount).map(Some),
            Decision::Nothing => self.run_week().map(Some),
        }
    }

    /// Buy the ordered supplies in one atomic debit, then simulate a week.
    ///
    /// An order without positive quantities changes nothing and simulates
    /// nothing.
    pub fn purchase(&mut self, order: &PurchaseOrder) -> Result<Option<WeekReport>, SessionError> {
        let total = order.total_cost(&self.state)?;
        if order.is_empty() {
            self.log.push("Nothing to purchase.");
            return Ok(None);
        }
        if total > self.state.money {
            warn!(%total, money = %self.state.money, "purchase rejected");
            self.log.push("You don't have enough money for this purchase.");
            return Err(SessionError::InsufficientFunds {
                needed: total,
                available: self.state.money,
            });
        }
        let mut next = self.state.clone();
        next.debit(total)?;
        for (name, quantity) in order.lines() {
            next.adjust_supply(name, Decimal::from(quantity))?;
        }
        self.state = next;
        info!(%total, "purchased supplies");
        self.log.push(format!("Purchased supplies for {total:.2}."));
        persist(&mut self.store, &self.state);
        self.run_week().map(Some)
    }

    /// Borrow `amount`, folding 10% interest into the debt, then simulate a week.
    ///
    /// A loan outside the cap, or one that would overflow money or debt, is
    /// rejected without touching the ledger.
    pub fn take_loan(&mut self, amount: Decimal) -> Result<WeekReport, SessionError> {
        let Some((money, debt)) = loan_outcome(&self.state, amount) else {
            warn!(%amount, cap = %self.max_loan(), "loan rejected");
            self.log.push("Invalid loan amount.");
            return Err(SessionError::InvalidLoanRequest(amount));
        };
        self.state.money = money;
        self.state.debt = debt;
        info!(%amount, debt = %self.state.debt, "loan taken");
        self.log.push(format!("You have taken out a loan of {amount:.2}."));
        persist(&mut self.store, &self.state);
        self.run_week()
    }

    /// Simulate a week without acting.
    pub fn skip_week(&mut self) -> Result<WeekReport, SessionError> {
        self.run_week()
    }

    fn run_week(&mut self) -> Result<WeekReport, SessionError> {
        let Self {
            state,
            log,
            customers,
            store,
            rules,
        } = self;
        let mut recorder = Recorder { log, store };
        let report = simulate_week_with(state, customers, rules, &mut recorder)?;
        info!(
            day = state.day,
            loaves_sold = report.loaves_sold(),
            revenue = %report.revenue(),
            money = %state.money,
            debt = %state.debt,
            "week simulated"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baker_core::{FLOUR, PAPER_BAGS, SALT, YEAST};
    use baker_econ::ScriptedCustomers;
    use persistence::MemoryStore;

    type TestSession = Session<ScriptedCustomers, MemoryStore>;

    fn open(customers: u32) -> TestSession {
        Session::open(
            &GameConfig::default(),
            MemoryStore::new(),
            ScriptedCustomers::constant(customers),
        )
        .unwrap()
    }

    fn saved(session: &TestSession) -> GameState {
        let fresh = GameState::from_config(&GameConfig::default());
        session.store().load(&fresh).unwrap().unwrap()
    }

    #[test]
    fn open_starts_fresh_and_saves() {
        let s = open(10);
        assert_eq!(s.state().day, 1);
        assert_eq!(s.log().entries(), ["Welcome to Baker!".to_string()]);
        assert_eq!(&saved(&s), s.state());
    }

    #[test]
    fn open_restores_snapshot_with_missing_debt() {
        let store = MemoryStore::with_snapshot(r#"{"money": 77, "day": 22}"#);
        let s = Session::open(&GameConfig::default(), store, ScriptedCustomers::constant(10)).unwrap();
        assert_eq!(s.state().money, Decimal::new(77, 0));
        assert_eq!(s.state().day, 22);
        assert_eq!(s.state().debt, Decimal::ZERO);
    }

    #[test]
    fn open_replaces_unreadable_snapshot() {
        let store = MemoryStore::with_snapshot("garbage");
        let s = Session::open(&GameConfig::default(), store, ScriptedCustomers::constant(10)).unwrap();
        assert_eq!(s.state().day, 1);
        assert_eq!(s.log().len(), 2);
    }

    #[test]
    fn open_replaces_invalid_snapshot() {
        let mut invalid = GameState::from_config(&GameConfig::default());
        invalid.day = 40;
        invalid.supplies.retain(|x| x.name != PAPER_BAGS);
        let store = MemoryStore::with_snapshot(persistence::snapshot(&invalid).unwrap());
        let s = Session::open(&GameConfig::default(), store, ScriptedCustomers::constant(10)).unwrap();
        assert_eq!(s.state().day, 1);
        assert!(s.state().supply(PAPER_BAGS).is_ok());
        assert_eq!(
            s.log().entries(),
            [
                "Saved game could not be restored; starting a new bakery.".to_string(),
                "Welcome to Baker!".to_string(),
            ]
        );
        assert_eq!(&saved(&s), s.state());
    }

    #[test]
    fn week_runs_seven_days_and_persists() {
        let mut s = open(10);
        let report = s.decide(Decision::Nothing).unwrap().unwrap();
        assert_eq!(report.days.len(), 7);
        assert_eq!(s.state().day, 8);
        assert_eq!(s.state().money, Decimal::new(10_350, 0));
        assert_eq!(&saved(&s), s.state());
        // welcome + 7 day lines
        assert_eq!(s.log().len(), 8);
        assert!(s.log().entries()[1].starts_with("Day 1: 10 customers."));
    }

    #[test]
    fn purchase_debits_once_and_credits_supplies() {
        let mut s = open(10);
        let order = PurchaseOrder::new().with(FLOUR, 3).with(PAPER_BAGS, 20);
        let report = s.purchase(&order).unwrap().unwrap();
        assert_eq!(s.log().entries()[1], "Purchased supplies for 32.00.");
        // 10000 - 32 + 7 days × 10 loaves × 5
        assert_eq!(s.state().money, Decimal::new(10_318, 0));
        assert_eq!(report.loaves_sold(), 70);
        assert_eq!(s.state().supply_quantity(FLOUR).unwrap(), Decimal::new(6, 0));
        assert_eq!(s.state().supply_quantity(PAPER_BAGS).unwrap(), Decimal::new(50, 0));
    }

    #[test]
    fn unaffordable_purchase_changes_nothing() {
        let mut s = open(10);
        let before = s.state().clone();
        let order = PurchaseOrder::new().with(FLOUR, 1_000).with(SALT, 1);
        let err = s.purchase(&order).unwrap_err();
        assert_eq!(
            err,
            SessionError::InsufficientFunds {
                needed: Decimal::new(10_005, 0),
                available: Decimal::new(10_000, 0),
            }
        );
        assert_eq!(s.state(), &before);
        assert_eq!(
            s.log().entries().last().unwrap(),
            "You don't have enough money for this purchase."
        );
    }

    #[test]
    fn empty_purchase_is_a_noop() {
        let mut s = open(10);
        let before = s.state().clone();
        let order = PurchaseOrder::from_inputs([(FLOUR, "0"), (YEAST, "nope")]);
        assert_eq!(s.decide(Decision::Purchase(order)).unwrap(), None);
        assert_eq!(s.state(), &before);
        assert_eq!(s.decide(Decision::Purchase(PurchaseOrder::new())).unwrap(), None);
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn unknown_supply_in_order_is_missing_record() {
        let mut s = open(10);
        let before = s.state().clone();
        let err = s.purchase(&PurchaseOrder::new().with("butter", 1)).unwrap_err();
        assert_eq!(err, SessionError::MissingRecord("butter".to_string()));
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn loan_at_cap_is_accepted() {
        let mut s = open(10);
        s.state.money = Decimal::new(500, 0);
        let report = s.take_loan(Decimal::new(1_000, 0)).unwrap();
        // Interest folded in, then 2% serviced at the start of the week.
        assert_eq!(report.debt_service, DebtService::Paid(Decimal::new(22, 0)));
        assert_eq!(s.state().debt, Decimal::new(1_078, 0));
        assert_eq!(s.state().money, Decimal::new(1_828, 0));
        assert_eq!(s.log().entries()[1], "You have taken out a loan of 1000.00.");
        assert_eq!(s.log().entries()[2], "Paid 22.00 towards your loan.");
    }

    #[test]
    fn loan_over_cap_is_rejected() {
        let mut s = open(10);
        s.state.money = Decimal::new(500, 0);
        let before = s.state().clone();
        let amount = Decimal::new(100_001, 2);
        assert_eq!(
            s.take_loan(amount).unwrap_err(),
            SessionError::InvalidLoanRequest(amount)
        );
        assert_eq!(
            s.decide(Decision::Loan(Decimal::ZERO)).unwrap_err(),
            SessionError::InvalidLoanRequest(Decimal::ZERO)
        );
        assert_eq!(s.state(), &before);
        assert_eq!(s.log().entries().last().unwrap(), "Invalid loan amount.");
    }

    #[test]
    fn repeated_max_loans_never_panic() {
        let mut s = open(10);
        let mut last = Ok(());
        for _ in 0..200 {
            let cap = s.max_loan();
            last = s.take_loan(cap).map(|_| ());
        }
        assert!(matches!(last, Err(SessionError::InvalidLoanRequest(_))));
        assert!(s.state().money > Decimal::ZERO);
        assert!(s.state().debt > Decimal::ZERO);
        assert_eq!(&saved(&s), s.state());
    }

    #[test]
    fn loan_that_would_overflow_changes_nothing() {
        let mut s = open(10);
        s.state.money = Decimal::MAX / Decimal::new(2, 0);
        let before = s.state().clone();
        let cap = s.max_loan();
        assert_eq!(
            s.take_loan(cap).unwrap_err(),
            SessionError::InvalidLoanRequest(cap)
        );
        assert_eq!(s.state(), &before);
        assert_eq!(s.log().entries().last().unwrap(), "Invalid loan amount.");
    }

    #[test]
    fn missed_debt_payment_is_reported() {
        let mut s = open(10);
        s.state.money = Decimal::ONE;
        s.state.debt = Decimal::new(100, 0);
        let report = s.skip_week().unwrap();
        assert_eq!(
            report.debt_service,
            DebtService::Missed {
                due: Decimal::new(2, 0)
            }
        );
        assert_eq!(s.state().debt, Decimal::new(100, 0));
        assert_eq!(
            s.log().entries()[1],
            "You don't have enough money to make your loan payment."
        );
    }

    #[test]
    fn message_log_since_cursor() {
        let mut log = MessageLog::default();
        log.push("a");
        log.push("  ");
        log.push("b");
        assert_eq!(log.since(1), ["b".to_string()]);
        assert!(log.since(5).is_empty());
    }
}
