#![allow(dead_code)]

use std::sync::Arc;

use loan_ledger_rs::chrono::{NaiveDate, TimeZone, Utc};
use loan_ledger_rs::{
    LedgerConfig, LedgerReconciler, LedgerStore, Money, Rate, SafeTimeProvider, TimeSource,
};

/// route `tracing` output through the test harness; RUST_LOG picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_time() -> SafeTimeProvider {
    SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ))
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

/// reconciler with zero interest so totals equal principals
pub fn flat_reconciler<S: LedgerStore>(store: Arc<S>) -> LedgerReconciler<S> {
    LedgerReconciler::new(store, LedgerConfig::new(Rate::ZERO), test_time()).unwrap()
}

/// check the cross-entity balance invariants for one borrower
pub fn assert_consistent<S: LedgerStore>(reconciler: &LedgerReconciler<S>, borrower_id: loan_ledger_rs::BorrowerId) {
    let ledger = reconciler.ledger(borrower_id).unwrap();
    let paid: Money = ledger.payments.iter().map(|p| p.amount).sum();

    assert_eq!(ledger.borrower.remaining_balance, ledger.borrower.total - paid);
    assert_eq!(ledger.borrower.fully_paid, ledger.borrower.remaining_balance.is_zero());
    assert!(!ledger.borrower.remaining_balance.is_negative());

    let mut running = ledger.borrower.total;
    let mut previous = ledger.borrower.total;
    for payment in &ledger.payments {
        running -= payment.amount;
        assert_eq!(payment.remaining_balance, running);
        assert!(payment.remaining_balance <= previous);
        previous = payment.remaining_balance;
    }
    if let Some(last) = ledger.payments.last() {
        assert_eq!(last.remaining_balance, ledger.borrower.remaining_balance);
    }
}
