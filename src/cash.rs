use std::sync::Arc;

use hourglass_rs::{SafeTimeProvider, TimeSource};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::records::CashLedgerRecord;
use crate::store::LedgerStore;
use crate::types::{CashField, LoanStatus};

/// portfolio-wide totals; computed on demand, never stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrandTotal {
    pub outstanding: Money,
    pub cash_in: Money,
    pub cash_hand: Money,
    pub total: Money,
    pub active_loans: usize,
    pub fully_paid_loans: usize,
}

/// cash-in-bank / cash-on-hand ledger; neither side may go negative
pub struct CashLedger<S: LedgerStore> {
    store: Arc<S>,
    // serializes read-modify-write of the singleton record
    write_lock: Mutex<()>,
    events: Mutex<EventStore>,
    time: SafeTimeProvider,
}

impl<S: LedgerStore> CashLedger<S> {
    pub fn new(store: Arc<S>, time: SafeTimeProvider) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            events: Mutex::new(EventStore::new()),
            time,
        }
    }

    pub fn with_system_time(store: Arc<S>) -> Self {
        Self::new(store, SafeTimeProvider::new(TimeSource::System))
    }

    pub fn balances(&self) -> Result<CashLedgerRecord> {
        self.store.get_cash()
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }

    /// add a signed delta to one field, returning the new value
    pub fn adjust(&self, field: CashField, delta: Money) -> Result<Money> {
        let _guard = self.write_lock.lock();
        let mut record = self.store.get_cash()?;

        let current = field_value(&record, field);
        let updated = checked_apply(field, current, delta)?;
        set_field(&mut record, field, updated);
        self.store.update_cash(record)?;

        info!(%field, delta = %delta, new_value = %updated, "cash adjusted");
        self.events.lock().emit(Event::CashAdjusted {
            field,
            delta,
            new_value: updated,
            timestamp: self.time.now(),
        });
        Ok(updated)
    }

    /// add to both fields in one write
    pub fn deposit(&self, cash_in: Money, cash_hand: Money) -> Result<CashLedgerRecord> {
        non_negative("cashIn", cash_in)?;
        non_negative("cashHand", cash_hand)?;
        self.apply_pair(cash_in, cash_hand)
    }

    /// remove from both fields; both are checked before either is written
    pub fn withdraw(&self, cash_in: Money, cash_hand: Money) -> Result<CashLedgerRecord> {
        non_negative("cashIn", cash_in)?;
        non_negative("cashHand", cash_hand)?;
        self.apply_pair(-cash_in, -cash_hand)
    }

    fn apply_pair(&self, delta_in: Money, delta_hand: Money) -> Result<CashLedgerRecord> {
        let _guard = self.write_lock.lock();
        let mut record = self.store.get_cash()?;

        let mut applied = Vec::new();
        for (field, delta) in [(CashField::CashIn, delta_in), (CashField::CashHand, delta_hand)] {
            if delta.is_zero() {
                continue;
            }
            let current = field_value(&record, field);
            let updated = checked_apply(field, current, delta)?;
            set_field(&mut record, field, updated);
            applied.push((field, delta, updated));
        }

        if applied.is_empty() {
            return Ok(record);
        }
        self.store.update_cash(record)?;

        let now = self.time.now();
        let mut events = self.events.lock();
        for (field, delta, new_value) in applied {
            info!(%field, delta = %delta, new_value = %new_value, "cash adjusted");
            events.emit(Event::CashAdjusted {
                field,
                delta,
                new_value,
                timestamp: now,
            });
        }
        Ok(record)
    }

    /// sum of every borrower's remaining balance plus cash on both sides
    pub fn grand_total(&self) -> Result<GrandTotal> {
        grand_total(self.store.as_ref())
    }
}

/// compute the grand total straight from a store
pub fn grand_total<S: LedgerStore + ?Sized>(store: &S) -> Result<GrandTotal> {
    let borrowers = store.list_borrowers()?;
    let cash = store.get_cash()?;

    let overflow = || LedgerError::invalid_input("grand total overflows currency range");
    let outstanding = borrowers
        .iter()
        .try_fold(Money::ZERO, |acc, b| acc.checked_add(b.remaining_balance))
        .ok_or_else(overflow)?;
    let total = outstanding
        .checked_add(cash.cash_in)
        .and_then(|t| t.checked_add(cash.cash_hand))
        .ok_or_else(overflow)?;
    let fully_paid_loans = borrowers
        .iter()
        .filter(|b| b.status() == LoanStatus::FullyPaid)
        .count();

    Ok(GrandTotal {
        outstanding,
        cash_in: cash.cash_in,
        cash_hand: cash.cash_hand,
        total,
        active_loans: borrowers.len() - fully_paid_loans,
        fully_paid_loans,
    })
}

fn field_value(record: &CashLedgerRecord, field: CashField) -> Money {
    match field {
        CashField::CashIn => record.cash_in,
        CashField::CashHand => record.cash_hand,
    }
}

fn set_field(record: &mut CashLedgerRecord, field: CashField, value: Money) {
    match field {
        CashField::CashIn => record.cash_in = value,
        CashField::CashHand => record.cash_hand = value,
    }
}

fn checked_apply(field: CashField, current: Money, delta: Money) -> Result<Money> {
    let updated = current.checked_add(delta).ok_or_else(|| {
        warn!(%field, current = %current, delta = %delta, "cash adjustment overflows");
        LedgerError::invalid_input(format!("{} adjustment of {} overflows currency range", field, delta))
    })?;
    if updated.is_negative() {
        warn!(%field, current = %current, delta = %delta, "cash adjustment rejected");
        return Err(underflow(field, current, -delta));
    }
    Ok(updated)
}

fn underflow(field: CashField, available: Money, requested: Money) -> LedgerError {
    LedgerError::BalanceUnderflow {
        account: field.to_string(),
        available,
        requested,
    }
}

fn non_negative(label: &str, amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(LedgerError::invalid_input(format!(
            "{} amount must not be negative, got {}",
            label, amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::errors::ErrorKind;
    use crate::store::MemoryStore;

    fn ledger(cash_in: i64, cash_hand: i64) -> CashLedger<MemoryStore> {
        let store = Arc::new(MemoryStore::with_cash(CashLedgerRecord {
            cash_in: Money::from_major(cash_in),
            cash_hand: Money::from_major(cash_hand),
        }));
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        CashLedger::new(store, time)
    }

    #[test]
    fn test_add_has_no_precondition() {
        let cash = ledger(0, 0);
        let value = cash.adjust(CashField::CashIn, Money::from_major(250)).unwrap();
        assert_eq!(value, Money::from_major(250));
        assert_eq!(cash.balances().unwrap().cash_in, Money::from_major(250));
    }

    #[test]
    fn test_overdraw_rejected_and_value_kept() {
        let cash = ledger(0, 50);
        let err = cash.adjust(CashField::CashHand, Money::from_major(-100)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BalanceUnderflow);
        assert_eq!(
            err,
            LedgerError::BalanceUnderflow {
                account: "cashHand".to_string(),
                available: Money::from_major(50),
                requested: Money::from_major(100),
            }
        );
        assert_eq!(cash.balances().unwrap().cash_hand, Money::from_major(50));
        assert!(cash.take_events().is_empty());
    }

    #[test]
    fn test_remove_to_exactly_zero() {
        let cash = ledger(0, 50);
        let value = cash.adjust(CashField::CashHand, Money::from_major(-50)).unwrap();
        assert!(value.is_zero());
    }

    #[test]
    fn test_withdraw_checks_both_before_writing() {
        let cash = ledger(100, 10);
        let err = cash.withdraw(Money::from_major(40), Money::from_major(20)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BalanceUnderflow);

        // cashIn was valid but must not have been written
        let record = cash.balances().unwrap();
        assert_eq!(record.cash_in, Money::from_major(100));
        assert_eq!(record.cash_hand, Money::from_major(10));
    }

    #[test]
    fn test_deposit_and_withdraw_pair() {
        let cash = ledger(0, 0);
        cash.deposit(Money::from_major(500), Money::from_major(75)).unwrap();
        let record = cash.withdraw(Money::from_major(200), Money::ZERO).unwrap();

        assert_eq!(record.cash_in, Money::from_major(300));
        assert_eq!(record.cash_hand, Money::from_major(75));
        // two deposits and one withdrawal; the zero leg is skipped
        assert_eq!(cash.take_events().len(), 3);
    }

    #[test]
    fn test_negative_deposit_is_invalid() {
        let cash = ledger(0, 0);
        let err = cash.deposit(Money::from_major(-1), Money::ZERO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let cash = CashLedger::with_system_time(Arc::new(MemoryStore::without_cash_ledger()));
        let err = cash.adjust(CashField::CashIn, Money::from_major(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_overflowing_deposit_is_an_error() {
        let store = Arc::new(MemoryStore::with_cash(CashLedgerRecord {
            cash_in: Money::from_decimal(Decimal::MAX),
            cash_hand: Money::ZERO,
        }));
        let cash = CashLedger::new(
            store,
            SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
        );

        let err = cash.adjust(CashField::CashIn, Money::from_major(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = cash.deposit(Money::from_major(1), Money::from_major(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        // nothing was written, including the valid cashHand leg
        let record = cash.balances().unwrap();
        assert_eq!(record.cash_in, Money::from_decimal(Decimal::MAX));
        assert!(record.cash_hand.is_zero());
        assert!(cash.take_events().is_empty());
    }

    #[test]
    fn test_grand_total_with_no_borrowers() {
        let cash = ledger(1000, 250);
        let total = cash.grand_total().unwrap();
        assert_eq!(total.total, Money::from_major(1250));
        assert_eq!(total.outstanding, Money::ZERO);
        assert_eq!(total.active_loans, 0);
    }
}
