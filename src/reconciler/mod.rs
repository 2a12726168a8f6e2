pub mod locks;
pub mod sequence;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculator::LoanCalculator;
use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::records::{Borrower, BorrowerUpdate, NewBorrower, PaymentRecord};
use crate::store::{LedgerStore, WriteBatch};
use crate::types::{BorrowerId, Collection, LoanStatus, PaymentId, RecordKey};

pub use locks::BorrowerLocks;
pub use sequence::{order_payments, recompute_balances, Recomputed};

/// borrower balance after a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceOutcome {
    pub remaining_balance: Money,
    pub fully_paid: bool,
}

impl BalanceOutcome {
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_fully_paid(self.fully_paid)
    }
}

/// borrower totals after a terms edit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermsOutcome {
    pub total: Money,
    pub remaining_balance: Money,
    pub fully_paid: bool,
}

/// borrower with its payments in date order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerLedger {
    pub borrower: Borrower,
    pub payments: Vec<PaymentRecord>,
}

impl BorrowerLedger {
    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

/// keeps every derived balance consistent with the payment history
///
/// All mutations for one borrower run under that borrower's lock: load the
/// ledger, change it in memory, recompute the whole payment sequence, and
/// commit the result as one write batch. Validation failures return before
/// the commit, so a rejected call never leaves partial state behind.
pub struct LedgerReconciler<S: LedgerStore> {
    store: Arc<S>,
    config: LedgerConfig,
    calculator: LoanCalculator,
    locks: BorrowerLocks,
    events: Mutex<EventStore>,
    time: SafeTimeProvider,
}

impl<S: LedgerStore> LedgerReconciler<S> {
    pub fn new(store: Arc<S>, config: LedgerConfig, time: SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            calculator: LoanCalculator::from_config(&config),
            config,
            locks: BorrowerLocks::new(),
            events: Mutex::new(EventStore::new()),
            time,
        })
    }

    /// reconciler stamped with the system clock
    pub fn with_system_time(store: Arc<S>, config: LedgerConfig) -> Result<Self> {
        Self::new(store, config, SafeTimeProvider::new(TimeSource::System))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn calculator(&self) -> &LoanCalculator {
        &self.calculator
    }

    /// drain the events emitted so far
    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }

    /// register a new borrower with a freshly computed total
    pub fn register_borrower(&self, new: NewBorrower) -> Result<Borrower> {
        new.validate()?;
        let total = self.calculator.compute_total(new.principal_amount, new.term_months)?;
        let now = self.now();

        let borrower = Borrower {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            principal_amount: new.principal_amount,
            term_months: new.term_months,
            date_borrowed: new.date_borrowed,
            total,
            remaining_balance: total,
            fully_paid: false,
            created_at: now,
            updated_at: now,
        };
        self.store.create_borrower(borrower.clone())?;

        info!(borrower_id = %borrower.id, total = %total, "borrower registered");
        self.emit(vec![Event::BorrowerRegistered {
            borrower_id: borrower.id,
            principal: borrower.principal_amount,
            term_months: borrower.term_months,
            total,
            timestamp: now,
        }]);
        Ok(borrower)
    }

    /// record a payment and recompute every balance dated at or after it
    pub fn record_payment(
        &self,
        borrower_id: BorrowerId,
        payment_date: NaiveDate,
        amount: Money,
    ) -> Result<BalanceOutcome> {
        validate_amount(amount)?;

        self.locks.with_lock(borrower_id, || {
            let (mut borrower, mut payments) = self.store.load_ledger(borrower_id)?;

            if !self.config.allow_backdated_payments {
                if let Some(latest) = payments.iter().map(|p| p.payment_date).max() {
                    if payment_date < latest {
                        return Err(LedgerError::invalid_input(format!(
                            "payment dated {} precedes latest payment on {}",
                            payment_date, latest
                        )));
                    }
                }
            }

            let now = self.now();
            let sequence = payments.iter().map(|p| p.sequence + 1).max().unwrap_or(0);
            let payment = PaymentRecord::new(borrower_id, payment_date, amount, sequence, now);
            let payment_id = payment.id;
            payments.push(payment);

            let recomputed = self.recompute(&borrower, &mut payments)?;
            let old_status = borrower.status();
            apply_balance(&mut borrower, recomputed.final_balance, now);

            self.commit(&borrower, &payments, &recomputed, Some(payment_id))?;

            info!(
                borrower_id = %borrower_id,
                payment_id = %payment_id,
                amount = %amount,
                remaining = %borrower.remaining_balance,
                "payment recorded"
            );
            let mut events = vec![Event::PaymentRecorded {
                borrower_id,
                payment_id,
                amount,
                payment_date,
                remaining_balance: borrower.remaining_balance,
                timestamp: now,
            }];
            events.extend(status_change(&borrower, old_status, now));
            self.emit(events);

            Ok(outcome(&borrower))
        })
    }

    /// change one payment's date and/or amount, then recompute the whole sequence
    pub fn edit_payment(
        &self,
        payment_id: PaymentId,
        new_date: Option<NaiveDate>,
        new_amount: Option<Money>,
    ) -> Result<BalanceOutcome> {
        if let Some(amount) = new_amount {
            validate_amount(amount)?;
        }
        let borrower_id = self.store.get_payment(payment_id)?.borrower_id;

        self.locks.with_lock(borrower_id, || {
            let (mut borrower, mut payments) = self.store.load_ledger(borrower_id)?;
            let target = find_payment(&mut payments, payment_id)?;

            let old_amount = target.amount;
            let old_date = target.payment_date;
            if let Some(amount) = new_amount {
                target.amount = amount;
            }
            if let Some(date) = new_date {
                target.payment_date = date;
            }
            let (amount_after, date_after) = (target.amount, target.payment_date);

            let now = self.now();
            let recomputed = self.recompute(&borrower, &mut payments)?;
            let old_status = borrower.status();
            apply_balance(&mut borrower, recomputed.final_balance, now);

            self.commit(&borrower, &payments, &recomputed, Some(payment_id))?;

            info!(
                borrower_id = %borrower_id,
                payment_id = %payment_id,
                remaining = %borrower.remaining_balance,
                "payment edited"
            );
            let mut events = vec![Event::PaymentEdited {
                borrower_id,
                payment_id,
                old_amount,
                new_amount: amount_after,
                old_date,
                new_date: date_after,
                remaining_balance: borrower.remaining_balance,
                timestamp: now,
            }];
            events.extend(status_change(&borrower, old_status, now));
            self.emit(events);

            Ok(outcome(&borrower))
        })
    }

    /// remove one payment and recompute the rest
    pub fn delete_payment(&self, payment_id: PaymentId) -> Result<BalanceOutcome> {
        let borrower_id = self.store.get_payment(payment_id)?.borrower_id;

        self.locks.with_lock(borrower_id, || {
            let (mut borrower, mut payments) = self.store.load_ledger(borrower_id)?;
            let amount = find_payment(&mut payments, payment_id)?.amount;
            payments.retain(|p| p.id != payment_id);

            let now = self.now();
            let recomputed = self.recompute(&borrower, &mut payments)?;
            let old_status = borrower.status();
            apply_balance(&mut borrower, recomputed.final_balance, now);

            let batch = self
                .batch_for(&borrower, &payments, &recomputed, None)
                .delete(RecordKey::payment(payment_id));
            self.store.commit(batch)?;

            info!(
                borrower_id = %borrower_id,
                payment_id = %payment_id,
                remaining = %borrower.remaining_balance,
                "payment deleted"
            );
            let mut events = vec![Event::PaymentDeleted {
                borrower_id,
                payment_id,
                amount,
                remaining_balance: borrower.remaining_balance,
                timestamp: now,
            }];
            events.extend(status_change(&borrower, old_status, now));
            self.emit(events);

            Ok(outcome(&borrower))
        })
    }

    /// change principal and/or term, recomputing the total and every balance
    pub fn edit_borrower_terms(
        &self,
        borrower_id: BorrowerId,
        new_principal: Option<Money>,
        new_term: Option<u32>,
    ) -> Result<TermsOutcome> {
        let update = BorrowerUpdate {
            principal_amount: new_principal,
            term_months: new_term,
            ..BorrowerUpdate::default()
        };
        let borrower = self.edit_borrower(borrower_id, update)?;
        Ok(TermsOutcome {
            total: borrower.total,
            remaining_balance: borrower.remaining_balance,
            fully_paid: borrower.fully_paid,
        })
    }

    /// apply a partial borrower edit
    ///
    /// Name and date edits are plain field writes that keep the stored total;
    /// principal or term edits go through the calculator and a full recompute
    /// against the new total.
    pub fn edit_borrower(&self, borrower_id: BorrowerId, update: BorrowerUpdate) -> Result<Borrower> {
        update.validate()?;

        self.locks.with_lock(borrower_id, || {
            let (mut borrower, mut payments) = self.store.load_ledger(borrower_id)?;
            let now = self.now();

            let principal = update.principal_amount.unwrap_or(borrower.principal_amount);
            let term = update.term_months.unwrap_or(borrower.term_months);
            // a stored total only moves when the terms do
            let new_total = if update.touches_terms() {
                self.calculator.compute_total(principal, term)?
            } else {
                borrower.total
            };

            let old_total = borrower.total;
            let old_status = borrower.status();
            if let Some(name) = &update.name {
                borrower.name = name.trim().to_string();
            }
            if let Some(date) = update.date_borrowed {
                borrower.date_borrowed = date;
            }
            borrower.principal_amount = principal;
            borrower.term_months = term;
            borrower.total = new_total;

            let recomputed = self.recompute(&borrower, &mut payments)?;
            apply_balance(&mut borrower, recomputed.final_balance, now);

            self.commit(&borrower, &payments, &recomputed, None)?;

            let mut events = Vec::new();
            if update.touches_terms() {
                info!(
                    borrower_id = %borrower_id,
                    old_total = %old_total,
                    new_total = %new_total,
                    remaining = %borrower.remaining_balance,
                    "borrower terms changed"
                );
                events.push(Event::BorrowerTermsChanged {
                    borrower_id,
                    old_total,
                    new_total,
                    remaining_balance: borrower.remaining_balance,
                    timestamp: now,
                });
            } else {
                info!(borrower_id = %borrower_id, "borrower details updated");
            }
            events.extend(status_change(&borrower, old_status, now));
            self.emit(events);

            Ok(borrower)
        })
    }

    /// delete a borrower together with all of its payments
    ///
    /// The store removes payments before the borrower, so after a
    /// `PartialFailure` the borrower is still present and calling this again
    /// removes whatever is left.
    pub fn delete_borrower(&self, borrower_id: BorrowerId) -> Result<()> {
        let result = self.locks.with_lock(borrower_id, || {
            let payments = self.store.payments_for_borrower(borrower_id)?;
            let borrower_exists = match self.store.get_borrower(borrower_id) {
                Ok(_) => true,
                Err(LedgerError::NotFound { .. }) => false,
                Err(e) => return Err(e),
            };
            if !borrower_exists && payments.is_empty() {
                return Err(LedgerError::not_found(Collection::Borrowers, borrower_id));
            }

            let mut keys: Vec<RecordKey> = payments.iter().map(|p| RecordKey::payment(p.id)).collect();
            if borrower_exists {
                keys.push(RecordKey::borrower(borrower_id));
            }

            if let Err(e) = self.store.batch_delete(&keys) {
                warn!(borrower_id = %borrower_id, error = %e, "borrower deletion incomplete");
                return Err(e);
            }

            info!(borrower_id = %borrower_id, payments = payments.len(), "borrower deleted");
            self.emit(vec![Event::BorrowerDeleted {
                borrower_id,
                payments_removed: payments.len(),
                timestamp: self.now(),
            }]);
            Ok(())
        });

        if result.is_ok() {
            self.locks.forget(borrower_id);
        }
        result
    }

    pub fn borrower(&self, borrower_id: BorrowerId) -> Result<Borrower> {
        self.store.get_borrower(borrower_id)
    }

    /// borrower and its payments, read as one snapshot
    pub fn ledger(&self, borrower_id: BorrowerId) -> Result<BorrowerLedger> {
        let (borrower, mut payments) = self.store.load_ledger(borrower_id)?;
        order_payments(&mut payments);
        Ok(BorrowerLedger { borrower, payments })
    }

    /// payments for a borrower in date order
    pub fn payments(&self, borrower_id: BorrowerId) -> Result<Vec<PaymentRecord>> {
        Ok(self.ledger(borrower_id)?.payments)
    }

    pub fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        self.store.list_borrowers()
    }

    /// case-insensitive substring match on borrower name
    pub fn search_borrowers(&self, query: &str) -> Result<Vec<Borrower>> {
        let needle = query.trim().to_lowercase();
        let borrowers = self.store.list_borrowers()?;
        if needle.is_empty() {
            return Ok(borrowers);
        }
        Ok(borrowers
            .into_iter()
            .filter(|b| b.name.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn borrowers_with_status(&self, status: LoanStatus) -> Result<Vec<Borrower>> {
        Ok(self
            .store
            .list_borrowers()?
            .into_iter()
            .filter(|b| b.status() == status)
            .collect())
    }

    fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    fn emit(&self, events: Vec<Event>) {
        self.events.lock().extend(events);
    }

    fn recompute(&self, borrower: &Borrower, payments: &mut [PaymentRecord]) -> Result<Recomputed> {
        let recomputed = recompute_balances(borrower.id, borrower.total, payments).map_err(|e| {
            warn!(borrower_id = %borrower.id, error = %e, "reconciliation rejected");
            e
        })?;
        debug!(
            borrower_id = %borrower.id,
            total = %borrower.total,
            final_balance = %recomputed.final_balance,
            rows_moved = recomputed.changed.len(),
            "payment sequence recomputed"
        );
        Ok(recomputed)
    }

    fn batch_for(
        &self,
        borrower: &Borrower,
        payments: &[PaymentRecord],
        recomputed: &Recomputed,
        always: Option<PaymentId>,
    ) -> WriteBatch {
        let dirty = payments
            .iter()
            .filter(|p| Some(p.id) == always || recomputed.changed.contains(&p.id))
            .cloned();
        WriteBatch::new().put_borrower(borrower.clone()).put_payments(dirty)
    }

    fn commit(
        &self,
        borrower: &Borrower,
        payments: &[PaymentRecord],
        recomputed: &Recomputed,
        always: Option<PaymentId>,
    ) -> Result<()> {
        self.store.commit(self.batch_for(borrower, payments, recomputed, always))
    }
}

fn validate_amount(amount: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(LedgerError::invalid_input(format!(
            "payment amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

fn find_payment(payments: &mut [PaymentRecord], payment_id: PaymentId) -> Result<&mut PaymentRecord> {
    payments
        .iter_mut()
        .find(|p| p.id == payment_id)
        .ok_or_else(|| LedgerError::not_found(Collection::PaymentsHistory, payment_id))
}

fn apply_balance(borrower: &mut Borrower, balance: Money, now: DateTime<Utc>) {
    borrower.remaining_balance = balance;
    borrower.fully_paid = balance.is_zero();
    borrower.updated_at = now;
}

fn status_change(borrower: &Borrower, old_status: LoanStatus, now: DateTime<Utc>) -> Option<Event> {
    let new_status = borrower.status();
    if new_status == old_status {
        return None;
    }
    info!(borrower_id = %borrower.id, ?old_status, ?new_status, "loan status changed");
    Some(Event::StatusChanged {
        borrower_id: borrower.id,
        old_status,
        new_status,
        timestamp: now,
    })
}

fn outcome(borrower: &Borrower) -> BalanceOutcome {
    BalanceOutcome {
        remaining_balance: borrower.remaining_balance,
        fully_paid: borrower.fully_paid,
    }
}
