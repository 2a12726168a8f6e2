use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::errors::{LedgerError, Result};
use crate::records::{Borrower, CashLedgerRecord, PaymentRecord};
use crate::store::{missing_cash_ledger, LedgerStore, Snapshot, WriteBatch};
use crate::types::{BorrowerId, Collection, PaymentId, RecordKey};

#[derive(Debug, Default)]
struct Tables {
    borrowers: HashMap<BorrowerId, Borrower>,
    payments: HashMap<PaymentId, PaymentRecord>,
    cash: Option<CashLedgerRecord>,
}

impl Tables {
    fn contains(&self, key: &RecordKey) -> bool {
        match key.collection {
            Collection::Borrowers => self.borrowers.contains_key(&key.id),
            Collection::PaymentsHistory => self.payments.contains_key(&key.id),
            Collection::CashLedger => self.cash.is_some(),
        }
    }

    fn remove(&mut self, key: &RecordKey) -> bool {
        match key.collection {
            Collection::Borrowers => self.borrowers.remove(&key.id).is_some(),
            Collection::PaymentsHistory => self.payments.remove(&key.id).is_some(),
            Collection::CashLedger => self.cash.take().is_some(),
        }
    }

    fn sorted_borrowers(&self) -> Vec<Borrower> {
        let mut borrowers: Vec<Borrower> = self.borrowers.values().cloned().collect();
        borrowers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        borrowers
    }

    fn sorted_payments(&self, filter: Option<BorrowerId>) -> Vec<PaymentRecord> {
        let mut payments: Vec<PaymentRecord> = self
            .payments
            .values()
            .filter(|p| filter.map_or(true, |id| p.borrower_id == id))
            .cloned()
            .collect();
        payments.sort_by(|a, b| {
            a.payment_date
                .cmp(&b.payment_date)
                .then(a.sequence.cmp(&b.sequence))
                .then_with(|| a.id.cmp(&b.id))
        });
        payments
    }

    fn snapshot(&self, collection: Collection, filter: Option<BorrowerId>) -> Snapshot {
        match collection {
            Collection::Borrowers => Snapshot::Borrowers(self.sorted_borrowers()),
            Collection::PaymentsHistory => Snapshot::Payments(self.sorted_payments(filter)),
            Collection::CashLedger => Snapshot::CashLedger(self.cash.unwrap_or_default()),
        }
    }
}

struct Subscriber {
    collection: Collection,
    filter: Option<BorrowerId>,
    sender: Sender<Snapshot>,
}

/// in-memory store guarded by one lock, so every write is atomic to readers
pub struct MemoryStore {
    tables: RwLock<Tables>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl MemoryStore {
    /// empty store with a zeroed cash ledger record
    pub fn new() -> Self {
        Self::with_cash(CashLedgerRecord::default())
    }

    /// empty store seeded with an existing cash position
    pub fn with_cash(cash: CashLedgerRecord) -> Self {
        Self {
            tables: RwLock::new(Tables {
                cash: Some(cash),
                ..Tables::default()
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// store with no cash ledger record at all
    pub fn without_cash_ledger() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn borrower_count(&self) -> usize {
        self.tables.read().borrowers.len()
    }

    pub fn payment_count(&self) -> usize {
        self.tables.read().payments.len()
    }

    // downgrade so snapshots are taken from exactly the state just written
    fn publish(&self, guard: RwLockWriteGuard<'_, Tables>, touched: &[Collection]) {
        let tables = RwLockWriteGuard::downgrade(guard);
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sub| {
            if !touched.contains(&sub.collection) {
                return true;
            }
            sub.sender
                .send(tables.snapshot(sub.collection, sub.filter))
                .is_ok()
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryStore {
    fn get_borrower(&self, id: BorrowerId) -> Result<Borrower> {
        self.tables
            .read()
            .borrowers
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Collection::Borrowers, id))
    }

    fn create_borrower(&self, borrower: Borrower) -> Result<BorrowerId> {
        let id = borrower.id;
        let mut tables = self.tables.write();
        tables.borrowers.insert(id, borrower);
        self.publish(tables, &[Collection::Borrowers]);
        Ok(id)
    }

    fn update_borrower(&self, borrower: &Borrower) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.borrowers.get_mut(&borrower.id) {
            Some(existing) => *existing = borrower.clone(),
            None => return Err(LedgerError::not_found(Collection::Borrowers, borrower.id)),
        }
        self.publish(tables, &[Collection::Borrowers]);
        Ok(())
    }

    fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        Ok(self.tables.read().sorted_borrowers())
    }

    fn get_payment(&self, id: PaymentId) -> Result<PaymentRecord> {
        self.tables
            .read()
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Collection::PaymentsHistory, id))
    }

    fn create_payment(&self, payment: PaymentRecord) -> Result<PaymentId> {
        let mut tables = self.tables.write();
        if !tables.borrowers.contains_key(&payment.borrower_id) {
            return Err(LedgerError::not_found(Collection::Borrowers, payment.borrower_id));
        }
        let id = payment.id;
        tables.payments.insert(id, payment);
        self.publish(tables, &[Collection::PaymentsHistory]);
        Ok(id)
    }

    fn update_payment(&self, payment: &PaymentRecord) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.payments.get_mut(&payment.id) {
            Some(existing) => *existing = payment.clone(),
            None => return Err(LedgerError::not_found(Collection::PaymentsHistory, payment.id)),
        }
        self.publish(tables, &[Collection::PaymentsHistory]);
        Ok(())
    }

    fn delete_payment(&self, id: PaymentId) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.payments.remove(&id).is_none() {
            return Err(LedgerError::not_found(Collection::PaymentsHistory, id));
        }
        self.publish(tables, &[Collection::PaymentsHistory]);
        Ok(())
    }

    fn payments_for_borrower(&self, borrower_id: BorrowerId) -> Result<Vec<PaymentRecord>> {
        Ok(self.tables.read().sorted_payments(Some(borrower_id)))
    }

    fn load_ledger(&self, borrower_id: BorrowerId) -> Result<(Borrower, Vec<PaymentRecord>)> {
        let tables = self.tables.read();
        let borrower = tables
            .borrowers
            .get(&borrower_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Collection::Borrowers, borrower_id))?;
        Ok((borrower, tables.sorted_payments(Some(borrower_id))))
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let touched = batch.touched();
        let mut tables = self.tables.write();

        // validate everything before touching any table
        if let Some(missing) = batch.deletes.iter().find(|k| !tables.contains(k)) {
            return Err(LedgerError::not_found(missing.collection, missing.id));
        }
        for payment in &batch.payments {
            let owner_written = batch.borrowers.iter().any(|b| b.id == payment.borrower_id);
            if !owner_written && !tables.borrowers.contains_key(&payment.borrower_id) {
                return Err(LedgerError::not_found(Collection::Borrowers, payment.borrower_id));
            }
        }

        debug!(
            borrowers = batch.borrowers.len(),
            payments = batch.payments.len(),
            deletes = batch.deletes.len(),
            "committing write batch"
        );
        for borrower in batch.borrowers {
            tables.borrowers.insert(borrower.id, borrower);
        }
        for payment in batch.payments {
            tables.payments.insert(payment.id, payment);
        }
        for key in &batch.deletes {
            tables.remove(key);
        }

        self.publish(tables, &touched);
        Ok(())
    }

    /// keys that are already absent count as deleted
    fn batch_delete(&self, keys: &[RecordKey]) -> Result<()> {
        let mut tables = self.tables.write();
        let mut touched = Vec::new();
        for key in keys {
            if tables.remove(key) && !touched.contains(&key.collection) {
                touched.push(key.collection);
            }
        }
        self.publish(tables, &touched);
        Ok(())
    }

    fn get_cash(&self) -> Result<CashLedgerRecord> {
        self.tables.read().cash.ok_or_else(missing_cash_ledger)
    }

    fn update_cash(&self, record: CashLedgerRecord) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.cash.as_mut() {
            Some(existing) => *existing = record,
            None => return Err(missing_cash_ledger()),
        }
        self.publish(tables, &[Collection::CashLedger]);
        Ok(())
    }

    fn subscribe(&self, collection: Collection, filter: Option<BorrowerId>) -> Receiver<Snapshot> {
        let (sender, receiver) = unbounded();
        // hold the read lock while registering so no write slips in between
        let tables = self.tables.read();
        if sender.send(tables.snapshot(collection, filter)).is_ok() {
            self.subscribers.lock().push(Subscriber {
                collection,
                filter,
                sender,
            });
        }
        receiver
    }
}
