pub mod memory;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::records::{Borrower, CashLedgerRecord, PaymentRecord};
use crate::types::{BorrowerId, Collection, PaymentId, RecordKey};

pub use memory::MemoryStore;

/// full-collection snapshot pushed to subscribers after every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    Borrowers(Vec<Borrower>),
    Payments(Vec<PaymentRecord>),
    CashLedger(CashLedgerRecord),
}

impl Snapshot {
    pub fn collection(&self) -> Collection {
        match self {
            Snapshot::Borrowers(_) => Collection::Borrowers,
            Snapshot::Payments(_) => Collection::PaymentsHistory,
            Snapshot::CashLedger(_) => Collection::CashLedger,
        }
    }
}

/// multi-record write applied all-or-nothing by [`LedgerStore::commit`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub borrowers: Vec<Borrower>,
    pub payments: Vec<PaymentRecord>,
    pub deletes: Vec<RecordKey>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_borrower(mut self, borrower: Borrower) -> Self {
        self.borrowers.push(borrower);
        self
    }

    pub fn put_payments(mut self, payments: impl IntoIterator<Item = PaymentRecord>) -> Self {
        self.payments.extend(payments);
        self
    }

    pub fn delete(mut self, key: RecordKey) -> Self {
        self.deletes.push(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.borrowers.is_empty() && self.payments.is_empty() && self.deletes.is_empty()
    }

    /// collections this batch writes to
    pub fn touched(&self) -> Vec<Collection> {
        let mut touched = Vec::new();
        if !self.borrowers.is_empty()
            || self.deletes.iter().any(|k| k.collection == Collection::Borrowers)
        {
            touched.push(Collection::Borrowers);
        }
        if !self.payments.is_empty()
            || self.deletes.iter().any(|k| k.collection == Collection::PaymentsHistory)
        {
            touched.push(Collection::PaymentsHistory);
        }
        touched
    }
}

/// persistence collaborator the ledger reads from and writes to
///
/// Single-record methods report `NotFound` for absent ids. `commit` must apply
/// the whole batch or nothing. `batch_delete` may fail part way, in which case
/// it reports `PartialFailure` naming what was and was not removed.
pub trait LedgerStore: Send + Sync {
    fn get_borrower(&self, id: BorrowerId) -> Result<Borrower>;
    fn create_borrower(&self, borrower: Borrower) -> Result<BorrowerId>;
    fn update_borrower(&self, borrower: &Borrower) -> Result<()>;
    fn list_borrowers(&self) -> Result<Vec<Borrower>>;

    fn get_payment(&self, id: PaymentId) -> Result<PaymentRecord>;
    fn create_payment(&self, payment: PaymentRecord) -> Result<PaymentId>;
    fn update_payment(&self, payment: &PaymentRecord) -> Result<()>;
    fn delete_payment(&self, id: PaymentId) -> Result<()>;

    /// every payment whose borrower id matches, in no particular order
    fn payments_for_borrower(&self, borrower_id: BorrowerId) -> Result<Vec<PaymentRecord>>;

    /// borrower plus its payments as one consistent read
    ///
    /// Implementations must not let a concurrent commit or batch delete land
    /// between the two halves of this read.
    fn load_ledger(&self, borrower_id: BorrowerId) -> Result<(Borrower, Vec<PaymentRecord>)>;

    fn commit(&self, batch: WriteBatch) -> Result<()>;
    fn batch_delete(&self, keys: &[RecordKey]) -> Result<()>;

    fn get_cash(&self) -> Result<CashLedgerRecord>;
    fn update_cash(&self, record: CashLedgerRecord) -> Result<()>;

    /// stream of full snapshots of `collection`, starting with the current one
    ///
    /// `filter` narrows payment snapshots to a single borrower and is ignored
    /// for the other collections.
    fn subscribe(&self, collection: Collection, filter: Option<BorrowerId>) -> Receiver<Snapshot>;
}

pub(crate) fn missing_cash_ledger() -> LedgerError {
    LedgerError::not_found(Collection::CashLedger, uuid::Uuid::nil())
}
