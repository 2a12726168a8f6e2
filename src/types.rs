use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a borrower
pub type BorrowerId = Uuid;

/// unique identifier for a payment record
pub type PaymentId = Uuid;

/// payoff status of a borrower's loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// balance still owed
    Active,
    /// remaining balance is exactly zero
    FullyPaid,
}

impl LoanStatus {
    pub fn from_fully_paid(fully_paid: bool) -> Self {
        if fully_paid {
            LoanStatus::FullyPaid
        } else {
            LoanStatus::Active
        }
    }
}

/// which side of the cash ledger an adjustment targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CashField {
    /// cash held in the bank
    CashIn,
    /// cash held physically
    CashHand,
}

impl fmt::Display for CashField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashField::CashIn => write!(f, "cashIn"),
            CashField::CashHand => write!(f, "cashHand"),
        }
    }
}

/// record collections held by the persistence store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Borrowers,
    PaymentsHistory,
    CashLedger,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Borrowers => write!(f, "borrowers"),
            Collection::PaymentsHistory => write!(f, "paymentsHistory"),
            Collection::CashLedger => write!(f, "cashLedger"),
        }
    }
}

/// address of a single stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub collection: Collection,
    pub id: Uuid,
}

impl RecordKey {
    pub fn borrower(id: BorrowerId) -> Self {
        Self { collection: Collection::Borrowers, id }
    }

    pub fn payment(id: PaymentId) -> Self {
        Self { collection: Collection::PaymentsHistory, id }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
