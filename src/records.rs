use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{BorrowerId, LoanStatus, PaymentId};

/// a borrower and the derived state of their loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub name: String,
    pub principal_amount: Money,
    pub term_months: u32,
    pub date_borrowed: NaiveDate,

    // derived, written only by the reconciler
    pub total: Money,
    pub remaining_balance: Money,
    pub fully_paid: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Borrower {
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_fully_paid(self.fully_paid)
    }

    /// amount repaid so far
    pub fn amount_paid(&self) -> Money {
        self.total - self.remaining_balance
    }
}

/// input for registering a borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBorrower {
    pub name: String,
    pub principal_amount: Money,
    pub term_months: u32,
    pub date_borrowed: NaiveDate,
}

impl NewBorrower {
    pub fn new(
        name: impl Into<String>,
        principal_amount: Money,
        term_months: u32,
        date_borrowed: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            principal_amount,
            term_months,
            date_borrowed,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }
}

/// partial edit of a borrower; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BorrowerUpdate {
    pub name: Option<String>,
    pub principal_amount: Option<Money>,
    pub term_months: Option<u32>,
    pub date_borrowed: Option<NaiveDate>,
}

impl BorrowerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn principal_amount(mut self, principal: Money) -> Self {
        self.principal_amount = Some(principal);
        self
    }

    pub fn term_months(mut self, term: u32) -> Self {
        self.term_months = Some(term);
        self
    }

    pub fn date_borrowed(mut self, date: NaiveDate) -> Self {
        self.date_borrowed = Some(date);
        self
    }

    /// whether the edit can change the total owed
    pub fn touches_terms(&self) -> bool {
        self.principal_amount.is_some() || self.term_months.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }
}

/// a single repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub borrower_id: BorrowerId,
    pub payment_date: NaiveDate,
    pub amount: Money,
    /// borrower balance after this payment, in date order
    pub remaining_balance: Money,
    /// tie-breaker for payments sharing a date; assigned in recording order
    pub sequence: u32,
    pub recorded_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(
        borrower_id: BorrowerId,
        payment_date: NaiveDate,
        amount: Money,
        sequence: u32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            borrower_id,
            payment_date,
            amount,
            remaining_balance: Money::ZERO,
            sequence,
            recorded_at,
        }
    }
}

/// singleton cash position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CashLedgerRecord {
    pub cash_in: Money,
    pub cash_hand: Money,
}

impl CashLedgerRecord {
    pub fn total(&self) -> Money {
        self.cash_in + self.cash_hand
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::invalid_input("borrower name must not be empty"));
    }
    Ok(())
}
