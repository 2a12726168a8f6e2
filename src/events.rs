use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BorrowerId, CashField, LoanStatus, PaymentId};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // borrower events
    BorrowerRegistered {
        borrower_id: BorrowerId,
        principal: Money,
        term_months: u32,
        total: Money,
        timestamp: DateTime<Utc>,
    },
    BorrowerTermsChanged {
        borrower_id: BorrowerId,
        old_total: Money,
        new_total: Money,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },
    BorrowerDeleted {
        borrower_id: BorrowerId,
        payments_removed: usize,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentRecorded {
        borrower_id: BorrowerId,
        payment_id: PaymentId,
        amount: Money,
        payment_date: NaiveDate,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentEdited {
        borrower_id: BorrowerId,
        payment_id: PaymentId,
        old_amount: Money,
        new_amount: Money,
        old_date: NaiveDate,
        new_date: NaiveDate,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentDeleted {
        borrower_id: BorrowerId,
        payment_id: PaymentId,
        amount: Money,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        borrower_id: BorrowerId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },

    // cash ledger events
    CashAdjusted {
        field: CashField,
        delta: Money,
        new_value: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// borrower the event concerns, if any
    pub fn borrower_id(&self) -> Option<BorrowerId> {
        match self {
            Event::BorrowerRegistered { borrower_id, .. }
            | Event::BorrowerTermsChanged { borrower_id, .. }
            | Event::BorrowerDeleted { borrower_id, .. }
            | Event::PaymentRecorded { borrower_id, .. }
            | Event::PaymentEdited { borrower_id, .. }
            | Event::PaymentDeleted { borrower_id, .. }
            | Event::StatusChanged { borrower_id, .. } => Some(*borrower_id),
            Event::CashAdjusted { .. } => None,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
