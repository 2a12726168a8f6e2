pub mod calculator;
pub mod cash;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod reconciler;
pub mod records;
pub mod report;
pub mod store;
pub mod types;

// re-export key types
pub use calculator::{compute_total, parse_term, LoanCalculator};
pub use cash::{CashLedger, GrandTotal};
pub use config::{LedgerConfig, RoundingMode};
pub use decimal::{Money, Rate};
pub use errors::{ErrorKind, LedgerError, Result};
pub use events::{Event, EventStore};
pub use reconciler::{BalanceOutcome, BorrowerLedger, LedgerReconciler, TermsOutcome};
pub use records::{Borrower, BorrowerUpdate, CashLedgerRecord, NewBorrower, PaymentRecord};
pub use report::{BorrowerReport, PaymentRow};
pub use store::{LedgerStore, MemoryStore, Snapshot, WriteBatch};
pub use types::{BorrowerId, CashField, Collection, LoanStatus, PaymentId, RecordKey};

// re-export external dependencies that users will need
pub use chrono;
pub use crossbeam_channel;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
