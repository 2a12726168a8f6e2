use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{Collection, RecordKey};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("balance underflow on {account}: available {available}, requested {requested}")]
    BalanceUnderflow {
        account: String,
        available: Money,
        requested: Money,
    },

    #[error("{collection} record not found: {id}")]
    NotFound {
        collection: Collection,
        id: Uuid,
    },

    #[error("partial failure: {} writes applied, {} remaining", .completed.len(), .remaining.len())]
    PartialFailure {
        completed: Vec<RecordKey>,
        remaining: Vec<RecordKey>,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

/// coarse classification callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    BalanceUnderflow,
    NotFound,
    PartialFailure,
    InvalidConfiguration,
}

impl LedgerError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        LedgerError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(collection: Collection, id: Uuid) -> Self {
        LedgerError::NotFound { collection, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidInput { .. } => ErrorKind::InvalidInput,
            LedgerError::BalanceUnderflow { .. } => ErrorKind::BalanceUnderflow,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::PartialFailure { .. } => ErrorKind::PartialFailure,
            LedgerError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
