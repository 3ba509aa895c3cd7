//! Domain error taxonomy.
//!
//! A closed set of failures every caller can match exhaustively: validation
//! errors (rejected before any lock), business-rule errors (rejected with no
//! side effects, safe to retry after correcting the condition), and system
//! errors (the unit was rolled back in full; retry policy is the caller's).

use thiserror::Error;
use uuid::Uuid;

use super::account::AccountStatus;
use super::transfer::TransferStatus;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum DomainError {
    // -- validation ------------------------------------------------------
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // -- business rules --------------------------------------------------
    #[error("insufficient balance: required {required_cents}, available {available_cents}")]
    InsufficientBalance {
        required_cents: i64,
        available_cents: i64,
    },

    #[error("daily transfer limit exceeded: attempted {attempted_cents}, limit {limit_cents}")]
    DailyLimitExceeded {
        attempted_cents: i64,
        limit_cents: i64,
    },

    #[error("monthly transfer limit exceeded: attempted {attempted_cents}, limit {limit_cents}")]
    MonthlyLimitExceeded {
        attempted_cents: i64,
        limit_cents: i64,
    },

    #[error("cannot transfer to yourself")]
    SelfTransfer,

    #[error("transfer status {status} does not permit this operation")]
    InvalidTransferStatus { status: TransferStatus },

    #[error("transfer not found: {0}")]
    TransferNotFound(Uuid),

    #[error("account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("recipient account not found: {0}")]
    RecipientNotFound(Uuid),

    #[error("account is {status}")]
    AccountNotActive { status: AccountStatus },

    #[error("bill not found: {0}")]
    BillNotFound(Uuid),

    #[error("bill is already paid")]
    BillAlreadyPaid,

    #[error("bill is cancelled")]
    BillCancelled,

    #[error("a bill with this barcode is already registered")]
    DuplicateBarcode,

    #[error("caller does not own this record")]
    NotOwner,

    // -- system ----------------------------------------------------------
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl DomainError {
    /// Wrap a malformed stored value (unknown status/kind text) as a
    /// storage-layer decode failure.
    pub fn corrupt_row(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        DomainError::Storage(sqlx::Error::Decode(err.into()))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }

    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            DomainError::InsufficientBalance { .. }
                | DomainError::DailyLimitExceeded { .. }
                | DomainError::MonthlyLimitExceeded { .. }
                | DomainError::SelfTransfer
                | DomainError::InvalidTransferStatus { .. }
                | DomainError::TransferNotFound(_)
                | DomainError::AccountNotFound(_)
                | DomainError::RecipientNotFound(_)
                | DomainError::AccountNotActive { .. }
                | DomainError::BillNotFound(_)
                | DomainError::BillAlreadyPaid
                | DomainError::BillCancelled
                | DomainError::DuplicateBarcode
                | DomainError::NotOwner
        )
    }

    pub fn is_system(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }
}
