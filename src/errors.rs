use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::LoanStatus;

/// kind of record a lookup failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Loan,
    User,
    LedgerEntry,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Loan => write!(f, "loan"),
            ResourceKind::User => write!(f, "user"),
            ResourceKind::LedgerEntry => write!(f, "ledger entry"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("{kind} not found: {id}")]
    ResourceNotFound {
        kind: ResourceKind,
        id: Uuid,
    },

    #[error("invalid loan parameters: {message}")]
    InvalidLoanParameters {
        message: String,
    },

    #[error("invalid transition: {operation} not allowed in status {status}")]
    InvalidTransition {
        operation: &'static str,
        status: LoanStatus,
    },

    #[error("repayment of {requested} exceeds remaining balance {remaining}")]
    OverpaymentRejected {
        remaining: Money,
        requested: Money,
    },

    #[error("concurrent update on loan {loan_id}: expected version {expected}, found {found}")]
    ConcurrencyConflict {
        loan_id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("unknown loan status: {value:?}")]
    UnknownStatus {
        value: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("store unavailable: {message}")]
    StoreUnavailable {
        message: String,
    },

    #[error("serialization failed: {message}")]
    Serialization {
        message: String,
    },
}

impl LoanError {
    pub(crate) fn invalid_parameters(message: impl Into<String>) -> Self {
        LoanError::InvalidLoanParameters {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(kind: ResourceKind, id: Uuid) -> Self {
        LoanError::ResourceNotFound { kind, id }
    }

    /// only lost-update conflicts are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoanError::ConcurrencyConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
