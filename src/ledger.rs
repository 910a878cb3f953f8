use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{EntryId, EntryStatus, EntryType, LoanId, UserId};

/// one money movement against a loan.
///
/// Entries are only created by the posting service. The status moves from
/// `Pending` to `Completed` once, when the posting commits, and nothing changes after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: EntryId,
    loan_id: LoanId,
    user_id: UserId,
    entry_type: EntryType,
    amount: Money,
    status: EntryStatus,
    transaction_date: DateTime<Utc>,
}

impl LedgerEntry {
    pub(crate) fn pending(
        loan_id: LoanId,
        user_id: UserId,
        entry_type: EntryType,
        amount: Money,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            user_id,
            entry_type,
            amount,
            status: EntryStatus::Pending,
            transaction_date,
        }
    }

    /// finalize a pending entry
    pub(crate) fn complete(self) -> Self {
        Self {
            status: EntryStatus::Completed,
            ..self
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn transaction_date(&self) -> DateTime<Utc> {
        self.transaction_date
    }

    pub fn is_repayment(&self) -> bool {
        self.entry_type == EntryType::Repayment
    }
}
