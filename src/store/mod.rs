pub mod memory;

use crate::errors::Result;
use crate::ledger::LedgerEntry;
use crate::loan::LoanAccount;
use crate::types::{EntryId, LoanId, UserId};

pub use memory::{InMemoryStore, InMemoryUserDirectory};

/// persistence for loan accounts and their ledger.
///
/// Saves carry the version the caller loaded. A store must refuse the write with
/// `LoanError::ConcurrencyConflict` when the stored version moved on, and must record
/// `loan.committed()` on success.
pub trait LoanStore: Send + Sync {
    fn insert_loan(&self, loan: &LoanAccount) -> Result<LoanAccount>;

    /// fails with `ResourceNotFound` for an unknown id
    fn load_loan(&self, id: LoanId) -> Result<LoanAccount>;

    fn loans_by_owner(&self, owner_id: UserId) -> Result<Vec<LoanAccount>>;

    /// every loan, oldest application first
    fn all_loans(&self) -> Result<Vec<LoanAccount>>;

    fn save_loan(&self, loan: &LoanAccount, expected_version: u64) -> Result<LoanAccount>;

    /// write the loan and the entry as one unit, or neither
    fn save_loan_with_entry(
        &self,
        loan: &LoanAccount,
        expected_version: u64,
        entry: &LedgerEntry,
    ) -> Result<LoanAccount>;

    /// entries in posting order
    fn load_ledger_entries_by_loan(&self, id: LoanId) -> Result<Vec<LedgerEntry>>;

    fn load_ledger_entries_by_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>>;

    /// fails with `ResourceNotFound` for an unknown id
    fn load_ledger_entry(&self, id: EntryId) -> Result<LedgerEntry>;

    fn all_ledger_entries(&self) -> Result<Vec<LedgerEntry>>;
}

/// read-only view of the external user registry
pub trait UserDirectory: Send + Sync {
    fn user_exists(&self, id: UserId) -> bool;
}
