use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use crate::errors::{LoanError, ResourceKind, Result};
use crate::ledger::LedgerEntry;
use crate::loan::LoanAccount;
use crate::store::{LoanStore, UserDirectory};
use crate::types::{EntryId, LoanId, UserId};

#[derive(Debug, Default)]
struct Tables {
    loans: HashMap<LoanId, LoanAccount>,
    entries: Vec<LedgerEntry>,
}

impl Tables {
    fn check_version(&self, loan: &LoanAccount, expected_version: u64) -> Result<()> {
        let stored = self
            .loans
            .get(&loan.id())
            .ok_or_else(|| LoanError::not_found(ResourceKind::Loan, loan.id()))?;

        if stored.version() != expected_version {
            return Err(LoanError::ConcurrencyConflict {
                loan_id: loan.id(),
                expected: expected_version,
                found: stored.version(),
            });
        }
        Ok(())
    }
}

/// in-memory loan store, one lock over both tables so a posting commits atomically
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

fn poisoned<T>(_: PoisonError<T>) -> LoanError {
    LoanError::StoreUnavailable {
        message: "store lock poisoned".to_string(),
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loan_count(&self) -> Result<usize> {
        Ok(self.tables.read().map_err(poisoned)?.loans.len())
    }

    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.tables.read().map_err(poisoned)?.entries.len())
    }
}

impl LoanStore for InMemoryStore {
    fn insert_loan(&self, loan: &LoanAccount) -> Result<LoanAccount> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if tables.loans.contains_key(&loan.id()) {
            return Err(LoanError::ConcurrencyConflict {
                loan_id: loan.id(),
                expected: loan.version(),
                found: tables.loans[&loan.id()].version(),
            });
        }
        let saved = loan.committed();
        tables.loans.insert(saved.id(), saved.clone());
        Ok(saved)
    }

    fn load_loan(&self, id: LoanId) -> Result<LoanAccount> {
        let tables = self.tables.read().map_err(poisoned)?;
        tables
            .loans
            .get(&id)
            .cloned()
            .ok_or_else(|| LoanError::not_found(ResourceKind::Loan, id))
    }

    fn loans_by_owner(&self, owner_id: UserId) -> Result<Vec<LoanAccount>> {
        let tables = self.tables.read().map_err(poisoned)?;
        let mut loans: Vec<LoanAccount> = tables
            .loans
            .values()
            .filter(|loan| loan.owner_id() == owner_id)
            .cloned()
            .collect();
        loans.sort_by_key(|loan| loan.applied_at());
        Ok(loans)
    }

    fn all_loans(&self) -> Result<Vec<LoanAccount>> {
        let tables = self.tables.read().map_err(poisoned)?;
        let mut loans: Vec<LoanAccount> = tables.loans.values().cloned().collect();
        loans.sort_by_key(|loan| loan.applied_at());
        Ok(loans)
    }

    fn save_loan(&self, loan: &LoanAccount, expected_version: u64) -> Result<LoanAccount> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.check_version(loan, expected_version)?;

        let saved = loan.committed();
        tables.loans.insert(saved.id(), saved.clone());
        Ok(saved)
    }

    fn save_loan_with_entry(
        &self,
        loan: &LoanAccount,
        expected_version: u64,
        entry: &LedgerEntry,
    ) -> Result<LoanAccount> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.check_version(loan, expected_version)?;
        if entry.loan_id() != loan.id() {
            return Err(LoanError::invalid_parameters(format!(
                "entry {} belongs to loan {}, not {}",
                entry.id(),
                entry.loan_id(),
                loan.id()
            )));
        }

        // both writes happen under the same guard with nothing fallible in between
        let saved = loan.committed();
        tables.loans.insert(saved.id(), saved.clone());
        tables.entries.push(entry.clone());
        Ok(saved)
    }

    fn load_ledger_entries_by_loan(&self, id: LoanId) -> Result<Vec<LedgerEntry>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .entries
            .iter()
            .filter(|entry| entry.loan_id() == id)
            .cloned()
            .collect())
    }

    fn load_ledger_entries_by_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .entries
            .iter()
            .filter(|entry| entry.user_id() == user_id)
            .cloned()
            .collect())
    }

    fn load_ledger_entry(&self, id: EntryId) -> Result<LedgerEntry> {
        let tables = self.tables.read().map_err(poisoned)?;
        tables
            .entries
            .iter()
            .find(|entry| entry.id() == id)
            .cloned()
            .ok_or_else(|| LoanError::not_found(ResourceKind::LedgerEntry, id))
    }

    fn all_ledger_entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.tables.read().map_err(poisoned)?.entries.clone())
    }
}

/// user directory backed by a set of known ids
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashSet<UserId>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
        }
    }

    pub fn register(&self, id: UserId) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn user_exists(&self, id: UserId) -> bool {
        self.users
            .read()
            .map(|users| users.contains(&id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::loan::LoanApplication;
    use crate::types::EntryType;
    use chrono::Utc;
    use uuid::Uuid;

    fn new_loan(owner: UserId) -> LoanAccount {
        let application = LoanApplication::new(owner, Money::from_major(500), 5, "rent");
        LoanAccount::open(application, Rate::ZERO, Utc::now()).unwrap()
    }

    #[test]
    fn test_insert_and_load() {
        let store = InMemoryStore::new();
        let loan = new_loan(Uuid::new_v4());
        let saved = store.insert_loan(&loan).unwrap();
        assert_eq!(saved.version(), 1);
        assert_eq!(store.load_loan(loan.id()).unwrap(), saved);

        let missing = Uuid::new_v4();
        assert_eq!(
            store.load_loan(missing).unwrap_err(),
            LoanError::ResourceNotFound {
                kind: ResourceKind::Loan,
                id: missing
            }
        );
    }

    #[test]
    fn test_stale_version_conflicts() {
        let store = InMemoryStore::new();
        let saved = store.insert_loan(&new_loan(Uuid::new_v4())).unwrap();

        let first = store.save_loan(&saved, saved.version()).unwrap();
        assert_eq!(first.version(), 2);

        let err = store.save_loan(&saved, saved.version()).unwrap_err();
        assert_eq!(
            err,
            LoanError::ConcurrencyConflict {
                loan_id: saved.id(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_posting_commit_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let saved = store.insert_loan(&new_loan(user)).unwrap();
        let entry = LedgerEntry::pending(saved.id(), user, EntryType::Repayment, Money::from_major(100), Utc::now())
            .complete();

        // stale version: neither loan nor entry is written
        assert!(store.save_loan_with_entry(&saved, 0, &entry).is_err());
        assert_eq!(store.entry_count().unwrap(), 0);
        assert_eq!(store.load_loan(saved.id()).unwrap().version(), 1);

        store.save_loan_with_entry(&saved, 1, &entry).unwrap();
        assert_eq!(store.entry_count().unwrap(), 1);
        assert_eq!(store.load_ledger_entries_by_loan(saved.id()).unwrap(), vec![entry.clone()]);
        assert_eq!(store.load_ledger_entries_by_user(user).unwrap().len(), 1);
        assert!(store.load_ledger_entries_by_user(Uuid::new_v4()).unwrap().is_empty());
        assert_eq!(store.load_ledger_entry(entry.id()).unwrap(), entry);
        assert_eq!(store.all_ledger_entries().unwrap(), vec![entry]);
    }

    #[test]
    fn test_unknown_entry() {
        let store = InMemoryStore::new();
        let missing = Uuid::new_v4();
        assert_eq!(
            store.load_ledger_entry(missing).unwrap_err(),
            LoanError::ResourceNotFound {
                kind: ResourceKind::LedgerEntry,
                id: missing
            }
        );
    }

    #[test]
    fn test_loans_by_owner() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        store.insert_loan(&new_loan(owner)).unwrap();
        store.insert_loan(&new_loan(owner)).unwrap();
        store.insert_loan(&new_loan(Uuid::new_v4())).unwrap();

        assert_eq!(store.loans_by_owner(owner).unwrap().len(), 2);
        assert_eq!(store.loan_count().unwrap(), 3);
        assert_eq!(store.all_loans().unwrap().len(), 3);
    }

    #[test]
    fn test_user_directory() {
        let known = Uuid::new_v4();
        let directory = InMemoryUserDirectory::with_users([known]);
        assert!(directory.user_exists(known));

        let late = Uuid::new_v4();
        assert!(!directory.user_exists(late));
        directory.register(late);
        assert!(directory.user_exists(late));
    }
}
