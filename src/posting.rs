use std::sync::Arc;

use tracing::{debug, info};

use crate::config::LendingConfig;
use crate::decimal::Money;
use crate::errors::{LoanError, ResourceKind, Result};
use crate::events::{EventStore, LoanEvent};
use crate::ledger::LedgerEntry;
use crate::lifecycle::LifecycleEngine;
use crate::loan::LoanAccount;
use crate::locks::LoanLocks;
use crate::payments::validate_amount;
use crate::store::{LoanStore, UserDirectory};
use crate::types::{EntryId, EntryType, LoanId, LoanStatus, UserId};

/// result of a committed posting
#[derive(Debug, Clone)]
pub struct PostingReceipt {
    pub entry: LedgerEntry,
    pub loan: LoanAccount,
    pub events: Vec<LoanEvent>,
}

/// validates money movements and records them against a loan.
///
/// Each posting loads the loan fresh under its per-loan lock, lets the lifecycle engine
/// compute the next state and then writes loan and entry together.
#[derive(Clone)]
pub struct LedgerPostingService {
    store: Arc<dyn LoanStore>,
    users: Arc<dyn UserDirectory>,
    engine: LifecycleEngine,
    locks: Arc<LoanLocks>,
    config: LendingConfig,
}

impl LedgerPostingService {
    pub fn new(
        store: Arc<dyn LoanStore>,
        users: Arc<dyn UserDirectory>,
        engine: LifecycleEngine,
        locks: Arc<LoanLocks>,
        config: LendingConfig,
    ) -> Self {
        Self {
            store,
            users,
            engine,
            locks,
            config,
        }
    }

    /// post a disbursement or repayment on behalf of `user_id`
    pub fn post(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        entry_type: EntryType,
        amount: Money,
    ) -> Result<PostingReceipt> {
        validate_amount(amount)?;
        if !self.users.user_exists(user_id) {
            return Err(LoanError::not_found(ResourceKind::User, user_id));
        }

        let receipt = self
            .locks
            .run_exclusive(loan_id, self.config.max_conflict_retries, || {
                self.post_once(loan_id, user_id, entry_type, amount)
            })?;

        info!(
            %loan_id,
            entry_id = %receipt.entry.id(),
            entry_type = %entry_type,
            %amount,
            remaining_balance = %receipt.loan.remaining_balance(),
            status = %receipt.loan.status(),
            "ledger entry posted"
        );
        if receipt.loan.status() == LoanStatus::Repaid {
            info!(%loan_id, "loan fully repaid");
        }

        Ok(receipt)
    }

    pub fn repay(&self, loan_id: LoanId, user_id: UserId, amount: Money) -> Result<PostingReceipt> {
        self.post(loan_id, user_id, EntryType::Repayment, amount)
    }

    pub fn disburse(&self, loan_id: LoanId, user_id: UserId, amount: Money) -> Result<PostingReceipt> {
        self.post(loan_id, user_id, EntryType::Disbursement, amount)
    }

    fn post_once(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        entry_type: EntryType,
        amount: Money,
    ) -> Result<PostingReceipt> {
        let loan = self.store.load_loan(loan_id)?;
        debug!(%loan_id, version = loan.version(), status = %loan.status(), "loaded loan for posting");

        let entry = LedgerEntry::pending(loan_id, user_id, entry_type, amount, self.engine.now());
        let mut events = EventStore::new();

        let next = match entry_type {
            EntryType::Repayment => self.engine.apply_repayment(&loan, amount, &mut events)?,
            EntryType::Disbursement => {
                let already_paid_out = self
                    .store
                    .load_ledger_entries_by_loan(loan_id)?
                    .iter()
                    .any(|e| e.entry_type() == EntryType::Disbursement);
                if already_paid_out {
                    return Err(LoanError::InvalidTransition {
                        operation: "second disbursement",
                        status: loan.status(),
                    });
                }
                self.engine.apply_disbursement(&loan, amount, &mut events)?
            }
        };

        let entry = entry.complete();
        let saved = self.store.save_loan_with_entry(&next, loan.version(), &entry)?;

        Ok(PostingReceipt {
            entry,
            loan: saved,
            events: events.take_events(),
        })
    }

    /// ledger of one loan in posting order
    pub fn entries_for_loan(&self, loan_id: LoanId) -> Result<Vec<LedgerEntry>> {
        self.store.load_loan(loan_id)?;
        self.store.load_ledger_entries_by_loan(loan_id)
    }

    /// every entry posted on behalf of a user
    pub fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        if !self.users.user_exists(user_id) {
            return Err(LoanError::not_found(ResourceKind::User, user_id));
        }
        self.store.load_ledger_entries_by_user(user_id)
    }

    pub fn entry(&self, entry_id: EntryId) -> Result<LedgerEntry> {
        self.store.load_ledger_entry(entry_id)
    }

    /// the whole ledger across all loans
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        self.store.all_ledger_entries()
    }
}
