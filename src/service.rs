use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info};

use crate::config::LendingConfig;
use crate::decimal::Money;
use crate::errors::{LoanError, ResourceKind, Result};
use crate::events::{EventStore, LoanEvent};
use crate::lifecycle::LifecycleEngine;
use crate::loan::{LoanAccount, LoanApplication};
use crate::locks::LoanLocks;
use crate::posting::LedgerPostingService;
use crate::serialization::LoanView;
use crate::store::{LoanStore, UserDirectory};
use crate::types::{LoanId, LoanStatus, UserId};

/// committed loan state plus the events that produced it
#[derive(Debug, Clone)]
pub struct LoanOutcome {
    pub loan: LoanAccount,
    pub events: Vec<LoanEvent>,
}

/// application, decision and query entry points for loan accounts
#[derive(Clone)]
pub struct LoanService {
    store: Arc<dyn LoanStore>,
    users: Arc<dyn UserDirectory>,
    engine: LifecycleEngine,
    locks: Arc<LoanLocks>,
    config: LendingConfig,
}

impl LoanService {
    pub fn new(
        store: Arc<dyn LoanStore>,
        users: Arc<dyn UserDirectory>,
        time: SafeTimeProvider,
        config: LendingConfig,
    ) -> Self {
        Self {
            store,
            users,
            engine: LifecycleEngine::new(time),
            locks: Arc::new(LoanLocks::new()),
            config,
        }
    }

    /// posting service sharing this service's store and per-loan locks
    pub fn posting_service(&self) -> LedgerPostingService {
        LedgerPostingService::new(
            self.store.clone(),
            self.users.clone(),
            self.engine.clone(),
            self.locks.clone(),
            self.config.clone(),
        )
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    /// open a PENDING loan at the policy default rate
    pub fn apply(
        &self,
        owner_id: UserId,
        principal: Money,
        tenure_months: u32,
        purpose: impl Into<String>,
    ) -> Result<LoanOutcome> {
        if !self.users.user_exists(owner_id) {
            return Err(LoanError::not_found(ResourceKind::User, owner_id));
        }

        let now = self.engine.now();
        let application = LoanApplication::new(owner_id, principal, tenure_months, purpose);
        let loan = LoanAccount::open(application, self.config.default_annual_rate, now)?;
        let loan = self.store.insert_loan(&loan)?;

        let mut events = EventStore::new();
        events.emit(LoanEvent::LoanApplied {
            loan_id: loan.id(),
            owner_id,
            principal,
            monthly_payment: loan.monthly_payment().unwrap_or(Money::ZERO),
            timestamp: now,
        });

        info!(
            loan_id = %loan.id(),
            %owner_id,
            %principal,
            tenure_months,
            annual_rate = %loan.annual_rate(),
            "loan application received"
        );

        Ok(LoanOutcome {
            loan,
            events: events.take_events(),
        })
    }

    pub fn approve(&self, loan_id: LoanId) -> Result<LoanOutcome> {
        let outcome = self.transition(loan_id, |engine, loan, events| engine.approve(loan, events))?;
        info!(%loan_id, next_payment_date = ?outcome.loan.next_payment_date(), "loan approved");
        Ok(outcome)
    }

    pub fn reject(&self, loan_id: LoanId) -> Result<LoanOutcome> {
        let outcome = self.transition(loan_id, |engine, loan, events| engine.reject(loan, events))?;
        info!(%loan_id, "loan rejected");
        Ok(outcome)
    }

    /// administrative status change from a raw status string.
    ///
    /// Only the decisions on a PENDING loan can be requested this way; REPAID is reached
    /// through repayments alone.
    pub fn update_status(&self, loan_id: LoanId, status: &str) -> Result<LoanOutcome> {
        let target: LoanStatus = status.parse()?;
        match target {
            LoanStatus::Approved => self.approve(loan_id),
            LoanStatus::Rejected => self.reject(loan_id),
            LoanStatus::Pending | LoanStatus::Repaid => {
                let loan = self.store.load_loan(loan_id)?;
                Err(LoanError::InvalidTransition {
                    operation: "set status",
                    status: loan.status(),
                })
            }
        }
    }

    pub fn get_loan(&self, loan_id: LoanId) -> Result<LoanAccount> {
        self.store.load_loan(loan_id)
    }

    pub fn loans_for_user(&self, owner_id: UserId) -> Result<Vec<LoanAccount>> {
        if !self.users.user_exists(owner_id) {
            return Err(LoanError::not_found(ResourceKind::User, owner_id));
        }
        self.store.loans_by_owner(owner_id)
    }

    /// every loan, oldest application first
    pub fn all_loans(&self) -> Result<Vec<LoanAccount>> {
        self.store.all_loans()
    }

    /// loans in one status, e.g. PENDING for the review queue
    pub fn loans_with_status(&self, status: LoanStatus) -> Result<Vec<LoanAccount>> {
        let mut loans = self.store.all_loans()?;
        loans.retain(|loan| loan.status() == status);
        Ok(loans)
    }

    pub fn loan_view(&self, loan_id: LoanId) -> Result<LoanView> {
        LoanView::from_loan(&self.store.load_loan(loan_id)?)
    }

    fn transition(
        &self,
        loan_id: LoanId,
        step: impl Fn(&LifecycleEngine, &LoanAccount, &mut EventStore) -> Result<LoanAccount>,
    ) -> Result<LoanOutcome> {
        self.locks
            .run_exclusive(loan_id, self.config.max_conflict_retries, || {
                let loan = self.store.load_loan(loan_id)?;
                debug!(%loan_id, version = loan.version(), status = %loan.status(), "loaded loan");

                let mut events = EventStore::new();
                let next = step(&self.engine, &loan, &mut events)?;
                let saved = self.store.save_loan(&next, loan.version())?;
                Ok(LoanOutcome {
                    loan: saved,
                    events: events.take_events(),
                })
            })
    }
}
