use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::payments::{monthly_payment, RepaymentSchedule};
use crate::types::{LoanId, LoanStatus, UserId};

/// borrower's request for a new loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub owner_id: UserId,
    pub principal: Money,
    pub tenure_months: u32,
    pub purpose: String,
}

impl LoanApplication {
    pub fn new(owner_id: UserId, principal: Money, tenure_months: u32, purpose: impl Into<String>) -> Self {
        Self {
            owner_id,
            principal,
            tenure_months,
            purpose: purpose.into(),
        }
    }
}

/// loan account aggregate.
///
/// Fields are only writable inside the crate: the lifecycle engine is the one place that
/// changes status, balance and schedule dates. The owner is referenced by id, never embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAccount {
    pub(crate) id: LoanId,
    pub(crate) owner_id: UserId,
    pub(crate) principal: Money,
    pub(crate) tenure_months: u32,
    pub(crate) annual_rate: Rate,
    pub(crate) status: LoanStatus,
    #[serde(default)]
    pub(crate) monthly_payment: Option<Money>,
    pub(crate) remaining_balance: Money,
    pub(crate) applied_at: DateTime<Utc>,
    pub(crate) approved_at: Option<DateTime<Utc>>,
    pub(crate) repaid_at: Option<DateTime<Utc>>,
    pub(crate) next_payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) disbursed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) repayment_count: u32,
    pub(crate) purpose: String,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) version: u64,
}

impl LoanAccount {
    /// open a pending account from an application at the policy rate
    pub fn open(application: LoanApplication, annual_rate: Rate, now: DateTime<Utc>) -> Result<Self> {
        let payment = monthly_payment(application.principal, annual_rate, application.tenure_months)?;

        Ok(Self {
            id: Uuid::new_v4(),
            owner_id: application.owner_id,
            principal: application.principal,
            tenure_months: application.tenure_months,
            annual_rate,
            status: LoanStatus::Pending,
            monthly_payment: Some(payment),
            remaining_balance: application.principal,
            applied_at: now,
            approved_at: None,
            repaid_at: None,
            next_payment_date: None,
            disbursed_at: None,
            repayment_count: 0,
            purpose: application.purpose,
            updated_at: now,
            version: 0,
        })
    }

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn tenure_months(&self) -> u32 {
        self.tenure_months
    }

    pub fn annual_rate(&self) -> Rate {
        self.annual_rate
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn monthly_payment(&self) -> Option<Money> {
        self.monthly_payment
    }

    pub fn remaining_balance(&self) -> Money {
        self.remaining_balance
    }

    pub fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn repaid_at(&self) -> Option<DateTime<Utc>> {
        self.repaid_at
    }

    pub fn next_payment_date(&self) -> Option<DateTime<Utc>> {
        self.next_payment_date
    }

    pub fn disbursed_at(&self) -> Option<DateTime<Utc>> {
        self.disbursed_at
    }

    pub fn repayment_count(&self) -> u32 {
        self.repayment_count
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// optimistic concurrency version, bumped by the store on every save
    pub fn version(&self) -> u64 {
        self.version
    }

    /// copy carrying the version a store records after a successful save
    pub fn committed(&self) -> Self {
        Self {
            version: self.version + 1,
            ..self.clone()
        }
    }

    /// principal repaid so far
    pub fn total_repaid(&self) -> Money {
        self.principal - self.remaining_balance
    }

    pub fn is_disbursed(&self) -> bool {
        self.disbursed_at.is_some()
    }

    /// full repayment schedule, first installment one month after application
    pub fn schedule(&self) -> Result<RepaymentSchedule> {
        RepaymentSchedule::generate(self.principal, self.annual_rate, self.tenure_months, self.applied_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoanError;
    use chrono::TimeZone;

    fn applied() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_open_pending_account() {
        let owner = Uuid::new_v4();
        let application = LoanApplication::new(owner, Money::from_major(1200), 12, "school fees");
        let loan = LoanAccount::open(application, Rate::from_percentage(15), applied()).unwrap();

        assert_eq!(loan.status(), LoanStatus::Pending);
        assert_eq!(loan.owner_id(), owner);
        assert_eq!(loan.remaining_balance(), Money::from_major(1200));
        assert_eq!(loan.monthly_payment(), Some(Money::from_minor(10_831)));
        assert_eq!(loan.applied_at(), applied());
        assert!(loan.approved_at().is_none());
        assert!(loan.next_payment_date().is_none());
        assert_eq!(loan.version(), 0);
        assert_eq!(loan.purpose(), "school fees");
        assert_eq!(loan.total_repaid(), Money::ZERO);
    }

    #[test]
    fn test_open_rejects_bad_terms() {
        let application = LoanApplication::new(Uuid::new_v4(), Money::from_major(1200), 72, "car");
        let err = LoanAccount::open(application, Rate::from_percentage(15), applied()).unwrap_err();
        assert!(matches!(err, LoanError::InvalidLoanParameters { .. }));
    }

    #[test]
    fn test_committed_bumps_version_only() {
        let application = LoanApplication::new(Uuid::new_v4(), Money::from_major(500), 5, "rent");
        let loan = LoanAccount::open(application, Rate::ZERO, applied()).unwrap();
        let saved = loan.committed();
        assert_eq!(saved.version(), 1);
        assert_eq!(saved.committed().version(), 2);
        assert_eq!(saved.remaining_balance(), loan.remaining_balance());
    }

    #[test]
    fn test_json_round_trip_keeps_fields() {
        let application = LoanApplication::new(Uuid::new_v4(), Money::from_major(500), 5, "rent");
        let loan = LoanAccount::open(application, Rate::ZERO, applied()).unwrap();
        let json = serde_json::to_string(&loan).unwrap();
        assert!(json.contains("\"status\":\"PENDING\""));
        let back: LoanAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loan);
    }

    #[test]
    fn test_schedule_starts_after_application() {
        let application = LoanApplication::new(Uuid::new_v4(), Money::from_major(500), 5, "rent");
        let loan = LoanAccount::open(application, Rate::ZERO, applied()).unwrap();
        let schedule = loan.schedule().unwrap();
        assert_eq!(schedule.installments.len(), 5);
        assert_eq!(
            schedule.installments[0].due_date,
            Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
        );
        assert_eq!(schedule.total_interest, Money::ZERO);
    }
}
