use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::events::{EventStore, LoanEvent};
use crate::loan::LoanAccount;
use crate::payments::{add_months, monthly_payment, validate_amount};
use crate::types::LoanStatus;

/// loan lifecycle state machine.
///
/// Every operation takes the current account and returns the next state. On error the
/// input is untouched and nothing is emitted, so callers can simply drop the attempt.
#[derive(Clone)]
pub struct LifecycleEngine {
    time: SafeTimeProvider,
}

impl LifecycleEngine {
    pub fn new(time: SafeTimeProvider) -> Self {
        Self { time }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    /// PENDING -> APPROVED, starts the repayment schedule
    pub fn approve(&self, loan: &LoanAccount, events: &mut EventStore) -> Result<LoanAccount> {
        require(loan, "approve", LoanStatus::Approved)?;

        let now = self.now();
        let first_payment_due = add_months(loan.applied_at, 1)?;
        let payment = match loan.monthly_payment {
            Some(payment) => payment,
            None => monthly_payment(loan.principal, loan.annual_rate, loan.tenure_months)?,
        };

        let mut next = loan.clone();
        next.status = LoanStatus::Approved;
        next.approved_at = Some(now);
        next.monthly_payment = Some(payment);
        next.remaining_balance = loan.principal;
        next.next_payment_date = Some(first_payment_due);
        next.updated_at = now;

        events.emit(status_changed(loan, LoanStatus::Approved, now));
        events.emit(LoanEvent::LoanApproved {
            loan_id: loan.id,
            first_payment_due,
            timestamp: now,
        });

        Ok(next)
    }

    /// PENDING -> REJECTED
    pub fn reject(&self, loan: &LoanAccount, events: &mut EventStore) -> Result<LoanAccount> {
        require(loan, "reject", LoanStatus::Rejected)?;

        let now = self.now();
        let mut next = loan.clone();
        next.status = LoanStatus::Rejected;
        next.updated_at = now;

        events.emit(status_changed(loan, LoanStatus::Rejected, now));
        events.emit(LoanEvent::LoanRejected {
            loan_id: loan.id,
            timestamp: now,
        });

        Ok(next)
    }

    /// reduce the balance; the repayment that reaches zero flips the loan to REPAID
    pub fn apply_repayment(
        &self,
        loan: &LoanAccount,
        amount: Money,
        events: &mut EventStore,
    ) -> Result<LoanAccount> {
        if loan.status != LoanStatus::Approved {
            return Err(LoanError::InvalidTransition {
                operation: "repay",
                status: loan.status,
            });
        }
        validate_amount(amount)?;
        if amount > loan.remaining_balance {
            return Err(LoanError::OverpaymentRejected {
                remaining: loan.remaining_balance,
                requested: amount,
            });
        }

        let now = self.now();
        let new_balance = (loan.remaining_balance - amount).max(Money::ZERO);

        let mut next = loan.clone();
        next.remaining_balance = new_balance;
        next.repayment_count = loan.repayment_count + 1;
        next.updated_at = now;

        if new_balance.is_zero() {
            next.status = LoanStatus::Repaid;
            next.repaid_at = Some(now);
            next.next_payment_date = None;
        } else {
            // anchored on the application date so month-end clamping never drifts
            next.next_payment_date = Some(add_months(loan.applied_at, next.repayment_count + 1)?);
        }

        events.emit(LoanEvent::RepaymentApplied {
            loan_id: loan.id,
            amount,
            remaining_balance: new_balance,
            next_payment_date: next.next_payment_date,
            timestamp: now,
        });
        if next.status == LoanStatus::Repaid {
            events.emit(status_changed(loan, LoanStatus::Repaid, now));
            events.emit(LoanEvent::LoanRepaid {
                loan_id: loan.id,
                final_payment: amount,
                timestamp: now,
            });
        }

        Ok(next)
    }

    /// single lump-sum payout of the principal; the balance is not affected
    pub fn apply_disbursement(
        &self,
        loan: &LoanAccount,
        amount: Money,
        events: &mut EventStore,
    ) -> Result<LoanAccount> {
        if loan.status != LoanStatus::Approved {
            return Err(LoanError::InvalidTransition {
                operation: "disburse",
                status: loan.status,
            });
        }
        if loan.disbursed_at.is_some() {
            return Err(LoanError::InvalidTransition {
                operation: "second disbursement",
                status: loan.status,
            });
        }
        validate_amount(amount)?;
        if amount != loan.principal {
            return Err(LoanError::invalid_parameters(format!(
                "disbursement must pay out the full principal {}, got {}",
                loan.principal, amount
            )));
        }

        let now = self.now();
        let mut next = loan.clone();
        next.disbursed_at = Some(now);
        next.updated_at = now;

        events.emit(LoanEvent::PrincipalDisbursed {
            loan_id: loan.id,
            amount,
            timestamp: now,
        });

        Ok(next)
    }
}

fn require(loan: &LoanAccount, operation: &'static str, target: LoanStatus) -> Result<()> {
    if !loan.status.can_transition_to(target) {
        return Err(LoanError::InvalidTransition {
            operation,
            status: loan.status,
        });
    }
    Ok(())
}

fn status_changed(loan: &LoanAccount, new_status: LoanStatus, timestamp: DateTime<Utc>) -> LoanEvent {
    LoanEvent::StatusChanged {
        loan_id: loan.id,
        old_status: loan.status,
        new_status,
        timestamp,
    }
}
