/// serialization support for loan accounts
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::loan::LoanAccount;
use crate::types::{LoanId, LoanStatus, UserId};

/// serializable view of a loan account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub owner_id: UserId,
    pub status: LoanStatus,
    pub purpose: String,
    pub applied_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub disbursed_at: Option<DateTime<Utc>>,
    pub repaid_at: Option<DateTime<Utc>>,
    pub terms: TermsView,
    pub repayment: RepaymentView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsView {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
    pub monthly_payment: Option<Money>,
    pub total_interest: Money,
    pub total_payable: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentView {
    pub remaining_balance: Money,
    pub total_repaid: Money,
    pub installments_paid: u32,
    pub next_payment_date: Option<DateTime<Utc>>,
    pub percent_repaid: Decimal,
}

impl LoanView {
    pub fn from_loan(loan: &LoanAccount) -> Result<Self> {
        let schedule = loan.schedule()?;
        let total_repaid = loan.total_repaid();

        let percent_repaid = if loan.principal().is_zero() {
            Decimal::ZERO
        } else {
            (total_repaid.as_decimal() / loan.principal().as_decimal() * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };

        Ok(LoanView {
            id: loan.id(),
            owner_id: loan.owner_id(),
            status: loan.status(),
            purpose: loan.purpose().to_string(),
            applied_at: loan.applied_at(),
            approved_at: loan.approved_at(),
            disbursed_at: loan.disbursed_at(),
            repaid_at: loan.repaid_at(),
            terms: TermsView {
                principal: loan.principal(),
                annual_rate: loan.annual_rate(),
                tenure_months: loan.tenure_months(),
                monthly_payment: loan.monthly_payment(),
                total_interest: schedule.total_interest,
                total_payable: schedule.total_payable,
            },
            repayment: RepaymentView {
                remaining_balance: loan.remaining_balance(),
                total_repaid,
                installments_paid: loan.repayment_count(),
                next_payment_date: loan.next_payment_date(),
                percent_repaid,
            },
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoanError::Serialization {
            message: format!("cannot serialize loan {}: {}", self.id, e),
        })
    }
}
