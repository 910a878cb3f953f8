use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

pub const MIN_TENURE_MONTHS: u32 = 1;
pub const MAX_TENURE_MONTHS: u32 = 60;

/// check principal, rate and tenure before any arithmetic
pub fn validate_terms(principal: Money, annual_rate: Rate, tenure_months: u32) -> Result<()> {
    if !principal.is_positive() {
        return Err(LoanError::invalid_parameters(format!(
            "principal must be positive, got {}",
            principal
        )));
    }
    if !(MIN_TENURE_MONTHS..=MAX_TENURE_MONTHS).contains(&tenure_months) {
        return Err(LoanError::invalid_parameters(format!(
            "tenure must be between {} and {} months, got {}",
            MIN_TENURE_MONTHS, MAX_TENURE_MONTHS, tenure_months
        )));
    }
    if annual_rate.is_negative() {
        return Err(LoanError::invalid_parameters(format!(
            "interest rate must not be negative, got {}",
            annual_rate
        )));
    }
    Ok(())
}

/// fixed monthly payment that retires `principal` in `tenure_months` equal installments.
///
/// Annuity formula `P * r * (1 + r)^n / ((1 + r)^n - 1)` with `r` the monthly rate,
/// or `P / n` when the rate is zero. The result is rounded half-up to the cent.
pub fn monthly_payment(principal: Money, annual_rate: Rate, tenure_months: u32) -> Result<Money> {
    validate_terms(principal, annual_rate, tenure_months)?;

    let r = annual_rate.monthly_rate().as_decimal();
    let p = principal.as_decimal();
    let n = Decimal::from(tenure_months);

    if r.is_zero() {
        return Ok(Money::from_decimal(p / n));
    }

    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..tenure_months {
        compound = compound.checked_mul(base).ok_or_else(|| out_of_range(principal, annual_rate))?;
    }

    let denominator = compound - Decimal::ONE;
    p.checked_mul(r)
        .and_then(|x| x.checked_mul(compound))
        .and_then(|numerator| numerator.checked_div(denominator))
        .map(Money::from_decimal)
        .ok_or_else(|| out_of_range(principal, annual_rate))
}

fn out_of_range(principal: Money, annual_rate: Rate) -> LoanError {
    LoanError::invalid_parameters(format!(
        "payment for principal {} at {} is out of range",
        principal, annual_rate
    ))
}

/// add whole calendar months, clamping to the last day of shorter months
pub fn add_months(date: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LoanError::InvalidDate {
            message: format!("{} plus {} months is out of range", date, months),
        })
}

/// one installment in a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub number: u32,
    pub due_date: DateTime<Utc>,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub closing_balance: Money,
}

/// month-by-month breakdown of a fixed-payment loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
    pub monthly_payment: Money,
    pub installments: Vec<ScheduledInstallment>,
    pub total_interest: Money,
    pub total_payable: Money,
}

impl RepaymentSchedule {
    /// generate the schedule, first installment due one month after `start`
    pub fn generate(
        principal: Money,
        annual_rate: Rate,
        tenure_months: u32,
        start: DateTime<Utc>,
    ) -> Result<Self> {
        let payment = monthly_payment(principal, annual_rate, tenure_months)?;
        let monthly_rate = annual_rate.monthly_rate().as_decimal();

        let mut installments = Vec::with_capacity(tenure_months as usize);
        let mut balance = principal;

        for number in 1..=tenure_months {
            let interest_portion = balance
                .as_decimal()
                .checked_mul(monthly_rate)
                .map(Money::from_decimal)
                .ok_or_else(|| out_of_range(principal, annual_rate))?;

            // last installment absorbs the accumulated rounding
            let principal_portion = if number == tenure_months {
                balance
            } else {
                (payment - interest_portion).min(balance)
            };
            let closing_balance = balance - principal_portion;

            installments.push(ScheduledInstallment {
                number,
                due_date: add_months(start, number)?,
                opening_balance: balance,
                payment: principal_portion + interest_portion,
                interest_portion,
                principal_portion,
                closing_balance,
            });

            balance = closing_balance;
        }

        let total_interest = installments
            .iter()
            .map(|i| i.interest_portion)
            .fold(Money::ZERO, |acc, x| acc + x);

        let total_payable = installments
            .iter()
            .map(|i| i.payment)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            principal,
            annual_rate,
            tenure_months,
            monthly_payment: payment,
            installments,
            total_interest,
            total_payable,
        })
    }

    pub fn installment(&self, number: u32) -> Option<&ScheduledInstallment> {
        number
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }
}
