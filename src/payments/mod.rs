pub mod amortization;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

pub use amortization::{
    add_months, monthly_payment, validate_terms, RepaymentSchedule, ScheduledInstallment,
    MAX_TENURE_MONTHS, MIN_TENURE_MONTHS,
};

/// every money movement must be strictly positive
pub fn validate_amount(amount: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(LoanError::invalid_parameters(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        assert!(validate_amount(Money::CENT).is_ok());
        assert!(validate_amount(Money::from_major(250)).is_ok());
        assert!(matches!(
            validate_amount(Money::ZERO),
            Err(LoanError::InvalidLoanParameters { .. })
        ));
        assert!(validate_amount(Money::from_major(-5)).is_err());
    }
}
