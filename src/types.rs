use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LoanError;

/// unique identifier for a loan account
pub type LoanId = Uuid;

/// unique identifier for a borrower, owned by the user directory
pub type UserId = Uuid;

/// unique identifier for a ledger entry
pub type EntryId = Uuid;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// application received, awaiting a decision
    Pending,
    /// approved and being repaid
    Approved,
    /// application declined, terminal
    Rejected,
    /// fully repaid, terminal
    Repaid,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Repaid => "REPAID",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::Repaid)
    }

    /// the edges of the lifecycle graph
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Approved)
                | (LoanStatus::Pending, LoanStatus::Rejected)
                | (LoanStatus::Approved, LoanStatus::Repaid)
        )
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = LoanError;

    /// exact match on the enumerated set, anything else is a caller error
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(LoanStatus::Pending),
            "APPROVED" => Ok(LoanStatus::Approved),
            "REJECTED" => Ok(LoanStatus::Rejected),
            "REPAID" => Ok(LoanStatus::Repaid),
            _ => Err(LoanError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// kind of money movement recorded against a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// principal paid out to the borrower
    Disbursement,
    /// borrower paying the loan down
    Repayment,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Disbursement => f.write_str("DISBURSEMENT"),
            EntryType::Repayment => f.write_str("REPAYMENT"),
        }
    }
}

impl FromStr for EntryType {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISBURSEMENT" => Ok(EntryType::Disbursement),
            "REPAYMENT" => Ok(EntryType::Repayment),
            _ => Err(LoanError::invalid_parameters(format!(
                "unknown transaction type: {:?}",
                s
            ))),
        }
    }
}

/// ledger entry workflow tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Pending,
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_exact() {
        assert_eq!("APPROVED".parse::<LoanStatus>().unwrap(), LoanStatus::Approved);
        assert_eq!("REPAID".parse::<LoanStatus>().unwrap(), LoanStatus::Repaid);

        for bad in ["approved", "ACTIVE", "PAID_OFF", "", " PENDING"] {
            assert!(matches!(
                bad.parse::<LoanStatus>(),
                Err(LoanError::UnknownStatus { .. })
            ));
        }
    }

    #[test]
    fn test_transition_graph() {
        use LoanStatus::*;
        let all = [Pending, Approved, Rejected, Repaid];
        let allowed = [(Pending, Approved), (Pending, Rejected), (Approved, Repaid)];

        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
        assert!(Rejected.is_terminal());
        assert!(Repaid.is_terminal());
        assert!(!Approved.is_terminal());
    }

    #[test]
    fn test_status_serializes_as_upper_case() {
        let json = serde_json::to_string(&LoanStatus::Repaid).unwrap();
        assert_eq!(json, "\"REPAID\"");
        let json = serde_json::to_string(&EntryType::Disbursement).unwrap();
        assert_eq!(json, "\"DISBURSEMENT\"");
    }
}
