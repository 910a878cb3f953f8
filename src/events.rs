use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus, UserId};

/// all events that can be emitted by the lifecycle engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoanEvent {
    LoanApplied {
        loan_id: LoanId,
        owner_id: UserId,
        principal: Money,
        monthly_payment: Money,
        timestamp: DateTime<Utc>,
    },
    LoanApproved {
        loan_id: LoanId,
        first_payment_due: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    LoanRejected {
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },
    PrincipalDisbursed {
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    RepaymentApplied {
        loan_id: LoanId,
        amount: Money,
        remaining_balance: Money,
        next_payment_date: Option<DateTime<Utc>>,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },
}

impl LoanEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            LoanEvent::LoanApplied { loan_id, .. }
            | LoanEvent::LoanApproved { loan_id, .. }
            | LoanEvent::LoanRejected { loan_id, .. }
            | LoanEvent::PrincipalDisbursed { loan_id, .. }
            | LoanEvent::RepaymentApplied { loan_id, .. }
            | LoanEvent::LoanRepaid { loan_id, .. }
            | LoanEvent::StatusChanged { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<LoanEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: LoanEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<LoanEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[LoanEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
