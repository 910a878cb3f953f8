pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod loan;
pub mod locks;
pub mod payments;
pub mod posting;
pub mod serialization;
pub mod service;
pub mod store;
pub mod types;

// re-export key types
pub use config::LendingConfig;
pub use decimal::{Money, Rate};
pub use errors::{LoanError, ResourceKind, Result};
pub use events::{EventStore, LoanEvent};
pub use ledger::LedgerEntry;
pub use lifecycle::LifecycleEngine;
pub use loan::{LoanAccount, LoanApplication};
pub use locks::LoanLocks;
pub use payments::{monthly_payment, RepaymentSchedule, ScheduledInstallment};
pub use posting::{LedgerPostingService, PostingReceipt};
pub use serialization::LoanView;
pub use service::{LoanOutcome, LoanService};
pub use store::{InMemoryStore, InMemoryUserDirectory, LoanStore, UserDirectory};
pub use types::{EntryId, EntryStatus, EntryType, LoanId, LoanStatus, UserId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
