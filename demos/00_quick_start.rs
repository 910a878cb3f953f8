/// quick start - minimal example to get started
use std::sync::Arc;

use loan_ledger_rs::{
    InMemoryStore, InMemoryUserDirectory, LendingConfig, LoanService, LoanView, Money,
    SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let borrower = Uuid::new_v4();
    let service = LoanService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryUserDirectory::with_users([borrower])),
        SafeTimeProvider::new(TimeSource::System),
        LendingConfig::default(),
    );
    let posting = service.posting_service();

    // apply for a 1,200 loan over 12 months
    let loan = service.apply(borrower, Money::from_major(1200), 12, "school fees")?.loan;

    // approve and pay out
    service.approve(loan.id())?;
    posting.disburse(loan.id(), borrower, loan.principal())?;

    // make the first installment
    if let Some(payment) = loan.monthly_payment() {
        posting.repay(loan.id(), borrower, payment)?;
    }

    // print current state
    println!("{}", LoanView::from_loan(&service.get_loan(loan.id())?)?.to_json_pretty()?);

    Ok(())
}
