/// lifecycle - loan from application to full repayment
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use loan_ledger_rs::{
    InMemoryStore, InMemoryUserDirectory, LendingConfig, LoanService, Money, SafeTimeProvider,
    TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let borrower = Uuid::new_v4();
    let service = LoanService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryUserDirectory::with_users([borrower])),
        time.clone(),
        LendingConfig::default(),
    );
    let posting = service.posting_service();

    // 1. application
    println!("1. application");
    println!("--------------");
    let loan = service.apply(borrower, Money::from_major(1200), 12, "shop inventory")?.loan;
    println!("  date: {}", time.now().format("%Y-%m-%d"));
    println!("  principal: {}", loan.principal());
    println!("  rate: {}", loan.annual_rate());
    println!("  status: {}", loan.status());

    let schedule = loan.schedule()?;
    println!("  monthly payment: {}", schedule.monthly_payment);
    println!("  total interest: {}", schedule.total_interest);
    println!("  total payable: {}", schedule.total_payable);

    // 2. approval and disbursement
    println!("\n2. approval");
    println!("-----------");
    controller.advance(Duration::days(2));
    let approved = service.update_status(loan.id(), "APPROVED")?.loan;
    println!("  ✓ approved, first payment due {:?}", approved.next_payment_date());
    posting.disburse(loan.id(), borrower, approved.principal())?;
    println!("  ✓ disbursed {}", approved.principal());

    // 3. repayments
    println!("\n3. repayments");
    println!("-------------");
    let mut current = approved;
    while let Some(due) = current.next_payment_date() {
        controller.advance(Duration::days(30));
        let payment = current
            .monthly_payment()
            .unwrap_or(current.remaining_balance())
            .min(current.remaining_balance());
        let receipt = posting.repay(loan.id(), borrower, payment)?;
        current = receipt.loan;
        println!(
            "  due {}: paid {}, remaining {}",
            due.format("%Y-%m-%d"),
            payment,
            current.remaining_balance()
        );
    }

    // 4. summary
    println!("\n4. summary");
    println!("----------");
    let view = service.loan_view(loan.id())?;
    println!("  status: {}", view.status);
    println!("  installments paid: {}", view.repayment.installments_paid);
    println!("  repaid at: {:?}", view.repaid_at);
    println!("  ledger entries: {}", posting.entries_for_loan(loan.id())?.len());

    // 5. a rejected application stays rejected
    println!("\n5. rejection");
    println!("------------");
    let other = service.apply(borrower, Money::from_major(5000), 24, "car")?.loan;
    service.reject(other.id())?;
    match service.approve(other.id()) {
        Ok(_) => println!("  unexpected approval"),
        Err(e) => println!("  ✓ {}", e),
    }

    Ok(())
}
