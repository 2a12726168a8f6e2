/// quick start - register a borrower, take payments, print the report
use std::sync::Arc;

use loan_ledger_rs::chrono::NaiveDate;
use loan_ledger_rs::{BorrowerReport, LedgerConfig, LedgerReconciler, MemoryStore, Money, NewBorrower};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let ledger = LedgerReconciler::with_system_time(store, LedgerConfig::default())?;

    let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).ok_or("bad date");

    let borrower = ledger.register_borrower(NewBorrower::new(
        "Maria Santos",
        Money::parse("10,000")?,
        12,
        date(1, 5)?,
    ))?;
    println!("total owed: {}", borrower.total.to_grouped_string());

    ledger.record_payment(borrower.id, date(2, 5)?, Money::from_major(2_000))?;
    let outcome = ledger.record_payment(borrower.id, date(3, 5)?, Money::from_major(2_000))?;
    println!("remaining: {} (fully paid: {})", outcome.remaining_balance, outcome.fully_paid);

    let report = BorrowerReport::from_ledger(&ledger.ledger(borrower.id)?);
    for row in report.rows() {
        println!("{}", row.join(" | "));
    }
    Ok(())
}
