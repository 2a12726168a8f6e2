/// retroactive edits - a mid-sequence change moves every later balance
use std::sync::Arc;

use loan_ledger_rs::chrono::NaiveDate;
use loan_ledger_rs::{LedgerConfig, LedgerReconciler, MemoryStore, Money, NewBorrower, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    // zero interest keeps the numbers easy to follow
    let ledger = LedgerReconciler::with_system_time(store, LedgerConfig::new(Rate::ZERO))?;
    let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).ok_or("bad date");

    let borrower = ledger.register_borrower(NewBorrower::new("Juan", Money::from_major(1_000), 1, date(1, 1)?))?;
    ledger.record_payment(borrower.id, date(2, 1)?, Money::from_major(400))?;
    ledger.record_payment(borrower.id, date(3, 1)?, Money::from_major(300))?;
    print_history(&ledger, borrower.id)?;

    let first = ledger.payments(borrower.id)?[0].id;
    ledger.edit_payment(first, None, Some(Money::from_major(200)))?;
    println!("\nafter editing the february payment to 200:");
    print_history(&ledger, borrower.id)?;

    match ledger.record_payment(borrower.id, date(4, 1)?, Money::from_major(900)) {
        Ok(_) => println!("\nunexpected: overpayment accepted"),
        Err(e) => println!("\noverpayment rejected: {}", e),
    }

    println!("\nterm change to 3 months at 0%:");
    let terms = ledger.edit_borrower_terms(borrower.id, None, Some(3))?;
    println!("total {} remaining {}", terms.total, terms.remaining_balance);

    for event in ledger.take_events() {
        println!("{:?}", event);
    }
    Ok(())
}

fn print_history(
    ledger: &LedgerReconciler<MemoryStore>,
    id: loan_ledger_rs::BorrowerId,
) -> Result<(), Box<dyn std::error::Error>> {
    for p in ledger.payments(id)? {
        println!("  {}  paid {:>8}  remaining {:>8}", p.payment_date, p.amount, p.remaining_balance);
    }
    Ok(())
}
