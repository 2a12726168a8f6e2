/// cash ledger - deposits, guarded withdrawals, and the grand total
use std::sync::Arc;

use loan_ledger_rs::chrono::NaiveDate;
use loan_ledger_rs::{CashField, CashLedger, LedgerConfig, LedgerReconciler, MemoryStore, Money, NewBorrower};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let ledger = LedgerReconciler::with_system_time(Arc::clone(&store), LedgerConfig::default())?;
    let cash = CashLedger::with_system_time(Arc::clone(&store));

    let date = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
    ledger.register_borrower(NewBorrower::new("Ana", Money::from_major(5_000), 6, date))?;

    cash.deposit(Money::from_major(20_000), Money::from_major(1_500))?;
    cash.adjust(CashField::CashHand, Money::from_major(-500))?;

    if let Err(e) = cash.adjust(CashField::CashHand, Money::from_major(-5_000)) {
        println!("withdrawal refused: {}", e);
    }

    let totals = cash.grand_total()?;
    println!("outstanding loans: {}", totals.outstanding.to_grouped_string());
    println!("cash in bank:      {}", totals.cash_in.to_grouped_string());
    println!("cash on hand:      {}", totals.cash_hand.to_grouped_string());
    println!("grand total:       {}", totals.total.to_grouped_string());
    Ok(())
}
