//! The one authoritative balance recompute.
//!
//! Every mutating ledger operation funnels through [`recompute_balances`]:
//! payments are put in date order (recording order breaks ties) and each
//! row's remaining balance is set to `total - running sum of amounts`. The
//! walk fails before anything is written if any row would go negative.

use std::cmp::Ordering;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::records::PaymentRecord;
use crate::types::{BorrowerId, PaymentId};

/// outcome of a full recompute
#[derive(Debug, Clone, PartialEq)]
pub struct Recomputed {
    /// balance after the last payment, or the total when there are none
    pub final_balance: Money,
    /// payments whose stored remaining balance moved
    pub changed: Vec<PaymentId>,
}

/// chronological ordering of a borrower's payments
pub fn payment_order(a: &PaymentRecord, b: &PaymentRecord) -> Ordering {
    a.payment_date
        .cmp(&b.payment_date)
        .then(a.sequence.cmp(&b.sequence))
        .then_with(|| a.id.cmp(&b.id))
}

/// sort payments into chronological order in place
pub fn order_payments(payments: &mut [PaymentRecord]) {
    payments.sort_by(payment_order);
}

/// recompute every remaining balance against `total`
///
/// On error the slice is left sorted but with its balances untouched.
pub fn recompute_balances(
    borrower_id: BorrowerId,
    total: Money,
    payments: &mut [PaymentRecord],
) -> Result<Recomputed> {
    order_payments(payments);

    // dry run first so a rejection leaves every row as it was
    let mut running = total;
    let mut balances = Vec::with_capacity(payments.len());
    for payment in payments.iter() {
        if !payment.amount.is_positive() {
            return Err(LedgerError::invalid_input(format!(
                "payment {} has non-positive amount {}",
                payment.id, payment.amount
            )));
        }
        running = running
            .checked_sub_non_negative(payment.amount)
            .ok_or_else(|| LedgerError::BalanceUnderflow {
                account: format!("borrower {}", borrower_id),
                available: running,
                requested: payment.amount,
            })?;
        balances.push(running);
    }

    let mut changed = Vec::new();
    for (payment, balance) in payments.iter_mut().zip(balances) {
        if payment.remaining_balance != balance {
            payment.remaining_balance = balance;
            changed.push(payment.id);
        }
    }

    Ok(Recomputed {
        final_balance: running,
        changed,
    })
}
