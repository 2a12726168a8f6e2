//! Read-only report views of a borrower and its payment history.
//!
//! Every amount is rendered at fixed currency precision with thousands
//! separators, so no unrounded value or `-0` can reach a report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::reconciler::{order_payments, BorrowerLedger};
use crate::records::{Borrower, PaymentRecord};
use crate::types::{BorrowerId, LoanStatus};

pub const PAYMENT_HEADER: [&str; 3] = ["Payment Date", "Amount", "Remaining Balance"];

/// one line of payment history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub payment_date: NaiveDate,
    pub amount: String,
    pub remaining_balance: String,
}

/// borrower summary plus payment history, ready for tabular output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerReport {
    pub borrower_id: BorrowerId,
    pub name: String,
    pub principal: String,
    pub term_months: u32,
    pub total: String,
    pub remaining_balance: String,
    pub status: LoanStatus,
    pub payments: Vec<PaymentRow>,
}

impl BorrowerReport {
    pub fn from_parts(borrower: &Borrower, payments: &[PaymentRecord]) -> Self {
        let mut ordered = payments.to_vec();
        order_payments(&mut ordered);

        Self {
            borrower_id: borrower.id,
            name: borrower.name.clone(),
            principal: format_amount(borrower.principal_amount),
            term_months: borrower.term_months,
            total: format_amount(borrower.total),
            remaining_balance: format_amount(borrower.remaining_balance),
            status: borrower.status(),
            payments: ordered
                .iter()
                .map(|p| PaymentRow {
                    payment_date: p.payment_date,
                    amount: format_amount(p.amount),
                    remaining_balance: format_amount(p.remaining_balance),
                })
                .collect(),
        }
    }

    pub fn from_ledger(ledger: &BorrowerLedger) -> Self {
        Self::from_parts(&ledger.borrower, &ledger.payments)
    }

    /// summary block, a blank row, the history header, then one row per payment
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec!["Name".to_string(), self.name.clone()],
            vec!["Principal".to_string(), self.principal.clone()],
            vec!["Term".to_string(), self.term_months.to_string()],
            vec!["Total".to_string(), self.total.clone()],
            vec!["Remaining Balance".to_string(), self.remaining_balance.clone()],
            vec![String::new(), String::new()],
            PAYMENT_HEADER.iter().map(|h| h.to_string()).collect(),
        ];
        rows.extend(self.payments.iter().map(|p| {
            vec![
                p.payment_date.format("%Y-%m-%d").to_string(),
                p.amount.clone(),
                p.remaining_balance.clone(),
            ]
        }));
        rows
    }

    /// width of each column in characters, widest cell per column
    pub fn column_widths(&self) -> Vec<usize> {
        let rows = self.rows();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        (0..columns)
            .map(|i| {
                rows.iter()
                    .filter_map(|r| r.get(i))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// suggested export file name
    pub fn file_stem(&self) -> String {
        format!("{}_report", self.name.replace(char::is_whitespace, "_"))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn format_amount(amount: Money) -> String {
    amount.to_grouped_string()
}
