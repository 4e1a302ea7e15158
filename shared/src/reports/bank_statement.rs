//! Daily bank report for one calendar month

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{category, BankTransaction, TransactionType};
use crate::types::DateRange;

/// Column a bank entry is bucketed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementColumn {
    Fund,
    SaleReceive,
    Purchase,
    VendorPayment,
    Expense,
}

/// Fixed (type, category) to column map. Unlisted credits count as fund deposits and
/// unlisted debits as expenses.
pub fn column_for(kind: TransactionType, category_name: &str) -> StatementColumn {
    match (kind, category_name) {
        (TransactionType::Credit, category::SALE | category::CUSTOMER_PAYMENT) => {
            StatementColumn::SaleReceive
        }
        (TransactionType::Credit, _) => StatementColumn::Fund,
        (TransactionType::Debit, category::PURCHASE) => StatementColumn::Purchase,
        (TransactionType::Debit, category::VENDOR_PAYMENT) => StatementColumn::VendorPayment,
        (TransactionType::Debit, _) => StatementColumn::Expense,
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct Deposits {
    pub fund: Decimal,
    pub sale_receive: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct Withdrawals {
    pub purchase: Decimal,
    pub vendor_payment: Decimal,
    pub expense: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BankStatementRow {
    pub label: String,
    pub date: Option<NaiveDate>,
    pub deposits: Deposits,
    pub withdrawals: Withdrawals,
    pub balance: Decimal,
}

impl BankStatementRow {
    fn add(&mut self, column: StatementColumn, amount: Decimal) {
        match column {
            StatementColumn::Fund => self.deposits.fund += amount,
            StatementColumn::SaleReceive => self.deposits.sale_receive += amount,
            StatementColumn::Purchase => self.withdrawals.purchase += amount,
            StatementColumn::VendorPayment => self.withdrawals.vendor_payment += amount,
            StatementColumn::Expense => self.withdrawals.expense += amount,
        }
        match column {
            StatementColumn::Fund | StatementColumn::SaleReceive => self.deposits.total += amount,
            _ => self.withdrawals.total += amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BankStatement {
    pub period: DateRange,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    /// "Previous Month Balance", one row per day, then "Month Total"
    pub rows: Vec<BankStatementRow>,
}

fn empty_row(label: String, date: Option<NaiveDate>, balance: Decimal) -> BankStatementRow {
    BankStatementRow {
        label,
        date,
        deposits: Deposits::default(),
        withdrawals: Withdrawals::default(),
        balance,
    }
}

/// Build the statement from the month's transactions and the balance brought forward.
///
/// The running balance is recomputed from the amounts; stored snapshots are not read.
pub fn build(
    month: DateRange,
    previous_balance: Decimal,
    transactions: &[BankTransaction],
) -> BankStatement {
    let mut rows = Vec::with_capacity(month.days().count() + 2);
    rows.push(empty_row(
        "Previous Month Balance".to_string(),
        None,
        previous_balance,
    ));

    let mut total = empty_row("Month Total".to_string(), None, previous_balance);
    let mut balance = previous_balance;

    for day in month.days() {
        let mut row = empty_row(day.format("%Y-%m-%d").to_string(), Some(day), balance);
        for tx in transactions.iter().filter(|tx| tx.transaction_date == day) {
            let column = column_for(tx.transaction_type, &tx.category);
            row.add(column, tx.amount);
            total.add(column, tx.amount);
        }
        balance = balance + row.deposits.total - row.withdrawals.total;
        row.balance = balance;
        rows.push(row);
    }

    total.balance = balance;
    rows.push(total);

    BankStatement {
        period: month,
        opening_balance: previous_balance,
        closing_balance: balance,
        rows,
    }
}
