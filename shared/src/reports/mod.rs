//! Financial report aggregators
//!
//! Each report is a pure fold over inputs the caller has already fetched for one
//! tenant and one date range. Nothing here caches results.

pub mod balance_sheet;
pub mod bank_statement;
pub mod income_expenditure;
pub mod product_analysis;
pub mod receipt_payment;

pub use balance_sheet::{BalanceSheet, BalanceSheetInputs};
pub use bank_statement::{BankStatement, BankStatementRow};
pub use income_expenditure::IncomeExpenditure;
pub use product_analysis::{ProductAnalysis, ProductAnalysisRow};
pub use receipt_payment::ReceiptPayment;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{CategoryTotal, TransactionType};

/// A labelled amount on a report
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportLine {
    pub category: String,
    pub label: String,
    pub amount: Decimal,
}

/// Bank totals grouped by (type, category) for a window
#[derive(Debug, Clone, Default)]
pub struct CategoryTotals {
    totals: Vec<CategoryTotal>,
}

impl CategoryTotals {
    pub fn new(totals: Vec<CategoryTotal>) -> Self {
        Self { totals }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryTotal> {
        self.totals.iter()
    }

    fn sum_where(&self, pred: impl Fn(&CategoryTotal) -> bool) -> Decimal {
        self.totals.iter().filter(|t| pred(t)).map(|t| t.amount).sum()
    }

    pub fn credit(&self, category: &str) -> Decimal {
        self.sum_where(|t| t.transaction_type == TransactionType::Credit && t.category == category)
    }

    pub fn debit(&self, category: &str) -> Decimal {
        self.sum_where(|t| t.transaction_type == TransactionType::Debit && t.category == category)
    }

    pub fn credits_excluding(&self, excluded: &[&str]) -> Decimal {
        self.sum_where(|t| {
            t.transaction_type == TransactionType::Credit && !excluded.contains(&t.category.as_str())
        })
    }

    pub fn debits_excluding(&self, excluded: &[&str]) -> Decimal {
        self.sum_where(|t| {
            t.transaction_type == TransactionType::Debit && !excluded.contains(&t.category.as_str())
        })
    }

    pub fn total(&self, kind: TransactionType) -> Decimal {
        self.sum_where(|t| t.transaction_type == kind)
    }
}

impl FromIterator<CategoryTotal> for CategoryTotals {
    fn from_iter<I: IntoIterator<Item = CategoryTotal>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Display name for a bank category, falling back to a title-cased form
pub fn category_label(category: &str) -> String {
    use crate::models::category::*;

    let known = match category {
        SALE => Some("Sales"),
        PURCHASE => Some("Purchases"),
        OPENING => Some("Opening Balance"),
        EXPENSE => Some("Expenses"),
        FIXED_ASSET => Some("Fixed Asset Purchase"),
        VENDOR_PAYMENT => Some("Vendor Payments"),
        CUSTOMER_PAYMENT => Some("Customer Payments"),
        ADJUSTMENT => Some("Adjustment"),
        FUND_IN => Some("Fund Received"),
        FUND_OUT => Some("Fund Withdrawn"),
        PROFIT => Some("Profit"),
        OTHER => Some("Other"),
        _ => None,
    };

    known.map(str::to_string).unwrap_or_else(|| title_case(category))
}

fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(category_label("sale"), "Sales");
        assert_eq!(category_label("fixed_asset"), "Fixed Asset Purchase");
    }

    #[test]
    fn test_fallback_label() {
        assert_eq!(category_label("shop_rent"), "Shop Rent");
        assert_eq!(category_label("UTILITY_bill"), "Utility Bill");
        assert_eq!(category_label("misc"), "Misc");
    }
}
