//! Receipt and payment statement (cash-flow view)
//!
//! Every credit in the window lands on exactly one receipt line and every debit on
//! exactly one payment line. The closing balance is listed as a payment so the two
//! sides agree whenever the ledger chain is intact.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{CategoryTotals, ReportLine};
use crate::models::category;
use crate::types::DateRange;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReceiptPayment {
    pub period: DateRange,
    pub receipts: Vec<ReportLine>,
    pub payments: Vec<ReportLine>,
    pub total_receipts: Decimal,
    pub total_payments: Decimal,
}

const RECEIPT_CATEGORIES: &[&str] = &[
    category::SALE,
    category::CUSTOMER_PAYMENT,
    category::ADJUSTMENT,
    category::FUND_IN,
    category::OPENING,
];

const PAYMENT_CATEGORIES: &[&str] = &[
    category::PURCHASE,
    category::VENDOR_PAYMENT,
    category::EXPENSE,
    category::FIXED_ASSET,
];

fn line(category: &str, label: &str, amount: Decimal) -> ReportLine {
    ReportLine {
        category: category.to_string(),
        label: label.to_string(),
        amount,
    }
}

pub fn build(
    period: DateRange,
    opening_balance: Decimal,
    closing_balance: Decimal,
    totals: &CategoryTotals,
) -> ReceiptPayment {
    let receipts = vec![
        line("opening_cash", "Opening Cash", opening_balance),
        line(category::SALE, "Sale Collections", totals.credit(category::SALE)),
        line(
            category::CUSTOMER_PAYMENT,
            "Customer Payments",
            totals.credit(category::CUSTOMER_PAYMENT),
        ),
        line(
            category::OTHER,
            "Other Income",
            totals.credits_excluding(RECEIPT_CATEGORIES),
        ),
        line(category::ADJUSTMENT, "Adjustments", totals.credit(category::ADJUSTMENT)),
        line(
            category::FUND_IN,
            "Fund Receipts",
            totals.credit(category::FUND_IN) + totals.credit(category::OPENING),
        ),
    ];

    let payments = vec![
        line(category::PURCHASE, "Purchases", totals.debit(category::PURCHASE)),
        line(
            category::VENDOR_PAYMENT,
            "Vendor Payments",
            totals.debit(category::VENDOR_PAYMENT),
        ),
        line(category::EXPENSE, "Expenses", totals.debit(category::EXPENSE)),
        line(
            category::FIXED_ASSET,
            "Fixed Asset Purchases",
            totals.debit(category::FIXED_ASSET),
        ),
        line(
            category::OTHER,
            "Other Payments and Adjustments",
            totals.debits_excluding(PAYMENT_CATEGORIES),
        ),
        line("closing_cash", "Closing Cash Balance", closing_balance),
    ];

    ReceiptPayment {
        period,
        total_receipts: receipts.iter().map(|l| l.amount).sum(),
        total_payments: payments.iter().map(|l| l.amount).sum(),
        receipts,
        payments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryTotal, TransactionType};
    use rust_decimal_macros::dec;

    fn t(kind: TransactionType, category: &str, amount: Decimal) -> CategoryTotal {
        CategoryTotal { transaction_type: kind, category: category.into(), amount }
    }

    #[test]
    fn test_sides_balance_for_intact_ledger() {
        let totals: CategoryTotals = vec![
            t(TransactionType::Credit, "sale", dec!(900)),
            t(TransactionType::Credit, "opening", dec!(100)),
            t(TransactionType::Credit, "interest", dec!(15)),
            t(TransactionType::Credit, "adjustment", dec!(5)),
            t(TransactionType::Debit, "purchase", dec!(600)),
            t(TransactionType::Debit, "fund_out", dec!(20)),
            t(TransactionType::Debit, "expense", dec!(80)),
        ]
        .into_iter()
        .collect();
        let opening = dec!(1000);
        let closing = opening + totals.total(TransactionType::Credit) - totals.total(TransactionType::Debit);

        let report = build(DateRange::month(2024, 4).unwrap(), opening, closing, &totals);

        assert_eq!(report.total_receipts, report.total_payments);
        assert_eq!(report.receipts[3].amount, dec!(15));
        assert_eq!(report.receipts[5].amount, dec!(100));
        assert_eq!(report.payments[4].amount, dec!(20));
        assert_eq!(report.payments[5].amount, dec!(1320));
    }
}
