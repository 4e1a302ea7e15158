//! Report aggregation tests
//!
//! Covers:
//! - Balance sheet assets reconcile with their own components
//! - Receipt & payment sides balance whenever the ledger is intact
//! - Bank statement closing balance agrees with a ledger replay
//! - CSV export shapes

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use shared::ledger::next_balance;
use shared::models::{category, BankTransaction, CategoryTotal, ProductRef, TransactionType};
use shared::reports::{self, BalanceSheetInputs, CategoryTotals};
use shared::types::DateRange;
use shared::valuation::ProductValuation;
use shop_backend::services::reports::{
    BankStatementCsvRow, IncomeExpenditureCsvRow, ProductAnalysisCsvRow, ReportService,
};

const CATEGORIES: &[&str] = &[
    category::SALE,
    category::PURCHASE,
    category::OPENING,
    category::EXPENSE,
    category::FIXED_ASSET,
    category::VENDOR_PAYMENT,
    category::CUSTOMER_PAYMENT,
    category::ADJUSTMENT,
    category::FUND_IN,
    category::FUND_OUT,
    category::PROFIT,
    category::OTHER,
    "shop_rent",
];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn bank_tx(id: i64, day: NaiveDate, kind: TransactionType, cat: &str, amount: Decimal) -> BankTransaction {
    BankTransaction {
        id,
        tenant_id: Uuid::nil(),
        account_id: Uuid::nil(),
        transaction_date: day,
        transaction_type: kind,
        category: cat.to_string(),
        description: String::new(),
        amount,
        balance_after: Decimal::ZERO,
        reference_id: None,
        reference_type: None,
        created_by: None,
        created_at: Utc::now(),
    }
}

/// Group transactions the way the grouped bank query does
fn group(transactions: &[BankTransaction]) -> CategoryTotals {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for tx in transactions {
        match totals
            .iter_mut()
            .find(|t| t.transaction_type == tx.transaction_type && t.category == tx.category)
        {
            Some(t) => t.amount += tx.amount,
            None => totals.push(CategoryTotal {
                transaction_type: tx.transaction_type,
                category: tx.category.clone(),
                amount: tx.amount,
            }),
        }
    }
    CategoryTotals::new(totals)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_income_expenditure_groups_and_labels() {
        let period = DateRange::month(2024, 4).unwrap();
        let txs = vec![
            bank_tx(1, date(2024, 4, 2), TransactionType::Credit, "sale", dec!(500)),
            bank_tx(2, date(2024, 4, 3), TransactionType::Credit, "sale", dec!(250)),
            bank_tx(3, date(2024, 4, 4), TransactionType::Debit, "shop_rent", dec!(300)),
        ];

        let report = reports::income_expenditure::build(period, &group(&txs));

        assert_eq!(report.income.len(), 1);
        assert_eq!(report.income[0].label, "Sales");
        assert_eq!(report.income[0].amount, dec!(750));
        assert_eq!(report.expenditure[0].label, "Shop Rent");
        assert_eq!(report.net, dec!(450));
    }

    #[test]
    fn test_product_analysis_csv_has_total_row() {
        let period = DateRange::month(2024, 4).unwrap();
        let report = reports::product_analysis::build(
            period,
            vec![(
                ProductRef {
                    id: Uuid::nil(),
                    name: "Lentils".to_string(),
                    sku: Some("LEN-1".to_string()),
                },
                ProductValuation {
                    period_sale_qty: dec!(3),
                    period_sale_revenue_net: dec!(60),
                    gross_profit: dec!(15),
                    ..Default::default()
                },
            )],
        );

        let csv = ReportService::export_to_csv(&ProductAnalysisCsvRow::from_report(&report, "EUR")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("product,sku,before_stock_qty"));
        assert!(lines[1].starts_with("Lentils,LEN-1,"));
        assert!(lines[2].starts_with("Total,,"));

        let header: Vec<&str> = lines[0].split(',').collect();
        let margin_col = header.iter().position(|h| *h == "margin_percent").unwrap();
        let margin: Decimal = lines[2].split(',').nth(margin_col).unwrap().parse().unwrap();
        assert_eq!(margin, dec!(25));
        assert!(lines.iter().skip(1).all(|l| l.ends_with(",EUR")));
    }

    #[test]
    fn test_income_expenditure_csv_sections() {
        let period = DateRange::month(2024, 4).unwrap();
        let txs = vec![
            bank_tx(1, date(2024, 4, 2), TransactionType::Credit, "interest", dec!(12)),
            bank_tx(2, date(2024, 4, 3), TransactionType::Debit, "expense", dec!(5)),
        ];
        let report = reports::income_expenditure::build(period, &group(&txs));

        let rows = IncomeExpenditureCsvRow::from_report(&report, "USD");
        let sections: Vec<&str> = rows.iter().map(|r| r.section).collect();
        assert_eq!(sections, vec!["income", "income", "expenditure", "expenditure", "net"]);
        assert_eq!(rows.last().unwrap().amount, dec!(7));

        let csv = ReportService::export_to_csv(&rows).unwrap();
        assert!(csv.starts_with("section,category,label,amount,currency\n"));
    }

    #[test]
    fn test_bank_statement_csv_row_per_day() {
        let month = DateRange::month(2024, 4).unwrap();
        let txs = vec![bank_tx(1, date(2024, 4, 10), TransactionType::Credit, "sale", dec!(40))];
        let statement = reports::bank_statement::build(month, dec!(10), &txs);

        let rows = BankStatementCsvRow::from_report(&statement, "THB");
        assert_eq!(rows.len(), 32);
        assert_eq!(rows[0].label, "Previous Month Balance");
        assert_eq!(rows[10].sale_receive, dec!(40));
        assert_eq!(rows[31].balance, dec!(50));
        assert!(rows.iter().all(|r| r.currency == "THB"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=500_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn signed_strategy() -> impl Strategy<Value = Decimal> {
        (-500_000i64..=500_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn kind_strategy() -> impl Strategy<Value = TransactionType> {
        prop_oneof![Just(TransactionType::Credit), Just(TransactionType::Debit)]
    }

    fn category_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(CATEGORIES)
    }

    fn transactions_strategy() -> impl Strategy<Value = Vec<BankTransaction>> {
        prop::collection::vec((kind_strategy(), category_strategy(), amount_strategy(), 1u32..=30), 0..40)
            .prop_map(|raw| {
                let mut txs: Vec<BankTransaction> = raw
                    .into_iter()
                    .map(|(k, c, a, d)| bank_tx(0, date(2024, 4, d), k, c, a))
                    .collect();
                txs.sort_by_key(|t| t.transaction_date);
                for (i, t) in txs.iter_mut().enumerate() {
                    t.id = i as i64 + 1;
                }
                txs
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Assets total is exactly the sum of its components
        #[test]
        fn prop_balance_sheet_assets_reconcile(
            bank_balance in signed_strategy(),
            customer_due in amount_strategy(),
            txs in transactions_strategy(),
            stock_values in prop::collection::vec((signed_strategy(), signed_strategy()), 0..8),
        ) {
            let as_of = date(2024, 4, 30);
            let totals = group(&txs);
            let sheet = reports::balance_sheet::build(&BalanceSheetInputs {
                as_of,
                year_to_date: DateRange::fiscal_year_to_date(as_of, 1),
                bank_balance,
                customer_due,
                to_date: totals.clone(),
                year_to_date_totals: totals,
                product_valuations: stock_values
                    .into_iter()
                    .map(|(value, profit)| ProductValuation {
                        ending_stock_value: value,
                        gross_profit: profit,
                        ..Default::default()
                    })
                    .collect(),
            });

            let a = &sheet.assets;
            prop_assert_eq!(a.total, a.bank_balance + a.customer_due + a.fixed_assets + a.stock_value);
            let l = &sheet.liabilities;
            prop_assert_eq!(l.total, l.fund + l.profit + l.net_profit.net_profit);
            prop_assert_eq!(sheet.difference, a.total - l.total);
        }

        /// With closing = opening + credits - debits, receipts equal payments
        #[test]
        fn prop_receipt_payment_balances(
            opening in signed_strategy(),
            txs in transactions_strategy(),
        ) {
            let period = DateRange::month(2024, 4).unwrap();
            let closing = txs
                .iter()
                .fold(opening, |b, t| next_balance(b, t.transaction_type, t.amount));

            let report = reports::receipt_payment::build(period, opening, closing, &group(&txs));
            prop_assert_eq!(report.total_receipts, report.total_payments);
        }

        /// The statement's closing balance equals replaying the month's entries
        #[test]
        fn prop_bank_statement_closing_matches_replay(
            previous in signed_strategy(),
            txs in transactions_strategy(),
        ) {
            let month = DateRange::month(2024, 4).unwrap();
            let statement = reports::bank_statement::build(month, previous, &txs);
            let replayed = txs
                .iter()
                .fold(previous, |b, t| next_balance(b, t.transaction_type, t.amount));

            prop_assert_eq!(statement.closing_balance, replayed);
            prop_assert_eq!(statement.rows.len(), 32);

            let total = statement.rows.last().unwrap();
            prop_assert_eq!(total.deposits.total, group(&txs).total(TransactionType::Credit));
            prop_assert_eq!(total.withdrawals.total, group(&txs).total(TransactionType::Debit));
        }
    }
}
