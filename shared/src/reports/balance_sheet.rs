//! Balance sheet

use rust_decimal::Decimal;
use serde::Serialize;

use super::CategoryTotals;
use crate::models::category;
use crate::types::DateRange;
use crate::valuation::ProductValuation;

/// Values the balance sheet is folded from.
///
/// `to_date` totals cover every bank entry dated on or before the sheet date;
/// `year_to_date` totals and `product_valuations` cover the fiscal year up to it.
#[derive(Debug, Clone)]
pub struct BalanceSheetInputs {
    pub as_of: chrono::NaiveDate,
    pub year_to_date: DateRange,
    pub bank_balance: Decimal,
    pub customer_due: Decimal,
    pub to_date: CategoryTotals,
    pub year_to_date_totals: CategoryTotals,
    pub product_valuations: Vec<ProductValuation>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Assets {
    pub bank_balance: Decimal,
    pub customer_due: Decimal,
    pub fixed_assets: Decimal,
    pub stock_value: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NetProfit {
    pub product_gross_profit: Decimal,
    pub other_income: Decimal,
    pub cumulative_income: Decimal,
    pub cumulative_expenditure: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Liabilities {
    pub fund: Decimal,
    pub profit: Decimal,
    pub net_profit: NetProfit,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BalanceSheet {
    pub as_of: chrono::NaiveDate,
    pub year_to_date: DateRange,
    pub assets: Assets,
    pub liabilities: Liabilities,
    /// `assets.total - liabilities.total`
    pub difference: Decimal,
}

pub fn build(inputs: &BalanceSheetInputs) -> BalanceSheet {
    let fixed_assets = inputs.to_date.debit(category::FIXED_ASSET);
    let stock_value: Decimal = inputs
        .product_valuations
        .iter()
        .map(|v| v.ending_stock_value)
        .sum();

    let assets = Assets {
        bank_balance: inputs.bank_balance,
        customer_due: inputs.customer_due,
        fixed_assets,
        stock_value,
        total: inputs.bank_balance + inputs.customer_due + fixed_assets + stock_value,
    };

    let fund = inputs.to_date.credit(category::FUND_IN) - inputs.to_date.debit(category::FUND_OUT);
    let profit = inputs.to_date.credit(category::PROFIT);

    let product_gross_profit: Decimal = inputs.product_valuations.iter().map(|v| v.gross_profit).sum();
    let other_income = inputs
        .year_to_date_totals
        .credits_excluding(category::NON_INCOME_CREDITS);
    let cumulative_income = product_gross_profit + other_income;
    let cumulative_expenditure = inputs
        .year_to_date_totals
        .debits_excluding(category::NON_EXPENDITURE_DEBITS);

    let net_profit = NetProfit {
        product_gross_profit,
        other_income,
        cumulative_income,
        cumulative_expenditure,
        net_profit: cumulative_income - cumulative_expenditure,
    };

    let liabilities_total = fund + profit + net_profit.net_profit;

    BalanceSheet {
        as_of: inputs.as_of,
        year_to_date: inputs.year_to_date,
        difference: assets.total - liabilities_total,
        assets,
        liabilities: Liabilities {
            fund,
            profit,
            net_profit,
            total: liabilities_total,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryTotal, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn total(kind: TransactionType, category: &str, amount: Decimal) -> CategoryTotal {
        CategoryTotal {
            transaction_type: kind,
            category: category.to_string(),
            amount,
        }
    }

    fn inputs() -> BalanceSheetInputs {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let to_date: CategoryTotals = vec![
            total(TransactionType::Credit, "fund_in", dec!(5000)),
            total(TransactionType::Debit, "fund_out", dec!(500)),
            total(TransactionType::Credit, "profit", dec!(200)),
            total(TransactionType::Debit, "fixed_asset", dec!(1200)),
        ]
        .into_iter()
        .collect();
        let ytd: CategoryTotals = vec![
            total(TransactionType::Credit, "sale", dec!(9000)),
            total(TransactionType::Credit, "commission", dec!(150)),
            total(TransactionType::Debit, "expense", dec!(400)),
            total(TransactionType::Debit, "purchase", dec!(7000)),
            total(TransactionType::Debit, "fixed_asset", dec!(1200)),
        ]
        .into_iter()
        .collect();

        BalanceSheetInputs {
            as_of,
            year_to_date: DateRange::fiscal_year_to_date(as_of, 1),
            bank_balance: dec!(2300),
            customer_due: dec!(350),
            to_date,
            year_to_date_totals: ytd,
            product_valuations: vec![
                ProductValuation { ending_stock_value: dec!(800), gross_profit: dec!(600), ..Default::default() },
                ProductValuation { ending_stock_value: dec!(100), gross_profit: dec!(-50), ..Default::default() },
            ],
        }
    }

    #[test]
    fn test_assets_sum_their_components() {
        let sheet = build(&inputs());
        let a = &sheet.assets;

        assert_eq!(a.fixed_assets, dec!(1200));
        assert_eq!(a.stock_value, dec!(900));
        assert_eq!(a.total, a.bank_balance + a.customer_due + a.fixed_assets + a.stock_value);
        assert_eq!(a.total, dec!(4750));
    }

    #[test]
    fn test_liabilities() {
        let sheet = build(&inputs());
        let l = &sheet.liabilities;

        assert_eq!(l.fund, dec!(4500));
        assert_eq!(l.profit, dec!(200));
        assert_eq!(l.net_profit.product_gross_profit, dec!(550));
        assert_eq!(l.net_profit.other_income, dec!(150));
        assert_eq!(l.net_profit.cumulative_expenditure, dec!(400));
        assert_eq!(l.net_profit.net_profit, dec!(300));
        assert_eq!(l.total, dec!(5000));
        assert_eq!(sheet.difference, dec!(-250));
    }
}
