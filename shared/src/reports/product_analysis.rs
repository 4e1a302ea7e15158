//! Product profitability analysis

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::ProductRef;
use crate::types::DateRange;
use crate::valuation::{safe_div, ProductValuation};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductAnalysisRow {
    pub product: ProductRef,
    #[serde(flatten)]
    pub valuation: ProductValuation,
    /// Gross profit as a percentage of net revenue
    pub margin_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductAnalysis {
    pub period: DateRange,
    pub rows: Vec<ProductAnalysisRow>,
    /// Column sums over every row
    pub totals: ProductValuation,
    pub overall_margin_percent: Decimal,
}

fn margin(profit: Decimal, revenue: Decimal) -> Decimal {
    safe_div(profit, revenue) * Decimal::ONE_HUNDRED
}

pub fn build(period: DateRange, products: Vec<(ProductRef, ProductValuation)>) -> ProductAnalysis {
    let mut totals = ProductValuation::default();
    let rows: Vec<ProductAnalysisRow> = products
        .into_iter()
        .map(|(product, valuation)| {
            accumulate(&mut totals, &valuation);
            ProductAnalysisRow {
                margin_percent: margin(valuation.gross_profit, valuation.period_sale_revenue_net),
                product,
                valuation,
            }
        })
        .collect();

    // Unit prices do not sum; report the blended figures instead.
    totals.before_stock_unit_price = safe_div(totals.before_stock_value, totals.before_stock_qty);
    totals.weighted_avg_unit_cost = safe_div(
        totals.before_stock_value + totals.period_purchase_value,
        totals.before_stock_qty + totals.period_purchase_qty,
    );

    ProductAnalysis {
        period,
        overall_margin_percent: margin(totals.gross_profit, totals.period_sale_revenue_net),
        rows,
        totals,
    }
}

fn accumulate(totals: &mut ProductValuation, v: &ProductValuation) {
    totals.before_stock_qty += v.before_stock_qty;
    totals.before_stock_value += v.before_stock_value;
    totals.period_purchase_qty += v.period_purchase_qty;
    totals.period_purchase_value += v.period_purchase_value;
    totals.period_sale_qty += v.period_sale_qty;
    totals.period_sale_revenue_gross += v.period_sale_revenue_gross;
    totals.period_sale_discount += v.period_sale_discount;
    totals.period_sale_revenue_net += v.period_sale_revenue_net;
    totals.cost_of_goods_sold += v.cost_of_goods_sold;
    totals.gross_profit += v.gross_profit;
    totals.ending_stock_qty += v.ending_stock_qty;
    totals.ending_stock_value += v.ending_stock_value;
}
