//! Weighted-average cost engine
//!
//! All product valuation in the reports goes through [`value_product`]. Callers gather
//! the period aggregates (usually with one grouped query per input, keyed by product)
//! into a [`ValuationInput`] and get back the full [`ProductValuation`] breakdown.
//!
//! Division by zero never escapes this module: a zero denominator yields zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::StockEntry;
use crate::types::DateRange;

/// Blend an incoming quantity into an existing average cost.
///
/// When nothing is on hand (or the position is oversold) the incoming price wins.
pub fn weighted_average(
    old_qty: Decimal,
    old_avg: Decimal,
    new_qty: Decimal,
    new_price: Decimal,
) -> Decimal {
    if old_qty <= Decimal::ZERO {
        return new_price;
    }
    let total_qty = old_qty + new_qty;
    if total_qty.is_zero() {
        return new_price;
    }
    (old_qty * old_avg + new_qty * new_price) / total_qty
}

/// Share of a sale-level discount attributed to one line, by line-total share
pub fn apportion_discount(line_total: Decimal, sale_subtotal: Decimal, sale_discount: Decimal) -> Decimal {
    if sale_subtotal > Decimal::ZERO {
        line_total / sale_subtotal * sale_discount
    } else {
        Decimal::ZERO
    }
}

/// `numerator / denominator`, or zero when the denominator is zero
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Stock ledger aggregates for everything dated strictly before the period
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PriorStock {
    /// Net signed quantity of all entries before the period
    pub net_qty: Decimal,
    /// Sum of positive quantities that carry a purchase price
    pub inbound_qty: Decimal,
    /// Sum of `quantity * purchase_price` over those same entries
    pub inbound_value: Decimal,
}

/// Purchases whose parent purchase is dated within the period
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PeriodPurchases {
    pub qty: Decimal,
    pub value: Decimal,
}

/// Sales whose parent sale is dated within the period
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PeriodSales {
    pub qty: Decimal,
    pub revenue_gross: Decimal,
    /// Sum of the apportioned parent-sale discounts
    pub discount: Decimal,
}

/// Everything the engine needs for one product and one period
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ValuationInput {
    pub prior: PriorStock,
    pub purchases: PeriodPurchases,
    pub sales: PeriodSales,
    /// Current cached average cost, used only when no priced inbound entry exists
    /// before the period
    pub fallback_avg_price: Option<Decimal>,
}

/// Full valuation breakdown for one product over one period
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductValuation {
    pub before_stock_qty: Decimal,
    pub before_stock_value: Decimal,
    pub before_stock_unit_price: Decimal,
    pub period_purchase_qty: Decimal,
    pub period_purchase_value: Decimal,
    pub period_sale_qty: Decimal,
    pub period_sale_revenue_gross: Decimal,
    pub period_sale_discount: Decimal,
    pub period_sale_revenue_net: Decimal,
    pub weighted_avg_unit_cost: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub gross_profit: Decimal,
    pub ending_stock_qty: Decimal,
    pub ending_stock_value: Decimal,
}

/// Value one product over one period with weighted-average costing
pub fn value_product(input: &ValuationInput) -> ProductValuation {
    // A net-negative position before the period (oversold) is floored at zero.
    let before_stock_qty = input.prior.net_qty.max(Decimal::ZERO);

    let before_stock_unit_price = if before_stock_qty > Decimal::ZERO {
        if input.prior.inbound_qty > Decimal::ZERO {
            input.prior.inbound_value / input.prior.inbound_qty
        } else {
            input.fallback_avg_price.unwrap_or(Decimal::ZERO)
        }
    } else {
        Decimal::ZERO
    };
    let before_stock_value = before_stock_qty * before_stock_unit_price;

    let weighted_avg_unit_cost = safe_div(
        before_stock_value + input.purchases.value,
        before_stock_qty + input.purchases.qty,
    );

    let period_sale_revenue_net = input.sales.revenue_gross - input.sales.discount;
    let cost_of_goods_sold = input.sales.qty * weighted_avg_unit_cost;

    ProductValuation {
        before_stock_qty,
        before_stock_value,
        before_stock_unit_price,
        period_purchase_qty: input.purchases.qty,
        period_purchase_value: input.purchases.value,
        period_sale_qty: input.sales.qty,
        period_sale_revenue_gross: input.sales.revenue_gross,
        period_sale_discount: input.sales.discount,
        period_sale_revenue_net,
        weighted_avg_unit_cost,
        cost_of_goods_sold,
        gross_profit: period_sale_revenue_net - cost_of_goods_sold,
        ending_stock_qty: before_stock_qty + input.purchases.qty - input.sales.qty,
        ending_stock_value: before_stock_value + input.purchases.value - cost_of_goods_sold,
    }
}

/// A purchase line as seen by the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PurchaseLineFact {
    pub purchase_date: NaiveDate,
    pub quantity: Decimal,
    pub line_total: Decimal,
}

/// A sale line together with its parent sale's subtotal and discount
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SaleLineFact {
    pub sale_date: NaiveDate,
    pub quantity: Decimal,
    pub line_total: Decimal,
    pub sale_subtotal: Decimal,
    pub sale_discount: Decimal,
}

impl SaleLineFact {
    pub fn apportioned_discount(&self) -> Decimal {
        apportion_discount(self.line_total, self.sale_subtotal, self.sale_discount)
    }
}

impl ValuationInput {
    /// Fold raw facts for a single product into engine input.
    ///
    /// This is the in-memory equivalent of the grouped queries the backend runs.
    pub fn from_facts(
        period: DateRange,
        stock_entries: &[StockEntry],
        purchase_lines: &[PurchaseLineFact],
        sale_lines: &[SaleLineFact],
        fallback_avg_price: Option<Decimal>,
    ) -> Self {
        let mut prior = PriorStock::default();
        for entry in stock_entries.iter().filter(|e| e.entry_date < period.start) {
            prior.net_qty += entry.quantity;
            if entry.quantity > Decimal::ZERO {
                if let Some(price) = entry.purchase_price {
                    prior.inbound_qty += entry.quantity;
                    prior.inbound_value += entry.quantity * price;
                }
            }
        }

        let purchases = purchase_lines
            .iter()
            .filter(|l| period.contains(l.purchase_date))
            .fold(PeriodPurchases::default(), |acc, l| PeriodPurchases {
                qty: acc.qty + l.quantity,
                value: acc.value + l.line_total,
            });

        let sales = sale_lines
            .iter()
            .filter(|l| period.contains(l.sale_date))
            .fold(PeriodSales::default(), |acc, l| PeriodSales {
                qty: acc.qty + l.quantity,
                revenue_gross: acc.revenue_gross + l.line_total,
                discount: acc.discount + l.apportioned_discount(),
            });

        Self {
            prior,
            purchases,
            sales,
            fallback_avg_price,
        }
    }
}
