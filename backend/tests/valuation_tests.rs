//! Weighted-average cost engine tests
//!
//! Covers:
//! - Worked example: prior purchase, in-window purchase and sale
//! - Zero-window idempotence
//! - Discount apportionment summing to the sale discount
//! - Ending position identities

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use shared::models::{StockEntry, StockEntryType};
use shared::types::DateRange;
use shared::valuation::{
    apportion_discount, value_product, PurchaseLineFact, SaleLineFact, ValuationInput,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn stock(id: i64, day: NaiveDate, qty: Decimal, price: Option<Decimal>) -> StockEntry {
    StockEntry {
        id,
        tenant_id: Uuid::nil(),
        product_id: Uuid::nil(),
        entry_type: if qty > Decimal::ZERO {
            StockEntryType::Purchase
        } else {
            StockEntryType::Sale
        },
        quantity: qty,
        purchase_price: price,
        sale_price: None,
        entry_date: day,
        reference_id: None,
        reference_type: None,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 10 @ 5.00 before the window, then 5 @ 7.00 bought and 8 sold inside it
    #[test]
    fn test_worked_example() {
        let window = DateRange::new(date(2024, 3, 1), date(2024, 3, 31));
        let entries = vec![
            stock(1, date(2024, 2, 20), dec!(10), Some(dec!(5.00))),
            stock(2, date(2024, 3, 4), dec!(5), Some(dec!(7.00))),
            stock(3, date(2024, 3, 9), dec!(-8), None),
        ];
        let purchases = vec![
            PurchaseLineFact { purchase_date: date(2024, 2, 20), quantity: dec!(10), line_total: dec!(50) },
            PurchaseLineFact { purchase_date: date(2024, 3, 4), quantity: dec!(5), line_total: dec!(35) },
        ];
        let sales = vec![SaleLineFact {
            sale_date: date(2024, 3, 9),
            quantity: dec!(8),
            line_total: dec!(96),
            sale_subtotal: dec!(96),
            sale_discount: Decimal::ZERO,
        }];

        let v = value_product(&ValuationInput::from_facts(window, &entries, &purchases, &sales, None));

        assert_eq!(v.weighted_avg_unit_cost.round_dp(3), dec!(5.667));
        assert_eq!(v.cost_of_goods_sold.round_dp(2), dec!(45.33));
        assert_eq!(v.ending_stock_qty, dec!(7));
        assert_eq!(v.period_sale_revenue_net, dec!(96));
    }

    /// A discounted sale spreads its discount across lines by line total
    #[test]
    fn test_discount_spread_across_lines() {
        let window = DateRange::new(date(2024, 1, 1), date(2024, 1, 31));
        let lines = vec![
            SaleLineFact {
                sale_date: date(2024, 1, 5),
                quantity: dec!(3),
                line_total: dec!(75),
                sale_subtotal: dec!(100),
                sale_discount: dec!(10),
            },
        ];
        let v = value_product(&ValuationInput::from_facts(window, &[], &[], &lines, None));

        assert_eq!(v.period_sale_discount, dec!(7.5));
        assert_eq!(v.period_sale_revenue_net, dec!(67.5));
    }

    /// Facts outside the window do not leak into period totals
    #[test]
    fn test_out_of_window_facts_ignored() {
        let window = DateRange::new(date(2024, 6, 1), date(2024, 6, 30));
        let purchases = vec![PurchaseLineFact {
            purchase_date: date(2024, 7, 1),
            quantity: dec!(4),
            line_total: dec!(40),
        }];
        let v = value_product(&ValuationInput::from_facts(window, &[], &purchases, &[], None));

        assert_eq!(v.period_purchase_qty, Decimal::ZERO);
        assert_eq!(v.weighted_avg_unit_cost, Decimal::ZERO);
    }

    /// An oversold history is floored at zero on entry to the window.
    /// This mirrors long-standing report behaviour and hides the deficit.
    #[test]
    fn test_oversold_history_clamped_to_zero() {
        let window = DateRange::new(date(2024, 2, 1), date(2024, 2, 29));
        let entries = vec![
            stock(1, date(2024, 1, 3), dec!(2), Some(dec!(4))),
            stock(2, date(2024, 1, 9), dec!(-5), None),
        ];
        let v = value_product(&ValuationInput::from_facts(window, &entries, &[], &[], None));

        assert_eq!(v.before_stock_qty, Decimal::ZERO);
        assert_eq!(v.ending_stock_qty, Decimal::ZERO);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating positive quantities (0.1 to 1000.0)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating unit prices (0.01 to 1000.00)
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A single-day window with no activity only carries the prior position forward
        #[test]
        fn prop_zero_window_is_idempotent(
            history in prop::collection::vec((quantity_strategy(), price_strategy(), 1i64..=60), 0..15),
            sells in prop::collection::vec((quantity_strategy(), 1i64..=60), 0..10),
        ) {
            let origin = date(2024, 1, 1);
            let quiet_day = date(2024, 6, 1);
            let mut entries = Vec::new();
            let mut purchases = Vec::new();
            let mut id = 0;
            for (q, p, offset) in &history {
                id += 1;
                let day = origin + Duration::days(*offset);
                entries.push(stock(id, day, *q, Some(*p)));
                purchases.push(PurchaseLineFact { purchase_date: day, quantity: *q, line_total: *q * *p });
            }
            for (q, offset) in &sells {
                id += 1;
                entries.push(stock(id, origin + Duration::days(*offset), -*q, None));
            }

            let window = DateRange::new(quiet_day, quiet_day);
            let v = value_product(&ValuationInput::from_facts(window, &entries, &purchases, &[], None));

            prop_assert_eq!(v.period_purchase_qty, Decimal::ZERO);
            prop_assert_eq!(v.period_sale_qty, Decimal::ZERO);
            prop_assert_eq!(v.ending_stock_qty, v.before_stock_qty);
            prop_assert_eq!(v.ending_stock_value, v.before_stock_value);
            prop_assert!(v.before_stock_qty >= Decimal::ZERO);
        }

        /// Per-line shares of a sale discount add back up to the discount
        #[test]
        fn prop_discount_apportionment_sums_to_total(
            line_totals in prop::collection::vec(price_strategy(), 1..12),
            discount_percent in 0i64..=100,
        ) {
            let subtotal: Decimal = line_totals.iter().copied().sum();
            let discount = subtotal * Decimal::new(discount_percent, 2);

            let apportioned: Decimal = line_totals
                .iter()
                .map(|lt| apportion_discount(*lt, subtotal, discount))
                .sum();

            prop_assert!((apportioned - discount).abs() <= dec!(0.0000000001));
        }

        /// Ending quantity and value follow from the period flows
        #[test]
        fn prop_ending_position_identities(
            prior_qty in quantity_strategy(),
            prior_price in price_strategy(),
            bought in quantity_strategy(),
            bought_price in price_strategy(),
            sold in quantity_strategy(),
            sale_price in price_strategy(),
        ) {
            let window = DateRange::new(date(2024, 5, 1), date(2024, 5, 31));
            let entries = vec![stock(1, date(2024, 4, 1), prior_qty, Some(prior_price))];
            let purchases = vec![PurchaseLineFact {
                purchase_date: date(2024, 5, 2),
                quantity: bought,
                line_total: bought * bought_price,
            }];
            let sales = vec![SaleLineFact {
                sale_date: date(2024, 5, 3),
                quantity: sold,
                line_total: sold * sale_price,
                sale_subtotal: sold * sale_price,
                sale_discount: Decimal::ZERO,
            }];

            let v = value_product(&ValuationInput::from_facts(window, &entries, &purchases, &sales, None));

            prop_assert_eq!(v.before_stock_qty, prior_qty);
            prop_assert_eq!(v.ending_stock_qty, prior_qty + bought - sold);
            prop_assert_eq!(
                v.ending_stock_value,
                v.before_stock_value + v.period_purchase_value - v.cost_of_goods_sold
            );
            prop_assert_eq!(v.gross_profit, v.period_sale_revenue_net - v.cost_of_goods_sold);
        }
    }
}
