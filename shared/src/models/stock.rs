//! Stock ledger models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::valuation::weighted_average;

/// Kind of stock movement recorded in the stock ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockEntryType {
    Purchase,
    Sale,
    Adjustment,
    Opening,
}

impl StockEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockEntryType::Purchase => "purchase",
            StockEntryType::Sale => "sale",
            StockEntryType::Adjustment => "adjustment",
            StockEntryType::Opening => "opening",
        }
    }
}

impl std::fmt::Display for StockEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StockEntryType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(StockEntryType::Purchase),
            "sale" => Ok(StockEntryType::Sale),
            "adjustment" => Ok(StockEntryType::Adjustment),
            "opening" => Ok(StockEntryType::Opening),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Returned when a stored enum column holds a value this build does not know
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

/// An immutable stock movement. Positive quantity is stock in, negative is stock out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: i64,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub entry_type: StockEntryType,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub entry_date: NaiveDate,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Denormalized running stock position for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSummary {
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub total_qty: Decimal,
    pub avg_purchase_price: Decimal,
    pub total_value: Decimal,
    pub last_updated_at: DateTime<Utc>,
}

impl StockSummary {
    /// Zero-initialized summary for a product that has never moved
    pub fn empty(tenant_id: Uuid, product_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            product_id,
            total_qty: Decimal::ZERO,
            avg_purchase_price: Decimal::ZERO,
            total_value: Decimal::ZERO,
            last_updated_at: now,
        }
    }

    /// Fold one stock movement into the summary.
    ///
    /// Only incoming movements that carry a purchase price re-blend the average cost;
    /// outgoing movements change quantity alone. The quantity may go negative (oversold).
    pub fn apply_movement(
        &mut self,
        signed_quantity: Decimal,
        purchase_price: Option<Decimal>,
        now: DateTime<Utc>,
    ) {
        if let Some(price) = purchase_price {
            if signed_quantity > Decimal::ZERO {
                self.avg_purchase_price =
                    weighted_average(self.total_qty, self.avg_purchase_price, signed_quantity, price);
            }
        }

        self.total_qty += signed_quantity;
        self.total_value = self.total_qty * self.avg_purchase_price;
        self.last_updated_at = now;
    }

    /// Rebuild a summary by replaying ledger entries in `(entry_date, id)` order
    pub fn from_entries(
        tenant_id: Uuid,
        product_id: Uuid,
        entries: &[StockEntry],
        now: DateTime<Utc>,
    ) -> Self {
        let mut ordered: Vec<&StockEntry> = entries.iter().collect();
        ordered.sort_by_key(|e| (e.entry_date, e.id));

        let mut summary = Self::empty(tenant_id, product_id, now);
        for entry in ordered {
            summary.apply_movement(entry.quantity, entry.purchase_price, now);
        }
        summary
    }
}

/// Input for a manual stock movement (adjustment or opening stock)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockMovement {
    pub product_id: Uuid,
    pub entry_type: StockEntryType,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub entry_date: Option<NaiveDate>,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary() -> StockSummary {
        StockSummary::empty(Uuid::nil(), Uuid::nil(), Utc::now())
    }

    #[test]
    fn test_first_purchase_sets_average() {
        let mut s = summary();
        s.apply_movement(dec!(10), Some(dec!(5)), Utc::now());

        assert_eq!(s.total_qty, dec!(10));
        assert_eq!(s.avg_purchase_price, dec!(5));
        assert_eq!(s.total_value, dec!(50));
    }

    #[test]
    fn test_two_purchases_blend() {
        let mut s = summary();
        s.apply_movement(dec!(10), Some(dec!(5)), Utc::now());
        s.apply_movement(dec!(10), Some(dec!(7)), Utc::now());

        assert_eq!(s.total_qty, dec!(20));
        assert_eq!(s.avg_purchase_price, dec!(6));
    }

    #[test]
    fn test_sale_keeps_average() {
        let mut s = summary();
        s.apply_movement(dec!(10), Some(dec!(5)), Utc::now());
        s.apply_movement(dec!(-4), None, Utc::now());

        assert_eq!(s.total_qty, dec!(6));
        assert_eq!(s.avg_purchase_price, dec!(5));
        assert_eq!(s.total_value, dec!(30));
    }

    #[test]
    fn test_negative_quantity_with_price_does_not_reblend() {
        let mut s = summary();
        s.apply_movement(dec!(10), Some(dec!(5)), Utc::now());
        s.apply_movement(dec!(-2), Some(dec!(100)), Utc::now());

        assert_eq!(s.avg_purchase_price, dec!(5));
    }

    #[test]
    fn test_oversell_goes_negative() {
        let mut s = summary();
        s.apply_movement(dec!(3), Some(dec!(2)), Utc::now());
        s.apply_movement(dec!(-5), None, Utc::now());

        assert_eq!(s.total_qty, dec!(-2));
        assert_eq!(s.total_value, dec!(-4));
    }

    #[test]
    fn test_purchase_after_oversell_uses_new_price() {
        let mut s = summary();
        s.apply_movement(dec!(-5), None, Utc::now());
        s.apply_movement(dec!(10), Some(dec!(8)), Utc::now());

        assert_eq!(s.total_qty, dec!(5));
        assert_eq!(s.avg_purchase_price, dec!(8));
    }

    #[test]
    fn test_rebuild_from_entries_matches_incremental() {
        let now = Utc::now();
        let entry = |id: i64, day: u32, qty: Decimal, price: Option<Decimal>| StockEntry {
            id,
            tenant_id: Uuid::nil(),
            product_id: Uuid::nil(),
            entry_type: StockEntryType::Adjustment,
            quantity: qty,
            purchase_price: price,
            sale_price: None,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            reference_id: None,
            reference_type: None,
            created_at: now,
        };
        // Stored out of order; replay must sort by date then id.
        let entries = vec![
            entry(3, 5, dec!(-4), None),
            entry(1, 1, dec!(10), Some(dec!(5))),
            entry(2, 3, dec!(10), Some(dec!(7))),
        ];

        let rebuilt = StockSummary::from_entries(Uuid::nil(), Uuid::nil(), &entries, now);

        let mut incremental = summary();
        incremental.apply_movement(dec!(10), Some(dec!(5)), now);
        incremental.apply_movement(dec!(10), Some(dec!(7)), now);
        incremental.apply_movement(dec!(-4), None, now);

        assert_eq!(rebuilt.total_qty, incremental.total_qty);
        assert_eq!(rebuilt.avg_purchase_price, dec!(6));
        assert_eq!(rebuilt.total_value, dec!(96));
    }

    #[test]
    fn test_entry_type_round_trip() {
        for t in [
            StockEntryType::Purchase,
            StockEntryType::Sale,
            StockEntryType::Adjustment,
            StockEntryType::Opening,
        ] {
            assert_eq!(t.as_str().parse::<StockEntryType>().unwrap(), t);
        }
        assert!("transfer".parse::<StockEntryType>().is_err());
    }
}
