//! Products, sales and purchases

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Lightweight product identity carried on report rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
}

/// A committed sale header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub sale_date: NaiveDate,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub paid: Decimal,
    pub due: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A committed purchase header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub purchase_date: NaiveDate,
    pub total: Decimal,
    pub paid: Decimal,
    pub due: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One line of a sale or purchase request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl TradeLineInput {
    /// `quantity * unit_price`, saturating instead of overflowing
    pub fn line_total(&self) -> Decimal {
        self.quantity.saturating_mul(self.unit_price)
    }
}

/// Lines ordered by product id, keeping request order among lines of one product.
/// Commits write stock in this order so concurrent documents lock summaries alike.
pub fn lines_by_product(lines: &[TradeLineInput]) -> Vec<&TradeLineInput> {
    let mut ordered: Vec<&TradeLineInput> = lines.iter().collect();
    ordered.sort_by_key(|line| line.product_id);
    ordered
}

/// How a sale discount is expressed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    #[default]
    Flat,
    Percentage,
}

/// Resolve a flat or percentage discount against a subtotal
pub fn resolve_discount(kind: DiscountKind, value: Decimal, subtotal: Decimal) -> Decimal {
    let discount = match kind {
        DiscountKind::Flat => value,
        DiscountKind::Percentage => {
            value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED) / Decimal::ONE_HUNDRED * subtotal
        }
    };
    discount.max(Decimal::ZERO).min(subtotal.max(Decimal::ZERO))
}
