//! Sale and purchase commit pipelines
//!
//! A commit writes the document header and lines, one stock entry per line (folded into
//! the stock summary), and a bank entry for the paid amount. All of it happens in one
//! database transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    category, lines_by_product, resolve_discount, BankTransaction, DiscountKind, NewBankEntry,
    NewStockMovement, Purchase, Sale, StockEntryType, TradeLineInput, TransactionType,
};
use crate::services::{bank, stock};
use shared::validation::{validate_paid, validate_trade_lines};

/// Trade service for committing sales and purchases
#[derive(Clone)]
pub struct TradeService {
    db: PgPool,
}

/// Input for recording a sale
#[derive(Debug, Deserialize, Validate)]
pub struct RecordSaleInput {
    pub customer_id: Option<Uuid>,
    pub sale_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 500))]
    pub lines: Vec<TradeLineInput>,
    #[serde(default)]
    pub discount_kind: DiscountKind,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub paid: Decimal,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Input for recording a purchase
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPurchaseInput {
    pub vendor_id: Option<Uuid>,
    pub purchase_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 500))]
    pub lines: Vec<TradeLineInput>,
    #[serde(default)]
    pub paid: Decimal,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// A committed sale with the bank entry it produced, if any
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub bank_transaction: Option<BankTransaction>,
}

/// A committed purchase with the bank entry it produced, if any
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub bank_transaction: Option<BankTransaction>,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Option<Uuid>,
    sale_date: NaiveDate,
    subtotal: Decimal,
    discount: Decimal,
    total: Decimal,
    paid: Decimal,
    due: Decimal,
    created_by: Option<Uuid>,
    created_at: chrono::DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(r: SaleRow) -> Self {
        Sale {
            id: r.id,
            tenant_id: r.tenant_id,
            customer_id: r.customer_id,
            sale_date: r.sale_date,
            subtotal: r.subtotal,
            discount: r.discount,
            total: r.total,
            paid: r.paid,
            due: r.due,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    tenant_id: Uuid,
    vendor_id: Option<Uuid>,
    purchase_date: NaiveDate,
    total: Decimal,
    paid: Decimal,
    due: Decimal,
    created_by: Option<Uuid>,
    created_at: chrono::DateTime<Utc>,
}

impl From<PurchaseRow> for Purchase {
    fn from(r: PurchaseRow) -> Self {
        Purchase {
            id: r.id,
            tenant_id: r.tenant_id,
            vendor_id: r.vendor_id,
            purchase_date: r.purchase_date,
            total: r.total,
            paid: r.paid,
            due: r.due,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

impl TradeService {
    /// Create a new TradeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Commit a sale: header, lines, outgoing stock and the cash collected
    pub async fn record_sale(
        &self,
        tenant_id: Uuid,
        actor: Uuid,
        input: RecordSaleInput,
    ) -> AppResult<SaleReceipt> {
        input.validate()?;
        validate_trade_lines(&input.lines).map_err(|m| AppError::invalid("lines", m))?;

        let subtotal: Decimal = input.lines.iter().map(TradeLineInput::line_total).sum();
        let discount = resolve_discount(input.discount_kind, input.discount, subtotal);
        let total = subtotal - discount;
        validate_paid(input.paid, total).map_err(|m| AppError::invalid("paid", m))?;
        let due = total - input.paid;
        let sale_date = input.sale_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        for line in &input.lines {
            stock::ensure_product(&mut tx, tenant_id, line.product_id).await?;
        }

        let sale: Sale = sqlx::query_as::<_, SaleRow>(
            r#"
            INSERT INTO sales (tenant_id, customer_id, sale_date, subtotal, discount, total, paid, due, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, tenant_id, customer_id, sale_date, subtotal, discount, total, paid, due,
                      created_by, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(input.customer_id)
        .bind(sale_date)
        .bind(subtotal)
        .bind(discount)
        .bind(total)
        .bind(input.paid)
        .bind(due)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?
        .into();

        // Summary rows are locked in product order.
        for line in lines_by_product(&input.lines) {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (sale_id, product_id, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(sale.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total())
            .execute(&mut *tx)
            .await?;

            let movement = NewStockMovement {
                product_id: line.product_id,
                entry_type: StockEntryType::Sale,
                quantity: -line.quantity,
                purchase_price: None,
                sale_price: Some(line.unit_price),
                entry_date: Some(sale_date),
                reference_id: Some(sale.id),
                reference_type: Some("sale".to_string()),
            };
            stock::record_movement_in(&mut tx, tenant_id, &movement).await?;
        }

        let bank_transaction = if input.paid > Decimal::ZERO {
            let entry = NewBankEntry {
                amount: input.paid,
                description: input
                    .note
                    .clone()
                    .unwrap_or_else(|| format!("Sale {}", sale.id)),
                category: category::SALE.to_string(),
                reference_id: Some(sale.id),
                reference_type: Some("sale".to_string()),
                transaction_date: Some(sale_date),
                created_by: Some(actor),
            };
            Some(bank::append_in(&mut tx, tenant_id, TransactionType::Credit, &entry).await?)
        } else {
            None
        };

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            sale_id = %sale.id,
            lines = input.lines.len(),
            total = %sale.total,
            paid = %sale.paid,
            "Sale recorded"
        );

        Ok(SaleReceipt {
            sale,
            bank_transaction,
        })
    }

    /// Commit a purchase: header, lines, incoming stock at cost and the cash paid out
    pub async fn record_purchase(
        &self,
        tenant_id: Uuid,
        actor: Uuid,
        input: RecordPurchaseInput,
    ) -> AppResult<PurchaseReceipt> {
        input.validate()?;
        validate_trade_lines(&input.lines).map_err(|m| AppError::invalid("lines", m))?;

        let total: Decimal = input.lines.iter().map(TradeLineInput::line_total).sum();
        validate_paid(input.paid, total).map_err(|m| AppError::invalid("paid", m))?;
        let due = total - input.paid;
        let purchase_date = input
            .purchase_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        for line in &input.lines {
            stock::ensure_product(&mut tx, tenant_id, line.product_id).await?;
        }

        let purchase: Purchase = sqlx::query_as::<_, PurchaseRow>(
            r#"
            INSERT INTO purchases (tenant_id, vendor_id, purchase_date, total, paid, due, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, tenant_id, vendor_id, purchase_date, total, paid, due, created_by, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(input.vendor_id)
        .bind(purchase_date)
        .bind(total)
        .bind(input.paid)
        .bind(due)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?
        .into();

        // Summary rows are locked in product order.
        for line in lines_by_product(&input.lines) {
            sqlx::query(
                r#"
                INSERT INTO purchase_lines (purchase_id, product_id, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(purchase.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total())
            .execute(&mut *tx)
            .await?;

            let movement = NewStockMovement {
                product_id: line.product_id,
                entry_type: StockEntryType::Purchase,
                quantity: line.quantity,
                purchase_price: Some(line.unit_price),
                sale_price: None,
                entry_date: Some(purchase_date),
                reference_id: Some(purchase.id),
                reference_type: Some("purchase".to_string()),
            };
            stock::record_movement_in(&mut tx, tenant_id, &movement).await?;
        }

        let bank_transaction = if input.paid > Decimal::ZERO {
            let entry = NewBankEntry {
                amount: input.paid,
                description: input
                    .note
                    .clone()
                    .unwrap_or_else(|| format!("Purchase {}", purchase.id)),
                category: category::PURCHASE.to_string(),
                reference_id: Some(purchase.id),
                reference_type: Some("purchase".to_string()),
                transaction_date: Some(purchase_date),
                created_by: Some(actor),
            };
            Some(bank::append_in(&mut tx, tenant_id, TransactionType::Debit, &entry).await?)
        } else {
            None
        };

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            purchase_id = %purchase.id,
            lines = input.lines.len(),
            total = %purchase.total,
            paid = %purchase.paid,
            "Purchase recorded"
        );

        Ok(PurchaseReceipt {
            purchase,
            bank_transaction,
        })
    }
}
