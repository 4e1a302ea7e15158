//! Per-product weighted-average valuation over a period
//!
//! Runs one grouped query per fact kind for the whole tenant, then folds each product
//! through the shared valuation engine.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::ProductRef;
use shared::types::DateRange;
use shared::valuation::{
    value_product, PeriodPurchases, PeriodSales, PriorStock, ProductValuation, ValuationInput,
};

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    sku: Option<String>,
}

#[derive(Debug, FromRow)]
struct PriorStockRow {
    product_id: Uuid,
    net_qty: Decimal,
    inbound_qty: Decimal,
    inbound_value: Decimal,
}

#[derive(Debug, FromRow)]
struct PurchaseTotalsRow {
    product_id: Uuid,
    qty: Decimal,
    value: Decimal,
}

#[derive(Debug, FromRow)]
struct SaleTotalsRow {
    product_id: Uuid,
    qty: Decimal,
    revenue_gross: Decimal,
    discount: Decimal,
}

#[derive(Debug, FromRow)]
struct AvgPriceRow {
    product_id: Uuid,
    avg_purchase_price: Decimal,
}

/// Valuation service
#[derive(Clone)]
pub struct ValuationService {
    db: PgPool,
}

impl ValuationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Value every product of the tenant over `period`, ordered by product name
    pub async fn product_valuations(
        &self,
        tenant_id: Uuid,
        period: DateRange,
        active_only: bool,
    ) -> AppResult<Vec<(ProductRef, ProductValuation)>> {
        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, sku
            FROM products
            WHERE tenant_id = $1 AND (NOT $2 OR is_active)
            ORDER BY name, id
            "#,
        )
        .bind(tenant_id)
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        if products.is_empty() {
            return Ok(Vec::new());
        }

        let prior: HashMap<Uuid, PriorStock> = sqlx::query_as::<_, PriorStockRow>(
            r#"
            SELECT
                product_id,
                COALESCE(SUM(quantity), 0) AS net_qty,
                COALESCE(SUM(quantity) FILTER (
                    WHERE quantity > 0 AND purchase_price IS NOT NULL
                ), 0) AS inbound_qty,
                COALESCE(SUM(quantity * purchase_price) FILTER (
                    WHERE quantity > 0 AND purchase_price IS NOT NULL
                ), 0) AS inbound_value
            FROM stock_entries
            WHERE tenant_id = $1 AND entry_date < $2
            GROUP BY product_id
            "#,
        )
        .bind(tenant_id)
        .bind(period.start)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|r| {
            (
                r.product_id,
                PriorStock {
                    net_qty: r.net_qty,
                    inbound_qty: r.inbound_qty,
                    inbound_value: r.inbound_value,
                },
            )
        })
        .collect();

        let purchases: HashMap<Uuid, PeriodPurchases> = sqlx::query_as::<_, PurchaseTotalsRow>(
            r#"
            SELECT
                pl.product_id,
                COALESCE(SUM(pl.quantity), 0) AS qty,
                COALESCE(SUM(pl.line_total), 0) AS value
            FROM purchase_lines pl
            JOIN purchases p ON p.id = pl.purchase_id
            WHERE p.tenant_id = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY pl.product_id
            "#,
        )
        .bind(tenant_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|r| {
            (
                r.product_id,
                PeriodPurchases {
                    qty: r.qty,
                    value: r.value,
                },
            )
        })
        .collect();

        // Each line carries its share of the parent sale's discount, pro rata to line_total.
        let sales: HashMap<Uuid, PeriodSales> = sqlx::query_as::<_, SaleTotalsRow>(
            r#"
            SELECT
                sl.product_id,
                COALESCE(SUM(sl.quantity), 0) AS qty,
                COALESCE(SUM(sl.line_total), 0) AS revenue_gross,
                COALESCE(SUM(
                    CASE WHEN s.subtotal > 0
                         THEN sl.line_total / s.subtotal * s.discount
                         ELSE 0 END
                ), 0) AS discount
            FROM sale_lines sl
            JOIN sales s ON s.id = sl.sale_id
            WHERE s.tenant_id = $1 AND s.sale_date BETWEEN $2 AND $3
            GROUP BY sl.product_id
            "#,
        )
        .bind(tenant_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|r| {
            (
                r.product_id,
                PeriodSales {
                    qty: r.qty,
                    revenue_gross: r.revenue_gross,
                    discount: r.discount,
                },
            )
        })
        .collect();

        let fallback: HashMap<Uuid, Decimal> = sqlx::query_as::<_, AvgPriceRow>(
            "SELECT product_id, avg_purchase_price FROM stock_summaries WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|r| (r.product_id, r.avg_purchase_price))
        .collect();

        let valuations: Vec<(ProductRef, ProductValuation)> = products
            .into_iter()
            .map(|p| {
                let input = ValuationInput {
                    prior: prior.get(&p.id).copied().unwrap_or_default(),
                    purchases: purchases.get(&p.id).copied().unwrap_or_default(),
                    sales: sales.get(&p.id).copied().unwrap_or_default(),
                    fallback_avg_price: fallback.get(&p.id).copied(),
                };
                let product = ProductRef {
                    id: p.id,
                    name: p.name,
                    sku: p.sku,
                };
                (product, value_product(&input))
            })
            .collect();

        tracing::debug!(
            %tenant_id,
            start = %period.start,
            end = %period.end,
            products = valuations.len(),
            "Valued products"
        );

        Ok(valuations)
    }
}
