//! Stock ledger service: the only write path for stock entries and stock summaries

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    convert_all, NewStockMovement, StockEntry, StockEntryRow, StockSummary, StockSummaryRow,
    STOCK_ENTRY_COLUMNS,
};
use shared::types::DateRange;
use shared::validation::{validate_movement_quantity, validate_price};

/// Stock service for recording movements and reading stock positions
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// A recorded movement together with the summary it produced
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMovement {
    pub entry: StockEntry,
    pub summary: StockSummary,
}

/// Cached summary before and after a rebuild from the ledger
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRebuild {
    pub previous: StockSummary,
    pub rebuilt: StockSummary,
    pub entries_replayed: usize,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a manual stock movement (adjustment or opening stock) and update the summary
    pub async fn record_movement(
        &self,
        tenant_id: Uuid,
        input: NewStockMovement,
    ) -> AppResult<RecordedMovement> {
        validate_movement_quantity(input.quantity)
            .map_err(|m| AppError::invalid("quantity", m))?;
        validate_price(input.purchase_price).map_err(|m| AppError::invalid("purchase_price", m))?;
        validate_price(input.sale_price).map_err(|m| AppError::invalid("sale_price", m))?;

        let mut tx = self.db.begin().await?;
        ensure_product(&mut tx, tenant_id, input.product_id).await?;
        let recorded = record_movement_in(&mut tx, tenant_id, &input).await?;
        tx.commit().await?;

        Ok(recorded)
    }

    /// List stock entries for a product, oldest first
    pub async fn list_entries(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        range: Option<DateRange>,
    ) -> AppResult<Vec<StockEntry>> {
        let (start, end) = match range {
            Some(r) => (Some(r.start), Some(r.end)),
            None => (None, None),
        };

        let rows = sqlx::query_as::<_, StockEntryRow>(&format!(
            r#"
            SELECT {STOCK_ENTRY_COLUMNS}
            FROM stock_entries
            WHERE tenant_id = $1 AND product_id = $2
              AND ($3::date IS NULL OR entry_date >= $3)
              AND ($4::date IS NULL OR entry_date <= $4)
            ORDER BY entry_date, id
            "#
        ))
        .bind(tenant_id)
        .bind(product_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        convert_all(rows)
    }

    /// Current summary for a product; a product that never moved reads as zero stock
    pub async fn get_summary(&self, tenant_id: Uuid, product_id: Uuid) -> AppResult<StockSummary> {
        let row = sqlx::query_as::<_, StockSummaryRow>(
            r#"
            SELECT tenant_id, product_id, total_qty, avg_purchase_price, total_value, last_updated_at
            FROM stock_summaries
            WHERE tenant_id = $1 AND product_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row
            .map(StockSummary::from)
            .unwrap_or_else(|| StockSummary::empty(tenant_id, product_id, Utc::now())))
    }

    /// All summaries for a tenant
    pub async fn list_summaries(&self, tenant_id: Uuid) -> AppResult<Vec<StockSummary>> {
        let rows = sqlx::query_as::<_, StockSummaryRow>(
            r#"
            SELECT tenant_id, product_id, total_qty, avg_purchase_price, total_value, last_updated_at
            FROM stock_summaries
            WHERE tenant_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockSummary::from).collect())
    }

    /// Recompute a product's cached summary by replaying its stock ledger
    pub async fn rebuild_summary(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<SummaryRebuild> {
        let mut tx = self.db.begin().await?;
        ensure_product(&mut tx, tenant_id, product_id).await?;

        let previous = lock_summary(&mut tx, tenant_id, product_id).await?;

        let rows = sqlx::query_as::<_, StockEntryRow>(&format!(
            "SELECT {STOCK_ENTRY_COLUMNS} FROM stock_entries \
             WHERE tenant_id = $1 AND product_id = $2 ORDER BY entry_date, id"
        ))
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&mut *tx)
        .await?;
        let entries: Vec<StockEntry> = convert_all(rows)?;

        let rebuilt = StockSummary::from_entries(tenant_id, product_id, &entries, Utc::now());
        store_summary(&mut tx, &rebuilt).await?;
        tx.commit().await?;

        if previous.total_qty != rebuilt.total_qty
            || previous.avg_purchase_price != rebuilt.avg_purchase_price
        {
            tracing::warn!(
                %tenant_id, %product_id,
                cached_qty = %previous.total_qty, rebuilt_qty = %rebuilt.total_qty,
                "Stock summary drift repaired"
            );
        }

        Ok(SummaryRebuild {
            previous,
            rebuilt,
            entries_replayed: entries.len(),
        })
    }
}

/// Fail with NotFound unless the product belongs to the tenant
pub(crate) async fn ensure_product(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    product_id: Uuid,
) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND tenant_id = $2)",
    )
    .bind(product_id)
    .bind(tenant_id)
    .fetch_one(&mut *conn)
    .await?;

    if !exists {
        return Err(AppError::NotFound("Product".to_string()));
    }
    Ok(())
}

/// Append a stock entry and fold it into the product summary.
///
/// Must be called inside the caller's transaction so both writes commit together.
pub(crate) async fn record_movement_in(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    movement: &NewStockMovement,
) -> AppResult<RecordedMovement> {
    let entry_date = movement.entry_date.unwrap_or_else(|| Utc::now().date_naive());

    let row = sqlx::query_as::<_, StockEntryRow>(&format!(
        r#"
        INSERT INTO stock_entries (
            tenant_id, product_id, entry_type, quantity, purchase_price, sale_price,
            entry_date, reference_id, reference_type
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {STOCK_ENTRY_COLUMNS}
        "#
    ))
    .bind(tenant_id)
    .bind(movement.product_id)
    .bind(movement.entry_type.as_str())
    .bind(movement.quantity)
    .bind(movement.purchase_price)
    .bind(movement.sale_price)
    .bind(entry_date)
    .bind(movement.reference_id)
    .bind(&movement.reference_type)
    .fetch_one(&mut *conn)
    .await?;
    let entry = StockEntry::try_from(row)?;

    let summary = apply_movement_in(
        conn,
        tenant_id,
        movement.product_id,
        movement.quantity,
        movement.purchase_price,
    )
    .await?;

    tracing::info!(
        %tenant_id,
        product_id = %movement.product_id,
        entry_type = %movement.entry_type,
        quantity = %movement.quantity,
        total_qty = %summary.total_qty,
        avg_price = %summary.avg_purchase_price,
        "Stock movement recorded"
    );

    Ok(RecordedMovement { entry, summary })
}

/// Lock (creating if absent) the product summary and apply one signed movement
pub(crate) async fn apply_movement_in(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    product_id: Uuid,
    signed_quantity: Decimal,
    purchase_price: Option<Decimal>,
) -> AppResult<StockSummary> {
    let mut summary = lock_summary(conn, tenant_id, product_id).await?;
    summary.apply_movement(signed_quantity, purchase_price, Utc::now());
    store_summary(conn, &summary).await?;
    Ok(summary)
}

async fn lock_summary(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    product_id: Uuid,
) -> AppResult<StockSummary> {
    sqlx::query(
        r#"
        INSERT INTO stock_summaries (tenant_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT (tenant_id, product_id) DO NOTHING
        "#,
    )
    .bind(tenant_id)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, StockSummaryRow>(
        r#"
        SELECT tenant_id, product_id, total_qty, avg_purchase_price, total_value, last_updated_at
        FROM stock_summaries
        WHERE tenant_id = $1 AND product_id = $2
        FOR UPDATE
        "#,
    )
    .bind(tenant_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

async fn store_summary(conn: &mut PgConnection, summary: &StockSummary) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE stock_summaries
        SET total_qty = $1, avg_purchase_price = $2, total_value = $3, last_updated_at = $4
        WHERE tenant_id = $5 AND product_id = $6
        "#,
    )
    .bind(summary.total_qty)
    .bind(summary.avg_purchase_price)
    .bind(summary.total_value)
    .bind(summary.last_updated_at)
    .bind(summary.tenant_id)
    .bind(summary.product_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
