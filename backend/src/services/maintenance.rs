//! Scheduled maintenance over the stock ledger

use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;

/// Rows rewritten by one stock date fix run, per document kind
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StockDateFixReport {
    pub sale_entries: u64,
    pub purchase_entries: u64,
}

impl StockDateFixReport {
    pub fn total(&self) -> u64 {
        self.sale_entries + self.purchase_entries
    }
}

#[derive(Clone)]
pub struct MaintenanceService {
    db: PgPool,
}

impl MaintenanceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Realign `entry_date` on sale and purchase stock entries with their parent
    /// document's date. Runs across all tenants; meant to be triggered once a day.
    pub async fn fix_stock_dates(&self) -> AppResult<StockDateFixReport> {
        let mut tx = self.db.begin().await?;

        let sale_entries = sqlx::query(
            r#"
            UPDATE stock_entries se
            SET entry_date = s.sale_date
            FROM sales s
            WHERE se.reference_type = 'sale'
              AND se.reference_id = s.id
              AND se.tenant_id = s.tenant_id
              AND se.entry_type = 'sale'
              AND se.entry_date <> s.sale_date
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let purchase_entries = sqlx::query(
            r#"
            UPDATE stock_entries se
            SET entry_date = p.purchase_date
            FROM purchases p
            WHERE se.reference_type = 'purchase'
              AND se.reference_id = p.id
              AND se.tenant_id = p.tenant_id
              AND se.entry_type = 'purchase'
              AND se.entry_date <> p.purchase_date
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        let report = StockDateFixReport {
            sale_entries,
            purchase_entries,
        };
        tracing::info!(
            sale_entries = report.sale_entries,
            purchase_entries = report.purchase_entries,
            "Stock entry dates realigned"
        );

        Ok(report)
    }
}
