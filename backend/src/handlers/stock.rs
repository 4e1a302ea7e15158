//! HTTP handlers for the stock ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{NewStockMovement, StockEntry, StockEntryType, StockSummary};
use crate::services::stock::{RecordedMovement, StockService, SummaryRebuild};
use crate::AppState;
use shared::types::DateRange;

/// Request body for a manual stock movement
#[derive(Debug, Deserialize, Validate)]
pub struct StockMovementRequest {
    pub product_id: Uuid,
    pub entry_type: StockEntryType,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub entry_date: Option<NaiveDate>,
    pub reference_id: Option<Uuid>,
    #[validate(length(min = 1, max = 64))]
    pub reference_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Record an adjustment or opening stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<StockMovementRequest>,
) -> AppResult<Json<RecordedMovement>> {
    user.require("stock", "write")?;
    body.validate()?;

    // Sales and purchases enter the ledger through their own commit pipelines.
    if matches!(body.entry_type, StockEntryType::Sale | StockEntryType::Purchase) {
        return Err(AppError::invalid(
            "entry_type",
            "Only adjustment and opening movements can be recorded directly",
        ));
    }

    let service = StockService::new(state.db);
    let recorded = service
        .record_movement(
            user.tenant_id,
            NewStockMovement {
                product_id: body.product_id,
                entry_type: body.entry_type,
                quantity: body.quantity,
                purchase_price: body.purchase_price,
                sale_price: body.sale_price,
                entry_date: body.entry_date,
                reference_id: body.reference_id,
                reference_type: body.reference_type,
            },
        )
        .await?;
    Ok(Json(recorded))
}

/// List stock entries for a product
pub async fn list_entries(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<EntriesQuery>,
) -> AppResult<Json<Vec<StockEntry>>> {
    user.require("stock", "read")?;

    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        (None, None) => None,
        _ => {
            return Err(AppError::invalid(
                "start",
                "start and end must be given together",
            ))
        }
    };

    let service = StockService::new(state.db);
    let entries = service.list_entries(user.tenant_id, product_id, range).await?;
    Ok(Json(entries))
}

/// Get the stock summary for a product
pub async fn get_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<StockSummary>> {
    user.require("stock", "read")?;
    let service = StockService::new(state.db);
    let summary = service.get_summary(user.tenant_id, product_id).await?;
    Ok(Json(summary))
}

/// List all stock summaries for the tenant
pub async fn list_summaries(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<StockSummary>>> {
    user.require("stock", "read")?;
    let service = StockService::new(state.db);
    Ok(Json(service.list_summaries(user.tenant_id).await?))
}

/// Rebuild a product's stock summary from its ledger
pub async fn rebuild_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<SummaryRebuild>> {
    user.require("stock", "write")?;
    let service = StockService::new(state.db);
    let rebuild = service.rebuild_summary(user.tenant_id, product_id).await?;
    Ok(Json(rebuild))
}
