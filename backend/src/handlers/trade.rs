//! HTTP handlers for sales and purchases

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::trade::{
    PurchaseReceipt, RecordPurchaseInput, RecordSaleInput, SaleReceipt, TradeService,
};
use crate::AppState;

/// Record a sale
pub async fn record_sale(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<(StatusCode, Json<SaleReceipt>)> {
    user.require("trade", "write")?;
    let service = TradeService::new(state.db);
    let receipt = service
        .record_sale(user.tenant_id, user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Record a purchase
pub async fn record_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RecordPurchaseInput>,
) -> AppResult<(StatusCode, Json<PurchaseReceipt>)> {
    user.require("trade", "write")?;
    let service = TradeService::new(state.db);
    let receipt = service
        .record_purchase(user.tenant_id, user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
