//! Route definitions for the shop ledger API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. Everything under `/api/v1` except `/health` requires a bearer token.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .nest("/stock", stock_routes(state.clone()))
        .nest("/bank", bank_routes(state.clone()))
        .nest("/trade", trade_routes(state.clone()))
        .nest("/reports", report_routes(state))
}

/// Stock ledger routes (protected)
fn stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/movements", post(handlers::stock::record_movement))
        .route("/summaries", get(handlers::stock::list_summaries))
        .route(
            "/products/:product_id/entries",
            get(handlers::stock::list_entries),
        )
        .route(
            "/products/:product_id/summary",
            get(handlers::stock::get_summary),
        )
        .route(
            "/products/:product_id/summary/rebuild",
            post(handlers::stock::rebuild_summary),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Bank ledger routes (protected)
fn bank_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/account", get(handlers::bank::get_account))
        .route("/balance", get(handlers::bank::get_balance))
        .route("/transactions", get(handlers::bank::list_transactions))
        .route("/credits", post(handlers::bank::append_credit))
        .route("/debits", post(handlers::bank::append_debit))
        .route("/audit", get(handlers::bank::audit))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sale and purchase routes (protected)
fn trade_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sales", post(handlers::trade::record_sale))
        .route("/purchases", post(handlers::trade::record_purchase))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Report routes (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/balance-sheet", get(handlers::reports::balance_sheet))
        .route(
            "/income-expenditure",
            get(handlers::reports::income_expenditure),
        )
        .route("/receipt-payment", get(handlers::reports::receipt_payment))
        .route("/product-analysis", get(handlers::reports::product_analysis))
        .route("/bank-statement", get(handlers::reports::bank_statement))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
