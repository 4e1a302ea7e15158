//! HTTP handlers for the bank ledger

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{Account, BankTransaction, NewBankEntry};
use crate::services::BankLedgerService;
use crate::AppState;
use shared::ledger::LedgerAudit;
use shared::types::{DateRange, Pagination};
use shared::validation::validate_date_range;

/// Request body for a manual credit or debit
#[derive(Debug, Deserialize, Validate)]
pub struct BankEntryRequest {
    pub amount: Decimal,
    #[validate(length(max = 255))]
    pub description: String,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    pub transaction_date: Option<NaiveDate>,
    pub reference_id: Option<Uuid>,
    #[validate(length(min = 1, max = 64))]
    pub reference_type: Option<String>,
}

impl BankEntryRequest {
    fn into_entry(self, actor: Uuid) -> NewBankEntry {
        NewBankEntry {
            amount: self.amount,
            description: self.description,
            category: self.category,
            reference_id: self.reference_id,
            reference_type: self.reference_type,
            transaction_date: self.transaction_date,
            created_by: Some(actor),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub date: NaiveDate,
}

#[derive(Debug, serde::Serialize)]
pub struct BalanceResponse {
    pub date: NaiveDate,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
}

/// Append a credit to the bank ledger
pub async fn append_credit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<BankEntryRequest>,
) -> AppResult<Json<BankTransaction>> {
    user.require("ledger", "write")?;
    body.validate()?;
    let service = BankLedgerService::new(state.db);
    let tx = service
        .append_credit(user.tenant_id, body.into_entry(user.user_id))
        .await?;
    Ok(Json(tx))
}

/// Append a debit to the bank ledger
pub async fn append_debit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<BankEntryRequest>,
) -> AppResult<Json<BankTransaction>> {
    user.require("ledger", "write")?;
    body.validate()?;
    let service = BankLedgerService::new(state.db);
    let tx = service
        .append_debit(user.tenant_id, body.into_entry(user.user_id))
        .await?;
    Ok(Json(tx))
}

/// List bank transactions in a date range
pub async fn list_transactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TransactionsQuery>,
) -> AppResult<Json<Vec<BankTransaction>>> {
    user.require("ledger", "read")?;

    let range = DateRange::new(query.start, query.end);
    validate_date_range(&range).map_err(|m| AppError::invalid("end", m))?;

    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let service = BankLedgerService::new(state.db);
    let transactions = service
        .list_transactions(user.tenant_id, range, Some(pagination))
        .await?;
    Ok(Json(transactions))
}

/// Current state of the tenant's system bank account
pub async fn get_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Account>> {
    user.require("ledger", "read")?;
    let service = BankLedgerService::new(state.db);
    Ok(Json(service.get_account(user.tenant_id).await?))
}

/// Balance at the start and end of a day
pub async fn get_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<BalanceQuery>,
) -> AppResult<Json<BalanceResponse>> {
    user.require("ledger", "read")?;
    let service = BankLedgerService::new(state.db);
    let opening_balance = service.opening_balance(user.tenant_id, query.date).await?;
    let closing_balance = service.closing_balance(user.tenant_id, query.date).await?;
    Ok(Json(BalanceResponse {
        date: query.date,
        opening_balance,
        closing_balance,
    }))
}

/// Replay the ledger and report broken links or drift.
///
/// With `strict=true` a broken balance chain fails the request instead.
pub async fn audit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<LedgerAudit>> {
    user.require("ledger", "audit")?;
    let service = BankLedgerService::new(state.db);
    let result = service.audit(user.tenant_id).await?;

    if query.strict {
        if let Some(err) = result.first_error.clone() {
            return Err(AppError::LedgerIntegrity(err));
        }
    }
    Ok(Json(result))
}
