//! HTTP handlers for financial reports
//!
//! Every report is JSON by default; the product analysis, income and expenditure, and
//! bank statement reports also export as CSV with `?format=csv`. CSV records carry
//! the configured report currency.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::reports::{
    BankStatementCsvRow, IncomeExpenditureCsvRow, ProductAnalysisCsvRow, ReportService,
};
use crate::AppState;
use shared::reports::{BalanceSheet, ReceiptPayment};
use shared::types::DateRange;
use shared::validation::validate_date_range;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub format: ExportFormat,
}

impl PeriodQuery {
    fn range(&self) -> AppResult<DateRange> {
        let range = DateRange::new(self.start, self.end);
        validate_date_range(&range).map_err(|m| AppError::invalid("end", m))?;
        Ok(range)
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceSheetQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub format: ExportFormat,
}

/// Balance sheet as of a date (defaults to today)
pub async fn balance_sheet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<BalanceSheetQuery>,
) -> AppResult<Json<BalanceSheet>> {
    user.require("reports", "read")?;
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let service = ReportService::new(state.db);
    let sheet = service
        .balance_sheet(
            user.tenant_id,
            as_of,
            state.config.reports.fiscal_year_start_month,
        )
        .await?;
    Ok(Json(sheet))
}

/// Income and expenditure for a period
pub async fn income_expenditure(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Response> {
    user.require("reports", "read")?;
    let period = query.range()?;
    let currency = &state.config.reports.currency;

    let service = ReportService::new(state.db.clone());
    let report = service.income_expenditure(user.tenant_id, period).await?;

    respond(query.format, &report, "income-expenditure", period, || {
        IncomeExpenditureCsvRow::from_report(&report, currency)
    })
}

/// Receipts and payments for a period
pub async fn receipt_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ReceiptPayment>> {
    user.require("reports", "read")?;
    let period = query.range()?;

    let service = ReportService::new(state.db);
    Ok(Json(service.receipt_payment(user.tenant_id, period).await?))
}

/// Product profitability for a period
pub async fn product_analysis(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Response> {
    user.require("reports", "read")?;
    let period = query.range()?;
    let currency = &state.config.reports.currency;

    let service = ReportService::new(state.db.clone());
    let report = service.product_analysis(user.tenant_id, period).await?;

    respond(query.format, &report, "product-analysis", period, || {
        ProductAnalysisCsvRow::from_report(&report, currency)
    })
}

/// Daily bank statement for a month
pub async fn bank_statement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> AppResult<Response> {
    user.require("reports", "read")?;
    let currency = &state.config.reports.currency;

    let service = ReportService::new(state.db.clone());
    let report = service
        .bank_statement(user.tenant_id, query.year, query.month)
        .await?;

    respond(query.format, &report, "bank-statement", report.period, || {
        BankStatementCsvRow::from_report(&report, currency)
    })
}

fn respond<T, R, F>(
    format: ExportFormat,
    report: &T,
    name: &str,
    period: DateRange,
    csv_rows: F,
) -> AppResult<Response>
where
    T: Serialize,
    R: Serialize,
    F: FnOnce() -> Vec<R>,
{
    match format {
        ExportFormat::Json => Ok(Json(report).into_response()),
        ExportFormat::Csv => {
            let body = ReportService::export_to_csv(&csv_rows())?;
            let filename = format!("{}_{}_{}.csv", name, period.start, period.end);
            Ok(csv_response(&filename, body))
        }
    }
}

/// Wrap CSV text in a download response
pub fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
