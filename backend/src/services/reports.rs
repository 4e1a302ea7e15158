//! Report service
//!
//! Fetches batched inputs for one tenant and one date range and hands them to the
//! pure aggregators in `shared::reports`. Nothing is cached between requests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{BankLedgerService, ValuationService};
use shared::reports::{
    self, BalanceSheet, BalanceSheetInputs, BankStatement, IncomeExpenditure, ProductAnalysis,
    ReceiptPayment,
};
use shared::types::DateRange;

/// Report service for generating financial reports
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
    bank: BankLedgerService,
    valuation: ValuationService,
}

impl ReportService {
    /// Create a new ReportService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            bank: BankLedgerService::new(db.clone()),
            valuation: ValuationService::new(db.clone()),
            db,
        }
    }

    /// Balance sheet as of `as_of`, with profit and stock valued over the fiscal year to date
    pub async fn balance_sheet(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
        fiscal_year_start_month: u32,
    ) -> AppResult<BalanceSheet> {
        let year_to_date = DateRange::fiscal_year_to_date(as_of, fiscal_year_start_month);

        let bank_balance = self.bank.closing_balance(tenant_id, as_of).await?;
        let customer_due = self.customer_due(tenant_id, as_of).await?;
        let to_date = self.bank.category_totals_to_date(tenant_id, as_of).await?;
        let year_to_date_totals = self.bank.category_totals(tenant_id, year_to_date).await?;
        let product_valuations = self
            .valuation
            .product_valuations(tenant_id, year_to_date, true)
            .await?
            .into_iter()
            .map(|(_, v)| v)
            .collect();

        let sheet = reports::balance_sheet::build(&BalanceSheetInputs {
            as_of,
            year_to_date,
            bank_balance,
            customer_due,
            to_date,
            year_to_date_totals,
            product_valuations,
        });

        tracing::info!(
            %tenant_id,
            %as_of,
            assets = %sheet.assets.total,
            liabilities = %sheet.liabilities.total,
            "Balance sheet generated"
        );

        Ok(sheet)
    }

    pub async fn income_expenditure(
        &self,
        tenant_id: Uuid,
        period: DateRange,
    ) -> AppResult<IncomeExpenditure> {
        let totals = self.bank.category_totals(tenant_id, period).await?;
        Ok(reports::income_expenditure::build(period, &totals))
    }

    /// Receipts and payments, balanced by opening and closing cash
    pub async fn receipt_payment(
        &self,
        tenant_id: Uuid,
        period: DateRange,
    ) -> AppResult<ReceiptPayment> {
        let opening = self.bank.opening_balance(tenant_id, period.start).await?;
        let closing = self.bank.closing_balance(tenant_id, period.end).await?;
        let totals = self.bank.category_totals(tenant_id, period).await?;
        Ok(reports::receipt_payment::build(period, opening, closing, &totals))
    }

    /// Per-product profitability for active products
    pub async fn product_analysis(
        &self,
        tenant_id: Uuid,
        period: DateRange,
    ) -> AppResult<ProductAnalysis> {
        let valuations = self
            .valuation
            .product_valuations(tenant_id, period, true)
            .await?;
        Ok(reports::product_analysis::build(period, valuations))
    }

    /// Daily bank statement for one calendar month
    pub async fn bank_statement(
        &self,
        tenant_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<BankStatement> {
        let period = DateRange::month(year, month)
            .ok_or_else(|| AppError::invalid("month", "Invalid year or month"))?;

        let previous = self.bank.opening_balance(tenant_id, period.start).await?;
        let transactions = self.bank.list_transactions(tenant_id, period, None).await?;
        Ok(reports::bank_statement::build(period, previous, &transactions))
    }

    async fn customer_due(&self, tenant_id: Uuid, as_of: NaiveDate) -> AppResult<Decimal> {
        let due = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(due), 0) FROM sales WHERE tenant_id = $1 AND sale_date <= $2",
        )
        .bind(tenant_id)
        .bind(as_of)
        .fetch_one(&self.db)
        .await?;
        Ok(due)
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

/// Flat CSV record for one product analysis row
#[derive(Debug, Serialize)]
pub struct ProductAnalysisCsvRow {
    pub product: String,
    pub sku: String,
    pub before_stock_qty: Decimal,
    pub before_stock_unit_price: Decimal,
    pub before_stock_value: Decimal,
    pub purchase_qty: Decimal,
    pub purchase_value: Decimal,
    pub sale_qty: Decimal,
    pub sale_revenue_gross: Decimal,
    pub sale_discount: Decimal,
    pub sale_revenue_net: Decimal,
    pub avg_unit_cost: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub gross_profit: Decimal,
    pub margin_percent: Decimal,
    pub ending_stock_qty: Decimal,
    pub ending_stock_value: Decimal,
    pub currency: String,
}

impl ProductAnalysisCsvRow {
    /// One record per product followed by a "Total" record
    pub fn from_report(report: &ProductAnalysis, currency: &str) -> Vec<Self> {
        let mut rows: Vec<Self> = report
            .rows
            .iter()
            .map(|r| {
                Self::new(
                    r.product.name.clone(),
                    r.product.sku.clone().unwrap_or_default(),
                    &r.valuation,
                    r.margin_percent,
                    currency,
                )
            })
            .collect();
        rows.push(Self::new(
            "Total".to_string(),
            String::new(),
            &report.totals,
            report.overall_margin_percent,
            currency,
        ));
        rows
    }

    fn new(
        product: String,
        sku: String,
        v: &shared::valuation::ProductValuation,
        margin_percent: Decimal,
        currency: &str,
    ) -> Self {
        Self {
            product,
            sku,
            before_stock_qty: v.before_stock_qty,
            before_stock_unit_price: v.before_stock_unit_price,
            before_stock_value: v.before_stock_value,
            purchase_qty: v.period_purchase_qty,
            purchase_value: v.period_purchase_value,
            sale_qty: v.period_sale_qty,
            sale_revenue_gross: v.period_sale_revenue_gross,
            sale_discount: v.period_sale_discount,
            sale_revenue_net: v.period_sale_revenue_net,
            avg_unit_cost: v.weighted_avg_unit_cost,
            cost_of_goods_sold: v.cost_of_goods_sold,
            gross_profit: v.gross_profit,
            margin_percent,
            ending_stock_qty: v.ending_stock_qty,
            ending_stock_value: v.ending_stock_value,
            currency: currency.to_string(),
        }
    }
}

/// Flat CSV record for an income or expenditure line
#[derive(Debug, Serialize)]
pub struct IncomeExpenditureCsvRow {
    pub section: &'static str,
    pub category: String,
    pub label: String,
    pub amount: Decimal,
    pub currency: String,
}

impl IncomeExpenditureCsvRow {
    pub fn from_report(report: &IncomeExpenditure, currency: &str) -> Vec<Self> {
        let section = |name: &'static str, lines: &[reports::ReportLine], total: Decimal| {
            lines
                .iter()
                .map(move |l| Self {
                    section: name,
                    category: l.category.clone(),
                    label: l.label.clone(),
                    amount: l.amount,
                    currency: currency.to_string(),
                })
                .chain(std::iter::once(Self {
                    section: name,
                    category: String::new(),
                    label: "Total".to_string(),
                    amount: total,
                    currency: currency.to_string(),
                }))
                .collect::<Vec<_>>()
        };

        let mut rows = section("income", &report.income, report.total_income);
        rows.extend(section(
            "expenditure",
            &report.expenditure,
            report.total_expenditure,
        ));
        rows.push(Self {
            section: "net",
            category: String::new(),
            label: "Net".to_string(),
            amount: report.net,
            currency: currency.to_string(),
        });
        rows
    }
}

/// Flat CSV record for one bank statement row
#[derive(Debug, Serialize)]
pub struct BankStatementCsvRow {
    pub label: String,
    pub fund: Decimal,
    pub sale_receive: Decimal,
    pub total_deposit: Decimal,
    pub purchase: Decimal,
    pub vendor_payment: Decimal,
    pub expense: Decimal,
    pub total_withdrawal: Decimal,
    pub balance: Decimal,
    pub currency: String,
}

impl BankStatementCsvRow {
    pub fn from_report(report: &BankStatement, currency: &str) -> Vec<Self> {
        report
            .rows
            .iter()
            .map(|r| Self {
                label: r.label.clone(),
                fund: r.deposits.fund,
                sale_receive: r.deposits.sale_receive,
                total_deposit: r.deposits.total,
                purchase: r.withdrawals.purchase,
                vendor_payment: r.withdrawals.vendor_payment,
                expense: r.withdrawals.expense,
                total_withdrawal: r.withdrawals.total,
                balance: r.balance,
                currency: currency.to_string(),
            })
            .collect()
    }
}
