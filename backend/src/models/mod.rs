//! Database row types
//!
//! Re-exports models from the shared crate and adds the row shapes sqlx decodes into.
//! Enum columns are stored as text and parsed on the way out.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub use shared::models::*;

use crate::error::AppError;

impl From<UnknownVariant> for AppError {
    fn from(err: UnknownVariant) -> Self {
        AppError::Internal(format!("Corrupt enum column: {}", err))
    }
}

#[derive(Debug, FromRow)]
pub struct StockEntryRow {
    pub id: i64,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub entry_type: String,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub entry_date: NaiveDate,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StockEntryRow> for StockEntry {
    type Error = AppError;

    fn try_from(row: StockEntryRow) -> Result<Self, Self::Error> {
        Ok(StockEntry {
            id: row.id,
            tenant_id: row.tenant_id,
            product_id: row.product_id,
            entry_type: row.entry_type.parse()?,
            quantity: row.quantity,
            purchase_price: row.purchase_price,
            sale_price: row.sale_price,
            entry_date: row.entry_date,
            reference_id: row.reference_id,
            reference_type: row.reference_type,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct StockSummaryRow {
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub total_qty: Decimal,
    pub avg_purchase_price: Decimal,
    pub total_value: Decimal,
    pub last_updated_at: DateTime<Utc>,
}

impl From<StockSummaryRow> for StockSummary {
    fn from(row: StockSummaryRow) -> Self {
        StockSummary {
            tenant_id: row.tenant_id,
            product_id: row.product_id,
            total_qty: row.total_qty,
            avg_purchase_price: row.avg_purchase_price,
            total_value: row.total_value,
            last_updated_at: row.last_updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct BankTransactionRow {
    pub id: i64,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub transaction_date: NaiveDate,
    pub transaction_type: String,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BankTransactionRow> for BankTransaction {
    type Error = AppError;

    fn try_from(row: BankTransactionRow) -> Result<Self, Self::Error> {
        Ok(BankTransaction {
            id: row.id,
            tenant_id: row.tenant_id,
            account_id: row.account_id,
            transaction_date: row.transaction_date,
            transaction_type: row.transaction_type.parse()?,
            category: row.category,
            description: row.description,
            amount: row.amount,
            balance_after: row.balance_after,
            reference_id: row.reference_id,
            reference_type: row.reference_type,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_type: String,
    pub name: String,
    pub is_system: bool,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            tenant_id: row.tenant_id,
            account_type: row.account_type,
            name: row.name,
            is_system: row.is_system,
            opening_balance: row.opening_balance,
            current_balance: row.current_balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct CategoryTotalRow {
    pub transaction_type: String,
    pub category: String,
    pub amount: Decimal,
}

impl TryFrom<CategoryTotalRow> for CategoryTotal {
    type Error = AppError;

    fn try_from(row: CategoryTotalRow) -> Result<Self, Self::Error> {
        Ok(CategoryTotal {
            transaction_type: row.transaction_type.parse()?,
            category: row.category,
            amount: row.amount,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

pub const STOCK_ENTRY_COLUMNS: &str = "id, tenant_id, product_id, entry_type, quantity, purchase_price, \
     sale_price, entry_date, reference_id, reference_type, created_at";

pub const BANK_TRANSACTION_COLUMNS: &str = "id, tenant_id, account_id, transaction_date, transaction_type, \
     category, description, amount, balance_after, reference_id, reference_type, created_by, created_at";

pub const ACCOUNT_COLUMNS: &str = "id, tenant_id, account_type, name, is_system, opening_balance, \
     current_balance, created_at, updated_at";
