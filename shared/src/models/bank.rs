//! Bank ledger and account models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;

/// Direction of a bank ledger entry. The amount itself is always non-negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }

    /// Apply `amount` to `balance` in this direction
    pub fn apply(&self, balance: Decimal, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Credit => balance + amount,
            TransactionType::Debit => balance - amount,
        }
    }

    /// Undo the effect of `amount` on `balance`
    pub fn revert(&self, balance: Decimal, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Credit => balance - amount,
            TransactionType::Debit => balance + amount,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Well-known bank transaction categories. The column is free-form; these are the
/// values the write paths emit and the reports group on.
pub mod category {
    pub const SALE: &str = "sale";
    pub const PURCHASE: &str = "purchase";
    pub const OPENING: &str = "opening";
    pub const EXPENSE: &str = "expense";
    pub const FIXED_ASSET: &str = "fixed_asset";
    pub const VENDOR_PAYMENT: &str = "vendor_payment";
    pub const CUSTOMER_PAYMENT: &str = "customer_payment";
    pub const ADJUSTMENT: &str = "adjustment";
    pub const FUND_IN: &str = "fund_in";
    pub const FUND_OUT: &str = "fund_out";
    pub const PROFIT: &str = "profit";
    pub const OTHER: &str = "other";

    /// Credits that are not income: sale-related collections, capital and corrections
    pub const NON_INCOME_CREDITS: &[&str] = &[
        SALE,
        CUSTOMER_PAYMENT,
        OPENING,
        FUND_IN,
        PROFIT,
        ADJUSTMENT,
    ];

    /// Debits that are not expenditure: stock, capital outlays and fund movements
    pub const NON_EXPENDITURE_DEBITS: &[&str] =
        &[PURCHASE, VENDOR_PAYMENT, FIXED_ASSET, FUND_IN, FUND_OUT, PROFIT];
}

/// Account type of the system bank account every tenant is provisioned with
pub const BANK_ACCOUNT_TYPE: &str = "bank";

/// One immutable bank ledger entry with the running balance snapshot after it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankTransaction {
    pub id: i64,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub transaction_date: NaiveDate,
    pub transaction_type: TransactionType,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl BankTransaction {
    /// Amount with the direction applied (credits positive)
    pub fn signed_amount(&self) -> Decimal {
        self.transaction_type.apply(Decimal::ZERO, self.amount)
    }

    /// Balance immediately before this entry was applied
    pub fn balance_before(&self) -> Decimal {
        self.transaction_type.revert(self.balance_after, self.amount)
    }
}

/// A tenant account; `current_balance` caches opening balance plus net ledger movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
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

/// Request to append a credit or debit to the bank ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBankEntry {
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
}

/// Sum of bank amounts for one (type, category) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
}
