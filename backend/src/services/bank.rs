//! Bank ledger service
//!
//! Appends credits and debits against a tenant's system bank account, keeping the
//! per-entry running balance and the cached account balance in step, and answers
//! balance questions for the reports.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    convert_all, Account, AccountRow, BankTransaction, BankTransactionRow, CategoryTotal,
    CategoryTotalRow, NewBankEntry, TransactionType, ACCOUNT_COLUMNS, BANK_ACCOUNT_TYPE,
    BANK_TRANSACTION_COLUMNS,
};
use shared::ledger::{self, LedgerAudit};
use shared::reports::CategoryTotals;
use shared::types::{DateRange, Pagination};
use shared::validation::{validate_amount, validate_category};

/// Bank ledger service
#[derive(Clone)]
pub struct BankLedgerService {
    db: PgPool,
}

impl BankLedgerService {
    /// Create a new BankLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append a credit (money in) to the tenant's bank account
    pub async fn append_credit(
        &self,
        tenant_id: Uuid,
        entry: NewBankEntry,
    ) -> AppResult<BankTransaction> {
        self.append(tenant_id, TransactionType::Credit, entry).await
    }

    /// Append a debit (money out) to the tenant's bank account
    pub async fn append_debit(
        &self,
        tenant_id: Uuid,
        entry: NewBankEntry,
    ) -> AppResult<BankTransaction> {
        self.append(tenant_id, TransactionType::Debit, entry).await
    }

    async fn append(
        &self,
        tenant_id: Uuid,
        kind: TransactionType,
        entry: NewBankEntry,
    ) -> AppResult<BankTransaction> {
        let mut tx = self.db.begin().await?;
        let created = append_in(&mut tx, tenant_id, kind, &entry).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// The tenant's system bank account
    pub async fn get_account(&self, tenant_id: Uuid) -> AppResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE tenant_id = $1 AND account_type = $2 AND is_system"
        ))
        .bind(tenant_id)
        .bind(BANK_ACCOUNT_TYPE)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::MissingAccount { tenant_id })?;

        Ok(row.into())
    }

    /// Balance at the start of `date`.
    ///
    /// Taken from the last entry dated before `date`; failing that, backed out of the
    /// first entry on or after it; failing that, the account's opening balance.
    pub async fn opening_balance(&self, tenant_id: Uuid, date: NaiveDate) -> AppResult<Decimal> {
        let last_before = sqlx::query_as::<_, BankTransactionRow>(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transactions \
             WHERE tenant_id = $1 AND transaction_date < $2 \
             ORDER BY transaction_date DESC, id DESC LIMIT 1"
        ))
        .bind(tenant_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?
        .map(BankTransaction::try_from)
        .transpose()?;

        let first_from = if last_before.is_none() {
            sqlx::query_as::<_, BankTransactionRow>(&format!(
                "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transactions \
                 WHERE tenant_id = $1 AND transaction_date >= $2 \
                 ORDER BY transaction_date, id LIMIT 1"
            ))
            .bind(tenant_id)
            .bind(date)
            .fetch_optional(&self.db)
            .await?
            .map(BankTransaction::try_from)
            .transpose()?
        } else {
            None
        };

        let account_opening = if last_before.is_none() && first_from.is_none() {
            self.get_account(tenant_id).await?.opening_balance
        } else {
            Decimal::ZERO
        };

        Ok(ledger::resolve_opening_balance(
            last_before.as_ref(),
            first_from.as_ref(),
            account_opening,
        ))
    }

    /// Balance at the end of `date`, i.e. the opening balance of the following day
    pub async fn closing_balance(&self, tenant_id: Uuid, date: NaiveDate) -> AppResult<Decimal> {
        match date.succ_opt() {
            Some(next) => self.opening_balance(tenant_id, next).await,
            None => Ok(self.get_account(tenant_id).await?.current_balance),
        }
    }

    /// Entries within a date range in ledger order
    pub async fn list_transactions(
        &self,
        tenant_id: Uuid,
        range: DateRange,
        pagination: Option<Pagination>,
    ) -> AppResult<Vec<BankTransaction>> {
        let (limit, offset) = match pagination {
            Some(p) => (p.limit(), p.offset()),
            None => (i64::MAX, 0),
        };

        let rows = sqlx::query_as::<_, BankTransactionRow>(&format!(
            r#"
            SELECT {BANK_TRANSACTION_COLUMNS}
            FROM bank_transactions
            WHERE tenant_id = $1 AND transaction_date BETWEEN $2 AND $3
            ORDER BY transaction_date, id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(tenant_id)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        convert_all(rows)
    }

    /// Bank amounts grouped by (type, category) within a date range
    pub async fn category_totals(
        &self,
        tenant_id: Uuid,
        range: DateRange,
    ) -> AppResult<CategoryTotals> {
        self.grouped_totals(tenant_id, Some(range.start), range.end).await
    }

    /// Bank amounts grouped by (type, category) for every entry up to and including `date`
    pub async fn category_totals_to_date(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<CategoryTotals> {
        self.grouped_totals(tenant_id, None, date).await
    }

    async fn grouped_totals(
        &self,
        tenant_id: Uuid,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> AppResult<CategoryTotals> {
        let rows = sqlx::query_as::<_, CategoryTotalRow>(
            r#"
            SELECT transaction_type, category, COALESCE(SUM(amount), 0) AS amount
            FROM bank_transactions
            WHERE tenant_id = $1
              AND ($2::date IS NULL OR transaction_date >= $2)
              AND transaction_date <= $3
            GROUP BY transaction_type, category
            ORDER BY transaction_type, category
            "#,
        )
        .bind(tenant_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let totals: Vec<CategoryTotal> = convert_all(rows)?;
        Ok(CategoryTotals::new(totals))
    }

    /// Replay the whole ledger and compare it with the stored snapshots and cached balance
    pub async fn audit(&self, tenant_id: Uuid) -> AppResult<LedgerAudit> {
        let account = self.get_account(tenant_id).await?;

        let rows = sqlx::query_as::<_, BankTransactionRow>(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transactions \
             WHERE tenant_id = $1 AND account_id = $2 ORDER BY transaction_date, id"
        ))
        .bind(tenant_id)
        .bind(account.id)
        .fetch_all(&self.db)
        .await?;
        let entries: Vec<BankTransaction> = convert_all(rows)?;

        let result = ledger::audit(account.opening_balance, account.current_balance, &entries);
        if !result.is_consistent() {
            tracing::warn!(
                %tenant_id,
                drift = %result.drift,
                first_error = ?result.first_error,
                "Bank ledger audit found inconsistencies"
            );
        }

        Ok(result)
    }
}

/// Append one entry inside the caller's transaction.
///
/// The account row is locked for the duration of the transaction so concurrent
/// appends for the same tenant chain their running balances serially.
pub(crate) async fn append_in(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    kind: TransactionType,
    entry: &NewBankEntry,
) -> AppResult<BankTransaction> {
    validate_amount(entry.amount).map_err(|m| AppError::invalid("amount", m))?;
    validate_category(&entry.category).map_err(|m| AppError::invalid("category", m))?;

    let account = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts \
         WHERE tenant_id = $1 AND account_type = $2 AND is_system FOR UPDATE"
    ))
    .bind(tenant_id)
    .bind(BANK_ACCOUNT_TYPE)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::MissingAccount { tenant_id })?;

    let balance_after = ledger::next_balance(account.current_balance, kind, entry.amount);
    let transaction_date = entry
        .transaction_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let row = sqlx::query_as::<_, BankTransactionRow>(&format!(
        r#"
        INSERT INTO bank_transactions (
            tenant_id, account_id, transaction_date, transaction_type, category,
            description, amount, balance_after, reference_id, reference_type, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {BANK_TRANSACTION_COLUMNS}
        "#
    ))
    .bind(tenant_id)
    .bind(account.id)
    .bind(transaction_date)
    .bind(kind.as_str())
    .bind(&entry.category)
    .bind(&entry.description)
    .bind(entry.amount)
    .bind(balance_after)
    .bind(entry.reference_id)
    .bind(&entry.reference_type)
    .bind(entry.created_by)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("UPDATE accounts SET current_balance = $1, updated_at = NOW() WHERE id = $2")
        .bind(balance_after)
        .bind(account.id)
        .execute(&mut *conn)
        .await?;

    tracing::info!(
        %tenant_id,
        kind = %kind,
        category = %entry.category,
        amount = %entry.amount,
        balance_after = %balance_after,
        "Bank entry appended"
    );

    BankTransaction::try_from(row)
}
