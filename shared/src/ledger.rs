//! Bank ledger arithmetic: balance chaining, opening balances and replay

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::{BankTransaction, TransactionType};

/// A broken link found while replaying the ledger
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum LedgerError {
    #[error("transaction {id}: stored balance {stored} but replay gives {expected}")]
    BalanceMismatch {
        id: i64,
        expected: Decimal,
        stored: Decimal,
    },

    #[error("transaction {id} has a negative amount {amount}")]
    NegativeAmount { id: i64, amount: Decimal },
}

/// Balance snapshot after applying one entry to the current balance
pub fn next_balance(current: Decimal, kind: TransactionType, amount: Decimal) -> Decimal {
    kind.apply(current, amount)
}

/// Resolve the balance at the start of a period.
///
/// `last_before` is the most recent entry dated strictly before the period start and
/// `first_from` the earliest entry on or after it, both in `(date, id)` order.
pub fn resolve_opening_balance(
    last_before: Option<&BankTransaction>,
    first_from: Option<&BankTransaction>,
    account_opening_balance: Decimal,
) -> Decimal {
    match (last_before, first_from) {
        (Some(last), _) => last.balance_after,
        (None, Some(first)) => first.balance_before(),
        (None, None) => account_opening_balance,
    }
}

/// Replay entries (already sorted by `(date, id)`) from the opening balance and
/// return the final balance, or the first entry whose stored snapshot disagrees.
pub fn replay(opening_balance: Decimal, entries: &[BankTransaction]) -> Result<Decimal, LedgerError> {
    entries.iter().try_fold(opening_balance, |balance, tx| {
        if tx.amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount {
                id: tx.id,
                amount: tx.amount,
            });
        }
        let expected = next_balance(balance, tx.transaction_type, tx.amount);
        if expected != tx.balance_after {
            return Err(LedgerError::BalanceMismatch {
                id: tx.id,
                expected,
                stored: tx.balance_after,
            });
        }
        Ok(expected)
    })
}

/// Outcome of auditing a tenant's bank ledger against its cached account balance
#[derive(Debug, Clone, Serialize)]
pub struct LedgerAudit {
    pub transaction_count: usize,
    pub opening_balance: Decimal,
    /// Opening balance plus the net of every entry, independent of stored snapshots
    pub replayed_balance: Decimal,
    pub cached_balance: Decimal,
    /// `cached_balance - replayed_balance`
    pub drift: Decimal,
    pub first_error: Option<LedgerError>,
}

impl LedgerAudit {
    pub fn is_consistent(&self) -> bool {
        self.first_error.is_none() && self.drift.is_zero()
    }
}

/// Audit a sorted ledger against the account's opening and cached current balance
pub fn audit(
    opening_balance: Decimal,
    cached_balance: Decimal,
    entries: &[BankTransaction],
) -> LedgerAudit {
    let replayed_balance = entries
        .iter()
        .fold(opening_balance, |b, tx| next_balance(b, tx.transaction_type, tx.amount));
    let first_error = replay(opening_balance, entries).err();

    LedgerAudit {
        transaction_count: entries.len(),
        opening_balance,
        replayed_balance,
        cached_balance,
        drift: cached_balance - replayed_balance,
        first_error,
    }
}
