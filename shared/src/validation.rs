//! Validation utilities for ledger and trade input

use rust_decimal::Decimal;

use crate::models::TradeLineInput;
use crate::types::DateRange;

// ============================================================================
// Ledger Validations
// ============================================================================

/// Bank amounts are never negative; direction lives in the transaction type
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount must not be negative");
    }
    Ok(())
}

/// Stock movements must move something
pub fn validate_movement_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity.is_zero() {
        return Err("Quantity must not be zero");
    }
    Ok(())
}

/// Unit prices are never negative
pub fn validate_price(price: Option<Decimal>) -> Result<(), &'static str> {
    match price {
        Some(p) if p < Decimal::ZERO => Err("Price must not be negative"),
        _ => Ok(()),
    }
}

/// Category codes are lowercase snake_case
pub fn validate_category(category: &str) -> Result<(), &'static str> {
    if category.is_empty() {
        return Err("Category is required");
    }
    if category.len() > 64 {
        return Err("Category must be at most 64 characters");
    }
    if !category
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Category must be lowercase letters, digits and underscores");
    }
    Ok(())
}

// ============================================================================
// Report Validations
// ============================================================================

pub fn validate_date_range(range: &DateRange) -> Result<(), &'static str> {
    if !range.is_valid() {
        return Err("Start date must not be after end date");
    }
    Ok(())
}

// ============================================================================
// Trade Validations
// ============================================================================

/// Largest value a `NUMERIC(18, 4)` ledger column holds: 99999999999999.9999
pub const MAX_STORED_VALUE: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 4);

/// A sale or purchase needs at least one line with positive quantity and a
/// non-negative unit price. Quantities, prices, line totals and the document
/// total must all fit the ledger columns.
pub fn validate_trade_lines(lines: &[TradeLineInput]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("At least one line is required");
    }
    let mut total = Decimal::ZERO;
    for line in lines {
        if line.quantity <= Decimal::ZERO {
            return Err("Line quantity must be positive");
        }
        if line.unit_price < Decimal::ZERO {
            return Err("Line unit price must not be negative");
        }
        if line.quantity > MAX_STORED_VALUE || line.unit_price > MAX_STORED_VALUE {
            return Err("Line quantity or unit price is too large");
        }
        let line_total = line
            .quantity
            .checked_mul(line.unit_price)
            .filter(|t| *t <= MAX_STORED_VALUE)
            .ok_or("Line total is too large")?;
        total = total
            .checked_add(line_total)
            .filter(|t| *t <= MAX_STORED_VALUE)
            .ok_or("Document total is too large")?;
    }
    Ok(())
}

/// Paid amount must lie within `0..=total`
pub fn validate_paid(paid: Decimal, total: Decimal) -> Result<(), &'static str> {
    if paid < Decimal::ZERO {
        return Err("Paid amount must not be negative");
    }
    if paid > total {
        return Err("Paid amount must not exceed the total");
    }
    Ok(())
}
