//! WebAssembly module for the Shop Ledger
//!
//! Client-side previews over the same cost engine the server reports use:
//! the average cost after a purchase, discount shares per sale line, margins
//! and a full product valuation. Amounts cross the boundary as decimal strings
//! so no precision is lost to `f64`.

use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::models::{resolve_discount, DiscountKind};
use shared::valuation::{apportion_discount, safe_div, value_product, weighted_average, ValuationInput};

fn parse(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|e| format!("Invalid {}: {}", field, e))
}

fn to_js(err: String) -> JsValue {
    JsValue::from_str(&err)
}

/// Average unit cost after receiving `new_qty` at `new_price` into the current stock
pub fn preview_average_cost(
    on_hand_qty: &str,
    current_avg: &str,
    new_qty: &str,
    new_price: &str,
) -> Result<String, String> {
    let avg = weighted_average(
        parse("on_hand_qty", on_hand_qty)?,
        parse("current_avg", current_avg)?,
        parse("new_qty", new_qty)?,
        parse("new_price", new_price)?,
    );
    Ok(avg.to_string())
}

/// Split a sale discount across line totals (JSON array of decimal strings)
pub fn split_discount(line_totals_json: &str, kind: &str, value: &str) -> Result<Vec<String>, String> {
    let raw: Vec<String> = serde_json::from_str(line_totals_json)
        .map_err(|e| format!("Invalid line totals JSON: {}", e))?;
    let line_totals = raw
        .iter()
        .map(|t| parse("line_total", t))
        .collect::<Result<Vec<Decimal>, String>>()?;
    if line_totals.iter().any(|lt| lt.is_sign_negative()) {
        return Err("Line totals must not be negative".to_string());
    }
    let subtotal = line_totals
        .iter()
        .try_fold(Decimal::ZERO, |acc, lt| acc.checked_add(*lt))
        .ok_or_else(|| "Line totals are too large".to_string())?;

    let kind = match kind {
        "flat" => DiscountKind::Flat,
        "percentage" => DiscountKind::Percentage,
        other => return Err(format!("Unknown discount kind: {}", other)),
    };
    let discount = resolve_discount(kind, parse("value", value)?, subtotal);

    Ok(line_totals
        .iter()
        .map(|lt| apportion_discount(*lt, subtotal, discount).to_string())
        .collect())
}

/// Gross margin as a percentage of net revenue; zero when there is no revenue
pub fn margin_percent(profit: &str, revenue: &str) -> Result<String, String> {
    let margin = safe_div(parse("profit", profit)?, parse("revenue", revenue)?) * Decimal::ONE_HUNDRED;
    Ok(margin.normalize().to_string())
}

/// Value a product from a JSON `ValuationInput`, returning the JSON breakdown
pub fn valuation_json(input_json: &str) -> Result<String, String> {
    let input: ValuationInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid valuation input: {}", e))?;
    serde_json::to_string(&value_product(&input)).map_err(|e| e.to_string())
}

#[wasm_bindgen(js_name = previewAverageCost)]
pub fn preview_average_cost_js(
    on_hand_qty: &str,
    current_avg: &str,
    new_qty: &str,
    new_price: &str,
) -> Result<String, JsValue> {
    preview_average_cost(on_hand_qty, current_avg, new_qty, new_price).map_err(to_js)
}

#[wasm_bindgen(js_name = splitDiscount)]
pub fn split_discount_js(line_totals_json: &str, kind: &str, value: &str) -> Result<Vec<String>, JsValue> {
    split_discount(line_totals_json, kind, value).map_err(to_js)
}

#[wasm_bindgen(js_name = marginPercent)]
pub fn margin_percent_js(profit: &str, revenue: &str) -> Result<String, JsValue> {
    margin_percent(profit, revenue).map_err(to_js)
}

#[wasm_bindgen(js_name = valueProduct)]
pub fn value_product_js(input_json: &str) -> Result<String, JsValue> {
    valuation_json(input_json).map_err(to_js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_preview_average_cost() {
        assert_eq!(preview_average_cost("10", "5", "10", "7").unwrap().parse::<Decimal>().unwrap(), dec!(6));
        assert_eq!(preview_average_cost("0", "5", "4", "9").unwrap(), "9");
        assert!(preview_average_cost("ten", "5", "1", "1").is_err());
    }

    #[test]
    fn test_split_discount() {
        let shares = split_discount(r#"["75", "25"]"#, "percentage", "10").unwrap();
        let shares: Vec<Decimal> = shares.iter().map(|s| s.parse().unwrap()).collect();
        assert_eq!(shares, vec![dec!(7.5), dec!(2.5)]);

        assert!(split_discount(r#"["10"]"#, "coupon", "1").is_err());
    }

    #[test]
    fn test_split_discount_rejects_overflowing_totals() {
        let max = Decimal::MAX.to_string();
        let lines = format!(r#"["{}", "{}"]"#, max, max);
        assert!(split_discount(&lines, "flat", "1").is_err());
        assert!(split_discount(r#"["-5", "10"]"#, "flat", "1").is_err());

        let shares = split_discount(&format!(r#"["{}"]"#, max), "percentage", &max).unwrap();
        assert_eq!(shares[0].parse::<Decimal>().unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_margin_percent() {
        assert_eq!(margin_percent("25", "100").unwrap(), "25");
        assert_eq!(margin_percent("5", "0").unwrap(), "0");
    }

    #[test]
    fn test_valuation_json() {
        let input = r#"{
            "prior": {"net_qty": "10", "inbound_qty": "10", "inbound_value": "50"},
            "purchases": {"qty": "5", "value": "35"},
            "sales": {"qty": "8", "revenue_gross": "96", "discount": "0"},
            "fallback_avg_price": null
        }"#;
        let out: serde_json::Value = serde_json::from_str(&valuation_json(input).unwrap()).unwrap();
        assert_eq!(out["ending_stock_qty"], "7");
    }
}
