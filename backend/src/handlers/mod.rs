//! HTTP request handlers

pub mod bank;
pub mod health;
pub mod reports;
pub mod stock;
pub mod trade;

pub use health::health_check;
