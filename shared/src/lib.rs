//! Shared types, models and pure computations for the shop ledger
//!
//! Everything in this crate is free of I/O: the backend feeds it rows fetched from
//! PostgreSQL and the WASM module feeds it values typed into the browser.

pub mod ledger;
pub mod models;
pub mod reports;
pub mod types;
pub mod validation;
pub mod valuation;

pub use models::*;
pub use types::*;
pub use validation::*;
