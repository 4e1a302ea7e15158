//! Domain models for the shop ledger

mod bank;
mod stock;
mod trade;

pub use bank::*;
pub use stock::*;
pub use trade::*;
