//! Business logic services for the shop ledger
//!
//! `StockService` and `BankLedgerService` are the only write paths into the two
//! ledgers; `TradeService` composes them inside one transaction.

pub mod bank;
pub mod maintenance;
pub mod reports;
pub mod stock;
pub mod trade;
pub mod valuation;

pub use bank::BankLedgerService;
pub use maintenance::MaintenanceService;
pub use reports::ReportService;
pub use stock::StockService;
pub use trade::TradeService;
pub use valuation::ValuationService;
