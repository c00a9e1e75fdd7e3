//! # EOD Core
//!
//! A reconciliation library for small prepaid-airtime resale operations,
//! merging distributor purchase exports and interactively collected vendor
//! sales into per-day profit-and-loss records.
//!
//! ## Features
//!
//! - **Purchase ingestion**: tolerant parsing of HTML-table ".xls" exports,
//!   with per-distributor aggregation and a blended daily cost factor
//! - **Sales collection**: a sequenced, per-vendor three-value workflow
//!   deriving gross revenue, load sold, COGS, and net profit
//! - **Daily reconciliation**: two-phase convergence of purchases and sales
//!   into a calculated P&L, order-independent, replace-on-resubmit
//! - **Master data**: distributors, vendors, and bulk SIM assignment
//! - **Reporting**: flattened daily and monthly CSV exports
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use eod_core::{MemoryStore, ReconciliationEngine};
//! use chrono::NaiveDate;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut engine = ReconciliationEngine::new(MemoryStore::new());
//! let report = engine
//!     .get_or_create(NaiveDate::from_ymd_opt(2026, 8, 25).unwrap())
//!     .await
//!     .unwrap();
//! assert!(!report.has_purchase_data);
//! # });
//! ```

pub mod export;
pub mod parser;
pub mod reconciliation;
pub mod registry;
pub mod sales;
pub mod session;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use export::{daily_report_csv, monthly_report_csv, MonthlySummary};
pub use parser::{parse, ParseError, ParseResult, UnassignedSim};
pub use reconciliation::{ReconciliationEngine, ReportStatus};
pub use registry::Registry;
pub use sales::{
    BalanceRequest, SalesOutcome, SalesPrompt, SalesRun, SalesSequencer, SalesStart, VendorPrompt,
};
pub use session::{SessionId, SessionStore};
pub use traits::EntityStore;
pub use types::*;
pub use utils::memory_store::MemoryStore;
