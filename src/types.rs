//! Core types and data structures for the reconciliation system

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A distributor we purchase airtime load from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distributor {
    /// Unique identifier for the distributor
    pub id: String,
    /// Unique human-readable name
    pub name: String,
    /// Reference purchase price (load received per deal unit)
    pub base_get: f64,
    /// Reference payable cost (cash paid per deal unit)
    pub base_pay: f64,
}

impl Distributor {
    /// Create a new distributor with a generated id
    pub fn new(name: String, base_get: f64, base_pay: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            base_get,
            base_pay,
        }
    }

    /// Ratio converting received load into payable cost.
    ///
    /// Defined as 0 when `base_get` is 0 so a misconfigured distributor
    /// degrades the day's P&L instead of failing it.
    pub fn payable_factor(&self) -> f64 {
        if self.base_get == 0.0 {
            0.0
        } else {
            self.base_pay / self.base_get
        }
    }
}

/// A vendor we sell airtime load to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    /// Unique identifier for the vendor
    pub id: String,
    /// Unique human-readable name
    pub name: String,
    /// Discount granted to the vendor, in percent (0-100 expected)
    pub discount_percent: f64,
}

impl Vendor {
    /// Create a new vendor with a generated id
    pub fn new(name: String, discount_percent: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            discount_percent,
        }
    }

    /// Markdown applied when converting gross revenue into load sold
    pub fn discount_factor(&self) -> f64 {
        1.0 - self.discount_percent / 100.0
    }
}

/// Assignment of one SIM to the distributor that owns it.
///
/// The SIM number is the identity; re-assignment overwrites the prior owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimAssignment {
    /// SIM number, normalized (no trailing ".0" artifacts)
    pub sim_no: String,
    /// Owning distributor's id
    pub distributor_id: String,
}

/// Per-day purchase aggregate for one distributor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyPurchaseReport {
    pub distributor_name: String,
    pub total_load_received: f64,
    pub total_cost_payable: f64,
}

/// Per-day sales aggregate for one vendor, with derived profit figures
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyVendorReport {
    pub vendor_name: String,
    pub gross_revenue: f64,
    pub total_load_sold: f64,
    pub cogs: f64,
    pub net_profit: f64,
}

/// One calendar day's reconciliation record.
///
/// Owns its purchase and vendor sub-reports outright; replacing a side is a
/// single field assignment followed by one save, so a half-replaced
/// collection is never observable. P&L totals are trustworthy only when both
/// `has_purchase_data` and `has_sales_data` are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    /// ISO date string, e.g. "2026-08-25"; one report per day
    pub id: String,
    pub date: NaiveDate,
    pub has_purchase_data: bool,
    /// Blended cost-per-load ratio for the day, set with purchase data
    pub master_cost_factor: f64,
    pub has_sales_data: bool,
    pub total_gross_revenue: f64,
    pub total_cogs: f64,
    pub total_net_profit: f64,
    pub purchase_reports: Vec<DailyPurchaseReport>,
    pub vendor_reports: Vec<DailyVendorReport>,
}

impl DailyReport {
    /// Create an empty report for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: date.format("%Y-%m-%d").to_string(),
            date,
            has_purchase_data: false,
            master_cost_factor: 0.0,
            has_sales_data: false,
            total_gross_revenue: 0.0,
            total_cogs: 0.0,
            total_net_profit: 0.0,
            purchase_reports: Vec::new(),
            vendor_reports: Vec::new(),
        }
    }

    /// Convergence state derived from the two data flags
    pub fn state(&self) -> ReportState {
        match (self.has_purchase_data, self.has_sales_data) {
            (false, false) => ReportState::Empty,
            (true, true) => ReportState::Complete,
            _ => ReportState::Partial,
        }
    }
}

/// Convergence state of a daily report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportState {
    /// Neither purchases nor sales recorded
    Empty,
    /// Exactly one side recorded
    Partial,
    /// Both sides recorded; P&L totals are valid
    Complete,
}

/// Round a monetary value to 2 decimal places, half-up.
///
/// The `BigDecimal` is built from the value's shortest decimal rendering,
/// not its full binary expansion, so a human-entered `1.005` reads as the
/// exact half it looks like and rounds to `1.01`. Pure function of the
/// input value, idempotent on already-rounded values.
pub fn round2(value: f64) -> f64 {
    match format!("{}", value).parse::<BigDecimal>() {
        Ok(d) => d
            .with_scale_round(2, RoundingMode::HalfUp)
            .to_f64()
            .unwrap_or(value),
        // NaN or infinite; nothing sensible to round
        Err(_) => value,
    }
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum EodError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Parse(#[from] crate::parser::ParseError),
    #[error("Distributor not found: {0}")]
    DistributorNotFound(String),
    #[error("Vendor not found: {0}")]
    VendorNotFound(String),
    #[error("SIM not found: {0}")]
    SimNotFound(String),
    #[error("Report not found: {0}")]
    ReportNotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Export error: {0}")]
    Export(String),
}

/// Result type for reconciliation operations
pub type EodResult<T> = Result<T, EodError>;
