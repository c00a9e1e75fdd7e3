//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::types::*;

/// Storage abstraction for the reconciliation system.
///
/// This trait allows the core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. All lookups distinguish "not found" (`None`) from an empty
/// result.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Save a distributor (insert or overwrite by id)
    async fn save_distributor(&mut self, distributor: &Distributor) -> EodResult<()>;

    /// Get a distributor by id
    async fn get_distributor(&self, id: &str) -> EodResult<Option<Distributor>>;

    /// Find a distributor by its unique name (case-insensitive)
    async fn find_distributor_by_name(&self, name: &str) -> EodResult<Option<Distributor>>;

    /// List all distributors in persisted retrieval order
    async fn list_distributors(&self) -> EodResult<Vec<Distributor>>;

    /// Delete a distributor; the caller is responsible for cascading its SIMs
    async fn delete_distributor(&mut self, id: &str) -> EodResult<()>;

    /// Save a vendor (insert or overwrite by id)
    async fn save_vendor(&mut self, vendor: &Vendor) -> EodResult<()>;

    /// Get a vendor by id
    async fn get_vendor(&self, id: &str) -> EodResult<Option<Vendor>>;

    /// Find a vendor by its unique name (case-insensitive)
    async fn find_vendor_by_name(&self, name: &str) -> EodResult<Option<Vendor>>;

    /// List all vendors in persisted retrieval order.
    ///
    /// The sales sequencer walks vendors in exactly this order.
    async fn list_vendors(&self) -> EodResult<Vec<Vendor>>;

    /// Delete a vendor
    async fn delete_vendor(&mut self, id: &str) -> EodResult<()>;

    /// Save a batch of SIM assignments; an existing assignment for the same
    /// SIM number is overwritten
    async fn save_sim_assignments(&mut self, assignments: &[SimAssignment]) -> EodResult<()>;

    /// Get a SIM assignment by SIM number
    async fn get_sim_assignment(&self, sim_no: &str) -> EodResult<Option<SimAssignment>>;

    /// Delete one SIM assignment by SIM number
    async fn delete_sim_assignment(&mut self, sim_no: &str) -> EodResult<()>;

    /// List all SIMs assigned to a distributor
    async fn list_sims_for_distributor(&self, distributor_id: &str)
        -> EodResult<Vec<SimAssignment>>;

    /// Delete all SIMs assigned to a distributor (cascade on delete)
    async fn delete_sims_for_distributor(&mut self, distributor_id: &str) -> EodResult<()>;

    /// Resolve every assigned SIM number to its owning distributor.
    ///
    /// This is the index the purchase table parser consumes.
    async fn sim_index(&self) -> EodResult<HashMap<String, Distributor>>;

    /// Get the daily report for a date, if one exists
    async fn get_report(&self, date: NaiveDate) -> EodResult<Option<DailyReport>>;

    /// Save a daily report and its owned sub-reports in one operation
    async fn save_report(&mut self, report: &DailyReport) -> EodResult<()>;

    /// List reports whose date falls within the inclusive range
    async fn reports_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EodResult<Vec<DailyReport>>;
}
