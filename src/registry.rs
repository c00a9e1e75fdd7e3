//! Setup operations for distributors, vendors, and SIM assignments

use log::info;
use regex::Regex;
use std::sync::OnceLock;

use crate::traits::EntityStore;
use crate::types::*;

fn sim_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s,;]+").unwrap())
}

/// Manages the master data the daily flows depend on: distributors with
/// their reference prices, vendors with their discounts, and the
/// SIM-to-distributor assignments the purchase parser resolves against.
pub struct Registry<S: EntityStore> {
    storage: S,
}

impl<S: EntityStore> Registry<S> {
    /// Create a registry over a storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Access the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Create a new distributor.
    ///
    /// Names are unique; reference prices must be non-negative.
    pub async fn add_distributor(
        &mut self,
        name: &str,
        base_get: f64,
        base_pay: f64,
    ) -> EodResult<Distributor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EodError::Validation(
                "Distributor name cannot be empty".to_string(),
            ));
        }
        if base_get < 0.0 || base_pay < 0.0 {
            return Err(EodError::Validation(
                "Reference prices must be non-negative".to_string(),
            ));
        }
        if self.storage.find_distributor_by_name(name).await?.is_some() {
            return Err(EodError::Validation(format!(
                "Distributor '{}' already exists",
                name
            )));
        }

        let distributor = Distributor::new(name.to_string(), base_get, base_pay);
        self.storage.save_distributor(&distributor).await?;
        info!("Saved new distributor: {}", distributor.name);
        Ok(distributor)
    }

    /// Create a new vendor. Names are unique.
    pub async fn add_vendor(&mut self, name: &str, discount_percent: f64) -> EodResult<Vendor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EodError::Validation(
                "Vendor name cannot be empty".to_string(),
            ));
        }
        if self.storage.find_vendor_by_name(name).await?.is_some() {
            return Err(EodError::Validation(format!(
                "Vendor '{}' already exists",
                name
            )));
        }

        let vendor = Vendor::new(name.to_string(), discount_percent);
        self.storage.save_vendor(&vendor).await?;
        info!("Saved new vendor: {}", vendor.name);
        Ok(vendor)
    }

    /// Bulk-assign SIM numbers to a distributor.
    ///
    /// `raw_list` may be separated by spaces, commas, semicolons, or
    /// newlines; empty entries are skipped. A SIM already assigned elsewhere
    /// is re-assigned to this distributor. Returns the number of SIMs saved.
    pub async fn assign_sims(&mut self, distributor_id: &str, raw_list: &str) -> EodResult<usize> {
        let distributor = self
            .storage
            .get_distributor(distributor_id)
            .await?
            .ok_or_else(|| EodError::DistributorNotFound(distributor_id.to_string()))?;

        let assignments: Vec<SimAssignment> = sim_list_re()
            .split(raw_list)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|sim_no| SimAssignment {
                sim_no: sim_no.to_string(),
                distributor_id: distributor.id.clone(),
            })
            .collect();

        self.storage.save_sim_assignments(&assignments).await?;
        info!(
            "Assigned {} SIM(s) to {}",
            assignments.len(),
            distributor.name
        );
        Ok(assignments.len())
    }

    /// Remove one SIM assignment; unknown SIM numbers are an error
    pub async fn unassign_sim(&mut self, sim_no: &str) -> EodResult<()> {
        self.storage.delete_sim_assignment(sim_no.trim()).await?;
        info!("Unassigned SIM: {}", sim_no.trim());
        Ok(())
    }

    /// Delete a distributor along with all of its SIM assignments
    pub async fn delete_distributor(&mut self, id: &str) -> EodResult<()> {
        let distributor = self
            .storage
            .get_distributor(id)
            .await?
            .ok_or_else(|| EodError::DistributorNotFound(id.to_string()))?;

        self.storage.delete_sims_for_distributor(id).await?;
        self.storage.delete_distributor(id).await?;
        info!(
            "Deleted distributor {} and its SIM assignments",
            distributor.name
        );
        Ok(())
    }

    /// Delete a vendor
    pub async fn delete_vendor(&mut self, id: &str) -> EodResult<()> {
        self.storage.delete_vendor(id).await?;
        Ok(())
    }

    /// All distributors in persisted retrieval order
    pub async fn distributors(&self) -> EodResult<Vec<Distributor>> {
        self.storage.list_distributors().await
    }

    /// All vendors in persisted retrieval order
    pub async fn vendors(&self) -> EodResult<Vec<Vendor>> {
        self.storage.list_vendors().await
    }

    /// SIMs currently assigned to a distributor
    pub async fn sims_for_distributor(&self, id: &str) -> EodResult<Vec<SimAssignment>> {
        if self.storage.get_distributor(id).await?.is_none() {
            return Err(EodError::DistributorNotFound(id.to_string()));
        }
        self.storage.list_sims_for_distributor(id).await
    }
}
