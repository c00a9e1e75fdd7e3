//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development.
///
/// Distributors and vendors are kept in insertion order, which doubles as
/// the persisted retrieval order the sales sequencer walks.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    distributors: Arc<RwLock<Vec<Distributor>>>,
    vendors: Arc<RwLock<Vec<Vendor>>>,
    sims: Arc<RwLock<HashMap<String, SimAssignment>>>,
    reports: Arc<RwLock<HashMap<String, DailyReport>>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self {
            distributors: Arc::new(RwLock::new(Vec::new())),
            vendors: Arc::new(RwLock::new(Vec::new())),
            sims: Arc::new(RwLock::new(HashMap::new())),
            reports: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.distributors.write().unwrap().clear();
        self.vendors.write().unwrap().clear();
        self.sims.write().unwrap().clear();
        self.reports.write().unwrap().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn save_distributor(&mut self, distributor: &Distributor) -> EodResult<()> {
        let mut distributors = self.distributors.write().unwrap();
        match distributors.iter_mut().find(|d| d.id == distributor.id) {
            Some(existing) => *existing = distributor.clone(),
            None => distributors.push(distributor.clone()),
        }
        Ok(())
    }

    async fn get_distributor(&self, id: &str) -> EodResult<Option<Distributor>> {
        Ok(self
            .distributors
            .read()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn find_distributor_by_name(&self, name: &str) -> EodResult<Option<Distributor>> {
        Ok(self
            .distributors
            .read()
            .unwrap()
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_distributors(&self) -> EodResult<Vec<Distributor>> {
        Ok(self.distributors.read().unwrap().clone())
    }

    async fn delete_distributor(&mut self, id: &str) -> EodResult<()> {
        let mut distributors = self.distributors.write().unwrap();
        let before = distributors.len();
        distributors.retain(|d| d.id != id);
        if distributors.len() == before {
            return Err(EodError::DistributorNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn save_vendor(&mut self, vendor: &Vendor) -> EodResult<()> {
        let mut vendors = self.vendors.write().unwrap();
        match vendors.iter_mut().find(|v| v.id == vendor.id) {
            Some(existing) => *existing = vendor.clone(),
            None => vendors.push(vendor.clone()),
        }
        Ok(())
    }

    async fn get_vendor(&self, id: &str) -> EodResult<Option<Vendor>> {
        Ok(self
            .vendors
            .read()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn find_vendor_by_name(&self, name: &str) -> EodResult<Option<Vendor>> {
        Ok(self
            .vendors
            .read()
            .unwrap()
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_vendors(&self) -> EodResult<Vec<Vendor>> {
        Ok(self.vendors.read().unwrap().clone())
    }

    async fn delete_vendor(&mut self, id: &str) -> EodResult<()> {
        let mut vendors = self.vendors.write().unwrap();
        let before = vendors.len();
        vendors.retain(|v| v.id != id);
        if vendors.len() == before {
            return Err(EodError::VendorNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn save_sim_assignments(&mut self, assignments: &[SimAssignment]) -> EodResult<()> {
        let mut sims = self.sims.write().unwrap();
        for assignment in assignments {
            sims.insert(assignment.sim_no.clone(), assignment.clone());
        }
        Ok(())
    }

    async fn get_sim_assignment(&self, sim_no: &str) -> EodResult<Option<SimAssignment>> {
        Ok(self.sims.read().unwrap().get(sim_no).cloned())
    }

    async fn delete_sim_assignment(&mut self, sim_no: &str) -> EodResult<()> {
        if self.sims.write().unwrap().remove(sim_no).is_none() {
            return Err(EodError::SimNotFound(sim_no.to_string()));
        }
        Ok(())
    }

    async fn list_sims_for_distributor(
        &self,
        distributor_id: &str,
    ) -> EodResult<Vec<SimAssignment>> {
        let mut assigned: Vec<SimAssignment> = self
            .sims
            .read()
            .unwrap()
            .values()
            .filter(|s| s.distributor_id == distributor_id)
            .cloned()
            .collect();
        assigned.sort_by(|a, b| a.sim_no.cmp(&b.sim_no));
        Ok(assigned)
    }

    async fn delete_sims_for_distributor(&mut self, distributor_id: &str) -> EodResult<()> {
        self.sims
            .write()
            .unwrap()
            .retain(|_, s| s.distributor_id != distributor_id);
        Ok(())
    }

    async fn sim_index(&self) -> EodResult<HashMap<String, Distributor>> {
        let sims = self.sims.read().unwrap();
        let distributors = self.distributors.read().unwrap();
        let mut index = HashMap::new();
        for assignment in sims.values() {
            if let Some(distributor) = distributors
                .iter()
                .find(|d| d.id == assignment.distributor_id)
            {
                index.insert(assignment.sim_no.clone(), distributor.clone());
            }
        }
        Ok(index)
    }

    async fn get_report(&self, date: NaiveDate) -> EodResult<Option<DailyReport>> {
        let id = date.format("%Y-%m-%d").to_string();
        Ok(self.reports.read().unwrap().get(&id).cloned())
    }

    async fn save_report(&mut self, report: &DailyReport) -> EodResult<()> {
        self.reports
            .write()
            .unwrap()
            .insert(report.id.clone(), report.clone());
        Ok(())
    }

    async fn reports_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EodResult<Vec<DailyReport>> {
        let mut in_range: Vec<DailyReport> = self
            .reports
            .read()
            .unwrap()
            .values()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect();
        in_range.sort_by_key(|r| r.date);
        Ok(in_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vendor_listing_preserves_insertion_order() {
        let mut store = MemoryStore::new();
        for name in ["C", "A", "B"] {
            store
                .save_vendor(&Vendor::new(name.to_string(), 0.0))
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .list_vendors()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[tokio::test]
    async fn sim_reassignment_overwrites_owner() {
        let mut store = MemoryStore::new();
        let first = Distributor::new("First".to_string(), 100.0, 98.0);
        let second = Distributor::new("Second".to_string(), 100.0, 95.0);
        store.save_distributor(&first).await.unwrap();
        store.save_distributor(&second).await.unwrap();

        store
            .save_sim_assignments(&[SimAssignment {
                sim_no: "9001".to_string(),
                distributor_id: first.id.clone(),
            }])
            .await
            .unwrap();
        store
            .save_sim_assignments(&[SimAssignment {
                sim_no: "9001".to_string(),
                distributor_id: second.id.clone(),
            }])
            .await
            .unwrap();

        let index = store.sim_index().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index["9001"].name, "Second");
    }

    #[tokio::test]
    async fn reports_in_range_is_inclusive_and_sorted() {
        let mut store = MemoryStore::new();
        for day in [3, 1, 2, 9] {
            let date = NaiveDate::from_ymd_opt(2026, 8, day).unwrap();
            store.save_report(&DailyReport::new(date)).await.unwrap();
        }
        let reports = store
            .reports_in_range(
                NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            )
            .await
            .unwrap();
        let ids: Vec<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2026-08-01", "2026-08-02", "2026-08-03"]);
    }

    #[tokio::test]
    async fn deleting_missing_sim_is_an_error() {
        let mut store = MemoryStore::new();
        let err = store.delete_sim_assignment("nope").await.unwrap_err();
        assert!(matches!(err, EodError::SimNotFound(_)));
    }
}
