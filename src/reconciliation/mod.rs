//! Daily reconciliation engine.
//!
//! Owns the [`DailyReport`] lifecycle: lazy creation per date, full
//! replacement of either side's sub-reports on resubmission, and the
//! two-phase convergence to a calculated P&L once both purchases and sales
//! are in. Submission order does not matter; the final state depends only on
//! the latest submission of each side.

use chrono::NaiveDate;
use log::info;
use std::fmt;

use crate::traits::EntityStore;
use crate::types::*;

/// Outcome of a recalculation, returned to the caller for display
#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    /// Purchases stored; sales still missing
    AwaitingSales,
    /// Sales stored; purchases still missing
    AwaitingPurchases,
    /// Both sides present; P&L computed and persisted
    Complete {
        total_gross_revenue: f64,
        total_cogs: f64,
        total_net_profit: f64,
    },
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::AwaitingSales => {
                write!(f, "Purchases saved. Waiting for sales data to calculate P&L.")
            }
            ReportStatus::AwaitingPurchases => {
                write!(f, "Sales saved. Waiting for purchase data to calculate P&L.")
            }
            ReportStatus::Complete {
                total_net_profit, ..
            } => write!(
                f,
                "P&L calculated and saved. Net profit: {:.2}",
                total_net_profit
            ),
        }
    }
}

/// Reconciliation engine over a storage backend
pub struct ReconciliationEngine<S: EntityStore> {
    storage: S,
}

impl<S: EntityStore> ReconciliationEngine<S> {
    /// Create an engine with the given storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Access the underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the underlying storage
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Return the report for `date`, creating and persisting an empty one if
    /// none exists yet. Idempotent: the date is the identity, so repeated
    /// calls never create duplicates.
    pub async fn get_or_create(&mut self, date: NaiveDate) -> EodResult<DailyReport> {
        if let Some(report) = self.storage.get_report(date).await? {
            return Ok(report);
        }
        let report = DailyReport::new(date);
        self.storage.save_report(&report).await?;
        Ok(report)
    }

    /// Replace the report's purchase side with a freshly parsed set of
    /// per-distributor aggregates and the day's blended cost factor.
    ///
    /// Resubmission is a full overwrite, never an accumulation.
    pub async fn update_purchases(
        &mut self,
        report: &mut DailyReport,
        purchase_reports: Vec<DailyPurchaseReport>,
        cost_factor: f64,
    ) -> EodResult<ReportStatus> {
        report.purchase_reports = purchase_reports;
        report.master_cost_factor = cost_factor;
        report.has_purchase_data = true;
        info!(
            "Purchases updated for {}: {} distributors, cost factor {:.6}",
            report.id,
            report.purchase_reports.len(),
            cost_factor
        );
        self.recalculate(report).await
    }

    /// Replace the report's sales side with completed per-vendor aggregates
    pub async fn update_sales(
        &mut self,
        report: &mut DailyReport,
        vendor_reports: Vec<DailyVendorReport>,
    ) -> EodResult<ReportStatus> {
        report.vendor_reports = vendor_reports;
        report.has_sales_data = true;
        info!(
            "Sales updated for {}: {} vendors",
            report.id,
            report.vendor_reports.len()
        );
        self.recalculate(report).await
    }

    /// Persist the report and, once both sides are present, compute the P&L
    /// totals from the stored vendor aggregates.
    pub async fn recalculate(&mut self, report: &mut DailyReport) -> EodResult<ReportStatus> {
        if report.state() != ReportState::Complete {
            self.storage.save_report(report).await?;
            return Ok(if report.has_purchase_data {
                ReportStatus::AwaitingSales
            } else {
                ReportStatus::AwaitingPurchases
            });
        }

        let total_gross_revenue: f64 = report.vendor_reports.iter().map(|v| v.gross_revenue).sum();
        let total_cogs: f64 = report.vendor_reports.iter().map(|v| v.cogs).sum();
        let total_net_profit = total_gross_revenue - total_cogs;

        report.total_gross_revenue = round2(total_gross_revenue);
        report.total_cogs = round2(total_cogs);
        report.total_net_profit = round2(total_net_profit);

        self.storage.save_report(report).await?;

        Ok(ReportStatus::Complete {
            total_gross_revenue: report.total_gross_revenue,
            total_cogs: report.total_cogs,
            total_net_profit: report.total_net_profit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    fn purchase(name: &str, load: f64, cost: f64) -> DailyPurchaseReport {
        DailyPurchaseReport {
            distributor_name: name.to_string(),
            total_load_received: load,
            total_cost_payable: cost,
        }
    }

    fn sale(name: &str, gross: f64, cogs: f64) -> DailyVendorReport {
        DailyVendorReport {
            vendor_name: name.to_string(),
            gross_revenue: gross,
            total_load_sold: 0.0,
            cogs,
            net_profit: gross - cogs,
        }
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let mut engine = ReconciliationEngine::new(MemoryStore::new());
        let first = engine.get_or_create(date()).await.unwrap();
        let second = engine.get_or_create(date()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.state(), ReportState::Empty);
    }

    #[tokio::test]
    async fn purchases_first_then_sales_completes() {
        let mut engine = ReconciliationEngine::new(MemoryStore::new());
        let mut report = engine.get_or_create(date()).await.unwrap();

        let status = engine
            .update_purchases(&mut report, vec![purchase("Jio", 950.0, 931.55)], 0.9806)
            .await
            .unwrap();
        assert_eq!(status, ReportStatus::AwaitingSales);
        assert_eq!(report.state(), ReportState::Partial);
        // Totals stay unset while partial
        assert_eq!(report.total_net_profit, 0.0);

        let status = engine
            .update_sales(&mut report, vec![sale("Shop A", 2200.0, 2190.13)])
            .await
            .unwrap();
        assert_eq!(
            status,
            ReportStatus::Complete {
                total_gross_revenue: 2200.0,
                total_cogs: 2190.13,
                total_net_profit: 9.87,
            }
        );
    }

    #[tokio::test]
    async fn sales_first_then_purchases_completes() {
        let mut engine = ReconciliationEngine::new(MemoryStore::new());
        let mut report = engine.get_or_create(date()).await.unwrap();

        let status = engine
            .update_sales(&mut report, vec![sale("Shop A", 100.0, 90.0)])
            .await
            .unwrap();
        assert_eq!(status, ReportStatus::AwaitingPurchases);

        let status = engine
            .update_purchases(&mut report, vec![purchase("Jio", 100.0, 90.0)], 0.9)
            .await
            .unwrap();
        assert!(matches!(status, ReportStatus::Complete { .. }));

        let persisted = engine.storage().get_report(date()).await.unwrap().unwrap();
        assert_eq!(persisted.total_net_profit, 10.0);
    }

    #[tokio::test]
    async fn purchase_resubmission_replaces_not_accumulates() {
        let mut engine = ReconciliationEngine::new(MemoryStore::new());
        let mut report = engine.get_or_create(date()).await.unwrap();

        engine
            .update_purchases(
                &mut report,
                vec![purchase("Jio", 950.0, 931.55), purchase("Airtel", 10.0, 9.8)],
                0.98,
            )
            .await
            .unwrap();
        engine
            .update_purchases(&mut report, vec![purchase("Jio", 500.0, 490.0)], 0.98)
            .await
            .unwrap();

        let persisted = engine.storage().get_report(date()).await.unwrap().unwrap();
        assert_eq!(persisted.purchase_reports.len(), 1);
        assert_eq!(persisted.purchase_reports[0].total_load_received, 500.0);
        // Still only partial, still complete after both sides land
        assert_eq!(persisted.state(), ReportState::Partial);
    }

    #[tokio::test]
    async fn resubmission_after_complete_recomputes_pnl() {
        let mut engine = ReconciliationEngine::new(MemoryStore::new());
        let mut report = engine.get_or_create(date()).await.unwrap();

        engine
            .update_purchases(&mut report, vec![purchase("Jio", 100.0, 90.0)], 0.9)
            .await
            .unwrap();
        engine
            .update_sales(&mut report, vec![sale("Shop A", 100.0, 90.0)])
            .await
            .unwrap();
        assert_eq!(report.total_net_profit, 10.0);

        let status = engine
            .update_sales(&mut report, vec![sale("Shop A", 200.0, 150.0)])
            .await
            .unwrap();
        assert_eq!(report.state(), ReportState::Complete);
        assert!(matches!(status, ReportStatus::Complete { .. }));
        assert_eq!(report.total_net_profit, 50.0);
        assert_eq!(report.vendor_reports.len(), 1);
    }

    #[tokio::test]
    async fn pnl_sums_across_vendors_with_rounding() {
        let mut engine = ReconciliationEngine::new(MemoryStore::new());
        let mut report = engine.get_or_create(date()).await.unwrap();

        engine
            .update_purchases(&mut report, vec![purchase("Jio", 1.0, 1.0)], 1.0)
            .await
            .unwrap();
        engine
            .update_sales(
                &mut report,
                vec![sale("A", 100.12, 50.0), sale("B", 200.0, 50.0)],
            )
            .await
            .unwrap();

        assert_eq!(report.total_gross_revenue, 300.12);
        assert_eq!(report.total_cogs, 100.0);
        assert_eq!(report.total_net_profit, 200.12);
    }
}
