//! Multi-step sales collection sequencer.
//!
//! Walks the configured vendors in persisted order and collects three
//! numbers per vendor: yesterday's end balance, today's total top-ups, and
//! today's end balance. When the third value lands, the vendor's gross
//! revenue, load sold, cost of goods, and net profit are derived with the
//! day's cost factor. Nothing is persisted until the last vendor completes;
//! only then is the full collection handed to the reconciliation engine.

use chrono::NaiveDate;
use log::warn;
use std::fmt;

use crate::reconciliation::{ReconciliationEngine, ReportStatus};
use crate::session::{SessionId, SessionStore};
use crate::traits::EntityStore;
use crate::types::*;

/// Which of the three per-vendor values is being asked for.
///
/// Each variant carries exactly the values already collected for the current
/// vendor, so the step and its payload cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorPrompt {
    /// Waiting for yesterday's end balance
    PrevBal,
    /// Waiting for today's total top-ups
    Topup { prev_bal: f64 },
    /// Waiting for today's end balance
    EndBal { prev_bal: f64, topup: f64 },
}

/// In-progress state of one sales collection run
#[derive(Debug, Clone)]
pub struct SalesRun {
    pub date: NaiveDate,
    /// Vendors in persisted retrieval order
    pub vendors: Vec<Vendor>,
    /// Index of the vendor currently being collected
    pub index: usize,
    pub prompt: VendorPrompt,
    /// Completed per-vendor results, held back until the run finishes
    pub completed: Vec<DailyVendorReport>,
}

impl SalesRun {
    fn current_vendor(&self) -> &Vendor {
        &self.vendors[self.index]
    }
}

/// A question to put to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct SalesPrompt {
    pub vendor_name: String,
    pub discount_percent: f64,
    pub request: BalanceRequest,
}

/// The three sequential questions asked per vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceRequest {
    PrevBal,
    Topup,
    EndBal,
}

impl fmt::Display for SalesPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.request {
            BalanceRequest::PrevBal => write!(
                f,
                "Processing vendor: {} ({}%)\n1. Enter YESTERDAY'S end balance:",
                self.vendor_name, self.discount_percent
            ),
            BalanceRequest::Topup => write!(f, "2. Enter TODAY'S total top-ups:"),
            BalanceRequest::EndBal => write!(f, "3. Enter TODAY'S end balance:"),
        }
    }
}

/// Result of starting a sales run
#[derive(Debug, Clone, PartialEq)]
pub struct SalesStart {
    /// First prompt, or `None` when no vendors are configured (soft failure)
    pub prompt: Option<SalesPrompt>,
    /// The day has no purchase data yet; P&L stays partial until it does
    pub purchases_missing: bool,
}

/// Result of feeding one operator input into the sequencer
#[derive(Debug, Clone, PartialEq)]
pub enum SalesOutcome {
    /// Value accepted; next question for the same vendor
    Prompt(SalesPrompt),
    /// Input did not parse as a number; same question again, nothing advanced
    Reprompt(SalesPrompt),
    /// Vendor completed; first question for the next vendor
    VendorLogged {
        vendor_name: String,
        net_profit: f64,
        next: SalesPrompt,
    },
    /// Last vendor completed; results handed to the reconciliation engine
    Finished {
        vendor_name: String,
        net_profit: f64,
        status: ReportStatus,
    },
}

/// Drives one-vendor-at-a-time sales collection for any number of sessions
pub struct SalesSequencer<S: EntityStore> {
    engine: ReconciliationEngine<S>,
    sessions: SessionStore<SalesRun>,
}

impl<S: EntityStore> SalesSequencer<S> {
    /// Create a sequencer over a storage backend and a shared session store
    pub fn new(storage: S, sessions: SessionStore<SalesRun>) -> Self {
        Self {
            engine: ReconciliationEngine::new(storage),
            sessions,
        }
    }

    /// Begin a sales run for `date` in the given session.
    ///
    /// Soft-fails with `prompt: None` when no vendors exist; in that case no
    /// session state is created.
    pub async fn start(&mut self, session: SessionId, date: NaiveDate) -> EodResult<SalesStart> {
        let report = self.engine.get_or_create(date).await?;
        let purchases_missing = !report.has_purchase_data;
        if purchases_missing {
            warn!(
                "Sales run for {} started without purchase data; P&L will be incomplete",
                report.id
            );
        }

        let vendors = self.engine.storage().list_vendors().await?;
        if vendors.is_empty() {
            return Ok(SalesStart {
                prompt: None,
                purchases_missing,
            });
        }

        let run = SalesRun {
            date,
            vendors,
            index: 0,
            prompt: VendorPrompt::PrevBal,
            completed: Vec::new(),
        };
        let prompt = prompt_for(&run);
        self.sessions.set(session, run);

        Ok(SalesStart {
            prompt: Some(prompt),
            purchases_missing,
        })
    }

    /// Feed one operator input into the run for `session`.
    ///
    /// A value that does not parse as a number re-asks the same question
    /// without advancing. Calling this without an active run is a caller
    /// contract violation.
    pub async fn submit(&mut self, session: SessionId, input: &str) -> EodResult<SalesOutcome> {
        let mut run = self
            .sessions
            .get(session)
            .ok_or_else(|| EodError::Validation("no sales collection in progress".to_string()))?;

        let value: f64 = match input.trim().parse() {
            Ok(v) => v,
            Err(_) => return Ok(SalesOutcome::Reprompt(prompt_for(&run))),
        };

        match run.prompt {
            VendorPrompt::PrevBal => {
                run.prompt = VendorPrompt::Topup { prev_bal: value };
                let prompt = prompt_for(&run);
                self.sessions.set(session, run);
                Ok(SalesOutcome::Prompt(prompt))
            }
            VendorPrompt::Topup { prev_bal } => {
                run.prompt = VendorPrompt::EndBal {
                    prev_bal,
                    topup: value,
                };
                let prompt = prompt_for(&run);
                self.sessions.set(session, run);
                Ok(SalesOutcome::Prompt(prompt))
            }
            VendorPrompt::EndBal { prev_bal, topup } => {
                self.complete_vendor(session, run, prev_bal, topup, value)
                    .await
            }
        }
    }

    /// Discard all in-progress scratch state for the session.
    ///
    /// Persisted data is untouched; a cancelled run simply never reaches the
    /// reconciliation engine.
    pub fn cancel(&self, session: SessionId) {
        self.sessions.clear(session);
    }

    /// Whether the session has a sales run in progress
    pub fn is_active(&self, session: SessionId) -> bool {
        self.sessions.is_active(session)
    }

    async fn complete_vendor(
        &mut self,
        session: SessionId,
        mut run: SalesRun,
        prev_bal: f64,
        topup: f64,
        end_bal: f64,
    ) -> EodResult<SalesOutcome> {
        // Cost factor is read fresh so purchases run mid-collection are
        // picked up by the remaining vendors.
        let mut report = self.engine.get_or_create(run.date).await?;
        let cost_factor = report.master_cost_factor;

        let vendor = run.current_vendor().clone();
        let gross_revenue = (prev_bal + topup) - end_bal;
        let discount_factor = vendor.discount_factor();
        let total_load_sold = if discount_factor == 0.0 {
            0.0
        } else {
            gross_revenue / discount_factor
        };
        let cogs = total_load_sold * cost_factor;
        let net_profit = gross_revenue - cogs;

        let vendor_report = DailyVendorReport {
            vendor_name: vendor.name.clone(),
            gross_revenue: round2(gross_revenue),
            total_load_sold: round2(total_load_sold),
            cogs: round2(cogs),
            net_profit: round2(net_profit),
        };
        let net_profit = vendor_report.net_profit;
        run.completed.push(vendor_report);

        run.index += 1;
        if run.index < run.vendors.len() {
            run.prompt = VendorPrompt::PrevBal;
            let next = prompt_for(&run);
            self.sessions.set(session, run);
            return Ok(SalesOutcome::VendorLogged {
                vendor_name: vendor.name,
                net_profit,
                next,
            });
        }

        // Last vendor: hand the whole collection over, then drop the scratch
        let status = self.engine.update_sales(&mut report, run.completed).await?;
        self.sessions.clear(session);
        Ok(SalesOutcome::Finished {
            vendor_name: vendor.name,
            net_profit,
            status,
        })
    }
}

fn prompt_for(run: &SalesRun) -> SalesPrompt {
    let vendor = run.current_vendor();
    SalesPrompt {
        vendor_name: vendor.name.clone(),
        discount_percent: vendor.discount_percent,
        request: match run.prompt {
            VendorPrompt::PrevBal => BalanceRequest::PrevBal,
            VendorPrompt::Topup { .. } => BalanceRequest::Topup,
            VendorPrompt::EndBal { .. } => BalanceRequest::EndBal,
        },
    }
}
