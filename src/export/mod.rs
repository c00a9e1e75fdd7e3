//! Flattened CSV exports of daily and monthly reconciliation figures.
//!
//! These are the artifacts handed to whatever delivers files to the
//! operator; the core only produces the bytes.

use std::collections::BTreeMap;

use crate::types::*;

/// Aggregation of a month's completed daily reports
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlySummary {
    pub total_gross_revenue: f64,
    pub total_cogs: f64,
    pub total_net_profit: f64,
    /// Net profit per vendor, summed over the month
    pub vendor_profits: BTreeMap<String, f64>,
    /// Cost payable per distributor, summed over the month
    pub distributor_costs: BTreeMap<String, f64>,
}

impl MonthlySummary {
    /// Aggregate a set of daily reports.
    ///
    /// Only days with both purchase and sales data count; partial days have
    /// no trustworthy P&L and are excluded entirely.
    pub fn from_reports(reports: &[DailyReport]) -> Self {
        let mut summary = MonthlySummary::default();
        for report in reports {
            if report.state() != ReportState::Complete {
                continue;
            }
            summary.total_gross_revenue += report.total_gross_revenue;
            summary.total_cogs += report.total_cogs;
            summary.total_net_profit += report.total_net_profit;

            for vr in &report.vendor_reports {
                *summary
                    .vendor_profits
                    .entry(vr.vendor_name.clone())
                    .or_insert(0.0) += vr.net_profit;
            }
            for pr in &report.purchase_reports {
                *summary
                    .distributor_costs
                    .entry(pr.distributor_name.clone())
                    .or_insert(0.0) += pr.total_cost_payable;
            }
        }
        summary
    }
}

fn writer() -> csv::Writer<Vec<u8>> {
    // Sections have different widths, so record lengths vary
    csv::WriterBuilder::new().flexible(true).from_writer(vec![])
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> EodResult<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| EodError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EodError::Export(e.to_string()))
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Render one day's report as a flattened CSV document
pub fn daily_report_csv(report: &DailyReport) -> EodResult<String> {
    let mut wtr = writer();
    let err = |e: csv::Error| EodError::Export(e.to_string());

    wtr.write_record(["P&L Summary", "Amount"]).map_err(err)?;
    wtr.write_record(["Date", report.id.as_str()]).map_err(err)?;
    wtr.write_record(["Total Gross Revenue", money(report.total_gross_revenue).as_str()])
        .map_err(err)?;
    wtr.write_record(["Total COGS", money(report.total_cogs).as_str()])
        .map_err(err)?;
    wtr.write_record(["Total Net Profit", money(report.total_net_profit).as_str()])
        .map_err(err)?;
    wtr.write_record([""]).map_err(err)?;

    wtr.write_record([
        "Vendor Sales & Profit",
        "Gross Revenue",
        "Total Load Sold",
        "COGS",
        "Net Profit",
    ])
    .map_err(err)?;
    for vr in &report.vendor_reports {
        wtr.write_record([
            vr.vendor_name.as_str(),
            money(vr.gross_revenue).as_str(),
            money(vr.total_load_sold).as_str(),
            money(vr.cogs).as_str(),
            money(vr.net_profit).as_str(),
        ])
        .map_err(err)?;
    }
    wtr.write_record([""]).map_err(err)?;

    wtr.write_record([
        "Distributor Purchases",
        "Total Load Received",
        "Total Cost Payable",
    ])
    .map_err(err)?;
    for pr in &report.purchase_reports {
        wtr.write_record([
            pr.distributor_name.as_str(),
            money(pr.total_load_received).as_str(),
            money(pr.total_cost_payable).as_str(),
        ])
        .map_err(err)?;
    }

    finish(wtr)
}

/// Render a month's aggregated figures as a flattened CSV document.
///
/// `label` names the month in the header, e.g. "2026-08".
pub fn monthly_report_csv(reports: &[DailyReport], label: &str) -> EodResult<String> {
    let summary = MonthlySummary::from_reports(reports);
    let mut wtr = writer();
    let err = |e: csv::Error| EodError::Export(e.to_string());

    wtr.write_record(["Monthly P&L Summary", "Amount"])
        .map_err(err)?;
    wtr.write_record(["Month", label]).map_err(err)?;
    wtr.write_record(["Total Gross Revenue", money(summary.total_gross_revenue).as_str()])
        .map_err(err)?;
    wtr.write_record(["Total COGS", money(summary.total_cogs).as_str()])
        .map_err(err)?;
    wtr.write_record(["Total Net Profit", money(summary.total_net_profit).as_str()])
        .map_err(err)?;
    wtr.write_record([""]).map_err(err)?;

    wtr.write_record(["Vendor Total Profit", "Net Profit"])
        .map_err(err)?;
    for (vendor, profit) in &summary.vendor_profits {
        wtr.write_record([vendor.as_str(), money(*profit).as_str()])
            .map_err(err)?;
    }
    wtr.write_record([""]).map_err(err)?;

    wtr.write_record(["Distributor Total Cost", "Total Cost Payable"])
        .map_err(err)?;
    for (distributor, cost) in &summary.distributor_costs {
        wtr.write_record([distributor.as_str(), money(*cost).as_str()])
            .map_err(err)?;
    }

    finish(wtr)
}
