//! Tolerant purchase-table parser.
//!
//! Distributor portals export the daily purchase sheet as an ".xls" file
//! that is really an HTML document with one `<table>` in it. The parser
//! scans that first table, locates the required logical columns by header
//! synonym, and aggregates per-distributor purchase totals. Row-level
//! problems are skipped and collected as warnings; only a structurally
//! unusable file fails the whole parse.

use log::{info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::types::{DailyPurchaseReport, Distributor};

/// Logical columns the parser knows how to locate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    SimNo,
    OpenBal,
    TotalAmount,
    CloseBal,
    Description,
}

impl Column {
    /// Map a raw header cell to a logical column, tolerating the synonyms
    /// seen in real exports. Case-insensitive.
    fn from_header(text: &str) -> Option<Self> {
        match text.trim().to_uppercase().as_str() {
            "LAPU NO" | "LAPU NO." => Some(Column::SimNo),
            "OPEN BAL" | "OPEN BAL." => Some(Column::OpenBal),
            "TOTAL AMOUNT" | "TOTAL" => Some(Column::TotalAmount),
            "CLOSE BAL" | "CLOSE BAL." => Some(Column::CloseBal),
            "DESC" | "DESCRIPTION" => Some(Column::Description),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Column::SimNo => "LAPU NO",
            Column::OpenBal => "OPEN BAL",
            Column::TotalAmount => "TOTAL AMOUNT",
            Column::CloseBal => "CLOSE BAL",
            Column::Description => "DESC",
        }
    }
}

/// A SIM that appeared in the purchase file but has no assigned distributor
#[derive(Debug, Clone, PartialEq)]
pub struct UnassignedSim {
    pub sim_no: String,
    pub description: String,
}

/// Outcome of a successful parse: aggregates plus soft diagnostics
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Per-distributor aggregates, keyed by distributor name
    pub purchase_reports: HashMap<String, DailyPurchaseReport>,
    pub total_load_received: f64,
    pub total_cost_payable: f64,
    /// Blended cost factor: total cost over total load, 0 when no load
    pub master_cost_factor: f64,
    /// Rows excluded from totals because their SIM is unassigned
    pub unassigned_sims: Vec<UnassignedSim>,
    /// Row-level problems that were skipped over
    pub warnings: Vec<String>,
}

/// Fatal parse failures; no aggregate is produced when these occur
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no table found in the uploaded file")]
    NoTable,
    #[error("table has a header but no data rows")]
    NoDataRows,
    #[error("invalid file format, missing required columns: {0}")]
    MissingColumns(String),
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").unwrap())
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap())
}

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<t[hd][^>]*>(.*?)</t[hd]>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

/// Strip nested markup and decode the handful of entities the exports use
fn cell_text(raw: &str) -> String {
    let stripped = tag_re().replace_all(raw, " ");
    stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// Parse a numeric cell like "1,234.00" or "5000" into whole currency units.
///
/// Thousands separators are stripped and anything after a decimal point is
/// truncated. An empty cell reads as 0; anything else unparseable is `None`.
fn parse_amount(text: &str) -> Option<i64> {
    let cleaned = text.replace(',', "");
    let integral = cleaned.split('.').next().unwrap_or("").trim();
    if integral.is_empty() {
        return Some(0);
    }
    integral.parse::<i64>().ok()
}

/// Normalize a SIM identifier, truncating numeric-export artifacts
/// like "1234.0" down to "1234"
fn normalize_sim_no(text: &str) -> String {
    text.trim().split('.').next().unwrap_or("").to_string()
}

/// Parse one uploaded purchase export against the SIM-to-distributor index.
///
/// Pure function over its inputs: no storage access, no side effects.
/// Persistence of the resulting aggregates is the caller's responsibility.
pub fn parse(
    content: &str,
    sim_index: &HashMap<String, Distributor>,
) -> Result<ParseResult, ParseError> {
    let table = table_re()
        .captures(content)
        .and_then(|c| c.get(1))
        .ok_or(ParseError::NoTable)?;

    let rows: Vec<&str> = row_re()
        .captures_iter(table.as_str())
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    // Need at least one header row and one data row
    if rows.len() < 2 {
        return Err(ParseError::NoDataRows);
    }

    let headers = find_headers(rows[0]);
    info!("Located purchase table headers: {:?}", headers);

    let required = [
        Column::SimNo,
        Column::OpenBal,
        Column::TotalAmount,
        Column::CloseBal,
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|c| !headers.contains_key(c))
        .map(|c| c.label())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingColumns(missing.join(", ")));
    }

    // Column positions count unrecognized headers too, so a row is usable
    // only when it reaches past the right-most required column.
    let cells_needed = required
        .iter()
        .filter_map(|c| headers.get(c))
        .copied()
        .max()
        .unwrap_or(0)
        + 1;

    let mut result = ParseResult::default();

    for (row_no, row) in rows.iter().enumerate().skip(1) {
        let cells: Vec<String> = cell_re()
            .captures_iter(row)
            .filter_map(|c| c.get(1))
            .map(|m| cell_text(m.as_str()))
            .collect();
        if cells.len() < cells_needed {
            let msg = format!(
                "skipping malformed row {}: expected >= {} cells, got {}",
                row_no,
                cells_needed,
                cells.len()
            );
            warn!("{}", msg);
            result.warnings.push(msg);
            continue;
        }

        let open_bal = parse_amount(&cells[headers[&Column::OpenBal]]);
        let total_amount = parse_amount(&cells[headers[&Column::TotalAmount]]);
        let close_bal = parse_amount(&cells[headers[&Column::CloseBal]]);
        let (open_bal, total_amount, close_bal) = match (open_bal, total_amount, close_bal) {
            (Some(o), Some(t), Some(c)) => (o, t, c),
            _ => {
                let msg = format!("skipping row {}: unparseable numeric cell", row_no);
                warn!("{}", msg);
                result.warnings.push(msg);
                continue;
            }
        };

        let sim_no = normalize_sim_no(&cells[headers[&Column::SimNo]]);

        let load_received = (close_bal - open_bal + total_amount) as f64;
        // No purchase occurred on this SIM today
        if load_received <= 0.0 {
            continue;
        }

        let Some(distributor) = sim_index.get(&sim_no) else {
            // The description column is optional and may sit past the end
            // of a ragged row
            let description = headers
                .get(&Column::Description)
                .and_then(|&i| cells.get(i).cloned())
                .unwrap_or_else(|| "N/A".to_string());
            result.unassigned_sims.push(UnassignedSim {
                sim_no,
                description,
            });
            continue;
        };

        let cost_payable = load_received * distributor.payable_factor();

        result.total_load_received += load_received;
        result.total_cost_payable += cost_payable;

        let report = result
            .purchase_reports
            .entry(distributor.name.clone())
            .or_insert_with(|| DailyPurchaseReport {
                distributor_name: distributor.name.clone(),
                ..Default::default()
            });
        report.total_load_received += load_received;
        report.total_cost_payable += cost_payable;
    }

    result.master_cost_factor = if result.total_load_received == 0.0 {
        0.0
    } else {
        result.total_cost_payable / result.total_load_received
    };

    Ok(result)
}

/// Locate logical columns in the header row
fn find_headers(header_row: &str) -> HashMap<Column, usize> {
    let mut headers = HashMap::new();
    for (i, cap) in cell_re().captures_iter(header_row).enumerate() {
        if let Some(m) = cap.get(1) {
            if let Some(column) = Column::from_header(&cell_text(m.as_str())) {
                headers.insert(column, i);
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> HashMap<String, Distributor> {
        let mut index = HashMap::new();
        index.insert(
            "9001".to_string(),
            Distributor::new("Jio Rakesh".to_string(), 515.0, 505.0),
        );
        index.insert(
            "9002".to_string(),
            Distributor::new("Airtel North".to_string(), 100.0, 98.0),
        );
        index
    }

    fn table(rows: &str) -> String {
        format!(
            "<html><body><table>\
             <tr><th>LAPU NO</th><th>DESC</th><th>OPEN BAL</th>\
             <th>TOTAL AMOUNT</th><th>CLOSE BAL</th></tr>{rows}</table></body></html>"
        )
    }

    fn row(sim: &str, desc: &str, open: &str, total: &str, close: &str) -> String {
        format!(
            "<tr><td>{sim}</td><td>{desc}</td><td>{open}</td>\
             <td>{total}</td><td>{close}</td></tr>"
        )
    }

    #[test]
    fn aggregates_one_matched_row() {
        let html = table(&row("9001", "Jio sim", "100", "1000", "50"));
        let result = parse(&html, &sample_index()).unwrap();

        // loadReceived = 50 - 100 + 1000 = 950
        assert_eq!(result.total_load_received, 950.0);
        let report = &result.purchase_reports["Jio Rakesh"];
        assert_eq!(report.total_load_received, 950.0);
        assert!((report.total_cost_payable - 950.0 * 505.0 / 515.0).abs() < 1e-9);
        assert!((result.master_cost_factor - 505.0 / 515.0).abs() < 1e-9);
        assert!(result.unassigned_sims.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn accumulates_multiple_sims_per_distributor() {
        let rows = format!(
            "{}{}",
            row("9001", "a", "0", "500", "0"),
            row("9001", "b", "0", "250", "0")
        );
        let result = parse(&table(&rows), &sample_index()).unwrap();
        assert_eq!(result.purchase_reports.len(), 1);
        assert_eq!(
            result.purchase_reports["Jio Rakesh"].total_load_received,
            750.0
        );
    }

    #[test]
    fn unknown_sim_goes_to_unassigned_with_description() {
        let rows = format!(
            "{}{}",
            row("9001", "ok", "0", "100", "0"),
            row("7777", "mystery sim", "0", "100", "0")
        );
        let result = parse(&table(&rows), &sample_index()).unwrap();
        assert_eq!(result.unassigned_sims.len(), 1);
        assert_eq!(result.unassigned_sims[0].sim_no, "7777");
        assert_eq!(result.unassigned_sims[0].description, "mystery sim");
        // Excluded from totals
        assert_eq!(result.total_load_received, 100.0);
    }

    #[test]
    fn missing_close_bal_column_is_fatal() {
        let html = "<table>\
            <tr><th>LAPU NO</th><th>OPEN BAL</th><th>TOTAL AMOUNT</th></tr>\
            <tr><td>9001</td><td>0</td><td>100</td></tr></table>";
        let err = parse(html, &sample_index()).unwrap_err();
        assert!(matches!(err, ParseError::MissingColumns(_)));
        assert!(err.to_string().contains("CLOSE BAL"));
    }

    #[test]
    fn no_table_is_fatal() {
        let err = parse("<html><p>nothing here</p></html>", &sample_index()).unwrap_err();
        assert!(matches!(err, ParseError::NoTable));
    }

    #[test]
    fn header_only_table_is_fatal() {
        let html = table("");
        let err = parse(&html, &sample_index()).unwrap_err();
        assert!(matches!(err, ParseError::NoDataRows));
    }

    #[test]
    fn short_row_skipped_with_warning() {
        let rows = format!(
            "<tr><td>9001</td><td>short</td></tr>{}",
            row("9001", "ok", "0", "100", "0")
        );
        let result = parse(&table(&rows), &sample_index()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.total_load_received, 100.0);
    }

    #[test]
    fn short_row_under_extra_columns_skipped_not_fatal() {
        // Real exports carry columns the mapper does not recognize; the
        // required ones then sit at positions beyond the recognized count
        let html = "<table>\
            <tr><th>S NO</th><th>LAPU NO</th><th>DESC</th><th>OPEN BAL</th>\
            <th>TOTAL AMOUNT</th><th>CLOSE BAL</th></tr>\
            <tr><td>1</td><td>9001</td><td>short</td><td>0</td></tr>\
            <tr><td>2</td><td>9001</td><td>ok</td><td>0</td><td>100</td><td>0</td></tr>\
            </table>";
        let result = parse(html, &sample_index()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.total_load_received, 100.0);
    }

    #[test]
    fn ragged_row_missing_trailing_description_still_parses() {
        // DESC last; the row stops one cell early but still covers the
        // required columns, so the unassigned SIM falls back to N/A
        let html = "<table>\
            <tr><th>LAPU NO</th><th>OPEN BAL</th><th>TOTAL AMOUNT</th>\
            <th>CLOSE BAL</th><th>DESC</th></tr>\
            <tr><td>7777</td><td>0</td><td>100</td><td>0</td></tr>\
            </table>";
        let result = parse(html, &sample_index()).unwrap();
        assert_eq!(result.unassigned_sims.len(), 1);
        assert_eq!(result.unassigned_sims[0].description, "N/A");
    }

    #[test]
    fn unparseable_numeric_cell_skips_row() {
        let rows = format!(
            "{}{}",
            row("9001", "bad", "0", "abc", "0"),
            row("9001", "ok", "0", "100", "0")
        );
        let result = parse(&table(&rows), &sample_index()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.total_load_received, 100.0);
    }

    #[test]
    fn strips_separators_and_decimal_tails() {
        let html = table(&row("9001.0", "x", "1,000.50", "2,500", "1,200.99"));
        let result = parse(&html, &sample_index()).unwrap();
        // 1200 - 1000 + 2500 = 2700, attributed to "9001"
        assert_eq!(result.total_load_received, 2700.0);
        assert!(result.purchase_reports.contains_key("Jio Rakesh"));
    }

    #[test]
    fn non_positive_load_rows_are_ignored() {
        let html = table(&row("9001", "idle", "500", "0", "500"));
        let result = parse(&html, &sample_index()).unwrap();
        assert!(result.purchase_reports.is_empty());
        assert_eq!(result.master_cost_factor, 0.0);
    }

    #[test]
    fn headers_match_case_insensitively_with_synonyms() {
        let html = "<table>\
            <tr><td>lapu no.</td><td>open bal.</td><td>Total</td><td>close bal.</td></tr>\
            <tr><td>9002</td><td>0</td><td>200</td><td>0</td></tr></table>";
        let result = parse(html, &sample_index()).unwrap();
        assert_eq!(result.total_load_received, 200.0);
        assert!((result.master_cost_factor - 0.98).abs() < 1e-9);
    }

    #[test]
    fn only_first_table_is_consulted() {
        let first = table(&row("9001", "x", "0", "100", "0"));
        let second = table(&row("9002", "y", "0", "900", "0"));
        let result = parse(&format!("{first}{second}"), &sample_index()).unwrap();
        assert_eq!(result.total_load_received, 100.0);
    }
}
