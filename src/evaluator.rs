//! Recalculation preview using formualizer-workbook.
//!
//! Loads a configured workbook, applies what-if overrides and evaluates every
//! formula so the resulting `new_price` column can be inspected without
//! opening a spreadsheet application.

use crate::columns::{parse_a1, Field, FIRST_DATA_ROW};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use formualizer_workbook::{
    backends::UmyaAdapter,
    traits::{LoadStrategy, SpreadsheetReader},
    LiteralValue, Workbook, WorkbookConfig,
};
use std::path::Path;
use tracing::debug;

/// Configuration for formula evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvalConfig {
    /// Cell value overrides applied before evaluation, in order.
    /// Key format: "SheetName!A1" or "A1" (uses the pricing sheet).
    pub overrides: Vec<(String, String)>,
}

impl EvalConfig {
    /// Build from `CELL=VALUE` arguments.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let overrides = args
            .iter()
            .map(|arg| {
                arg.split_once('=')
                    .filter(|(cell, _)| !cell.trim().is_empty())
                    .map(|(cell, value)| (cell.trim().to_string(), value.to_string()))
                    .ok_or_else(|| Error::InvalidOverride(arg.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { overrides })
    }
}

/// Recalculated pricing outcome of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedRow {
    pub row: u32,
    pub decision: String,
    pub new_price: String,
}

/// Evaluated workbook containing recalculated cell values.
pub struct EvaluatedWorkbook {
    workbook: Workbook,
    sheet_names: Vec<String>,
}

impl EvaluatedWorkbook {
    /// Load and evaluate an Excel file. Overrides without a sheet prefix
    /// target `default_sheet`.
    pub fn load(path: &Path, default_sheet: &str, config: &EvalConfig) -> Result<Self> {
        let invalid = |details: String| Error::InvalidExcel {
            path: path.to_path_buf(),
            details,
        };

        let adapter =
            UmyaAdapter::open_path(path).map_err(|e| invalid(format!("formualizer: {}", e)))?;

        // Get sheet names before consuming adapter
        let sheet_names = adapter
            .sheet_names()
            .map_err(|e| invalid(format!("formualizer: {}", e)))?;

        let wb_config = WorkbookConfig::ephemeral();
        let mut workbook = Workbook::from_reader(adapter, LoadStrategy::EagerAll, wb_config)
            .map_err(|e| invalid(format!("formualizer: {}", e)))?;

        for (cell_ref, value) in &config.overrides {
            let (sheet, col, row) = parse_cell_reference(cell_ref, default_sheet, &sheet_names)?;
            debug!(%sheet, col, row, value = value.as_str(), "override");

            workbook
                .set_value(&sheet, row, col, parse_value(value))
                .map_err(|e| invalid(format!("failed to set {}: {}", cell_ref, e)))?;
        }

        workbook
            .evaluate_all()
            .map_err(|e| invalid(format!("evaluation failed: {}", e)))?;

        Ok(Self {
            workbook,
            sheet_names,
        })
    }

    /// Get the evaluated value of a cell as a formatted string.
    pub fn get_value(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.workbook
            .get_value(sheet, row, col)
            .map(|value| format_literal(&value))
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Decision and resulting price for every data row up to `last_row`.
    pub fn pricing_rows(&self, sheet: &str, last_row: u32) -> Vec<EvaluatedRow> {
        (FIRST_DATA_ROW..=last_row)
            .map(|row| EvaluatedRow {
                row,
                decision: self
                    .get_value(sheet, row, Field::Decision.index())
                    .unwrap_or_default(),
                new_price: self
                    .get_value(sheet, row, Field::NewPrice.index())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Format a LiteralValue for CSV output.
fn format_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Empty => String::new(),
        LiteralValue::Int(i) => i.to_string(),
        LiteralValue::Number(n) => {
            // Format without unnecessary decimal places
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
        LiteralValue::Text(s) => s.clone(),
        LiteralValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        LiteralValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        LiteralValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        LiteralValue::Time(t) => t.format("%H:%M:%S").to_string(),
        LiteralValue::Duration(dur) => format!("{}s", dur.num_seconds()),
        LiteralValue::Error(e) => format!("{}", e),
        LiteralValue::Array(_) => String::from("{...}"),
        LiteralValue::Pending => String::from("#PENDING"),
    }
}

/// Parse a cell reference string into (sheet, col, row).
fn parse_cell_reference(
    cell_ref: &str,
    default_sheet: &str,
    sheet_names: &[String],
) -> Result<(String, u32, u32)> {
    let (sheet, cell) = match cell_ref.rsplit_once('!') {
        Some((sheet, cell)) => (sheet.trim_matches('\'').to_string(), cell),
        None => (default_sheet.to_string(), cell_ref),
    };

    if !sheet_names.iter().any(|n| n == &sheet) {
        return Err(Error::SheetNotFound {
            name: sheet,
            available: sheet_names.join(", "),
        });
    }

    let (col, row) = parse_a1(cell).ok_or_else(|| Error::InvalidOverride(cell_ref.to_string()))?;
    Ok((sheet, col, row))
}

/// Parse a string value into a LiteralValue.
fn parse_value(value: &str) -> LiteralValue {
    if value.eq_ignore_ascii_case("true") {
        return LiteralValue::Boolean(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return LiteralValue::Boolean(false);
    }

    if let Ok(i) = value.parse::<i64>() {
        return LiteralValue::Int(i);
    }

    if let Ok(n) = value.parse::<f64>() {
        return LiteralValue::Number(n);
    }

    // Try date (YYYY-MM-DD)
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return LiteralValue::Date(d);
    }

    LiteralValue::Text(value.to_string())
}
