//! Formula text for the generated price columns.
//!
//! Each generator is a pure function of the row index; nothing here touches
//! a workbook. Formulas are returned the way a user would type them, with a
//! leading `=`.

use crate::columns::{quote_sheet_name, Field};
use crate::lists::Decision;

/// Sheet holding the two-column price rounding table.
pub const DEFAULT_LOOKUP_SHEET: &str = "price_rounding";

#[derive(Debug, Clone)]
pub struct FormulaOptions {
    /// Name of the sheet whose columns A:B map raw prices to rounded ones.
    pub lookup_sheet: String,
}

impl Default for FormulaOptions {
    fn default() -> Self {
        Self {
            lookup_sheet: DEFAULT_LOOKUP_SHEET.to_string(),
        }
    }
}

impl FormulaOptions {
    fn lookup_table(&self) -> String {
        format!("{}!A:B", quote_sheet_name(&self.lookup_sheet))
    }

    /// Round a value through the lookup table (approximate match).
    fn rounded(&self, value: &str) -> String {
        format!("=VLOOKUP({}, {}, 2, TRUE)", value, self.lookup_table())
    }

    /// `base_margin_price`: cost marked up to the target margin, then rounded.
    pub fn base_margin_price(&self, row: u32) -> String {
        self.rounded(&format!(
            "ROUND({}/(1-{}))",
            Field::Cost.cell(row),
            Field::Margin.cell(row)
        ))
    }

    /// `comp_price`: first non-blank competitor price, then rounded.
    pub fn comp_price(&self, row: u32) -> String {
        let competitors = format!(
            "{}:{}",
            Field::CompetitorFirst.cell(row),
            Field::CompetitorLast.cell(row)
        );
        self.rounded(&format!(
            "INDEX({}, MATCH(TRUE, {} <> \"\", 0))",
            competitors, competitors
        ))
    }
}

/// `new_price`: the value of the column selected by the row's decision.
///
/// A decision cell holding anything other than one of the known labels
/// (including a blank one) yields an empty string.
pub fn new_price(row: u32) -> String {
    let decision = Field::Decision.cell(row);
    let branches: Vec<String> = Decision::ALL
        .iter()
        .map(|d| {
            format!(
                "{}=\"{}\", {}",
                decision,
                d.label(),
                d.source().cell(row)
            )
        })
        .collect();

    format!("=IFS({}, TRUE, \"\")", branches.join(", "))
}
