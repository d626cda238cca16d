//! Fill the pricing columns of a worksheet.
//!
//! Configuration happens in two steps: [`plan`] lists every cell write for a
//! given row extent without touching a sheet, and [`apply`] performs those
//! writes. [`configure`] does both against the sheet's current extent.

use crate::columns::{parse_a1, Field, FIRST_DATA_ROW, HEADER_ROW};
use crate::formulas::{self, FormulaOptions};
use crate::lists::{ListSource, ResolvedLists};
use tracing::debug;
use umya_spreadsheet::{DataValidation, DataValidationValues, DataValidations, Worksheet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    Header(&'static str),
    Formula(String),
    Validation(ListSource),
}

impl CellContent {
    pub fn kind(&self) -> &'static str {
        match self {
            CellContent::Header(_) => "header",
            CellContent::Formula(_) => "formula",
            CellContent::Validation(_) => "validation",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            CellContent::Header(label) => *label,
            CellContent::Formula(formula) => formula.as_str(),
            CellContent::Validation(source) => source.formula(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub row: u32,
    pub field: Field,
    pub content: CellContent,
}

impl CellWrite {
    pub fn address(&self) -> String {
        self.field.cell(self.row)
    }
}

/// Counts of what a run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub last_row: u32,
    pub rows: u32,
    pub headers: usize,
    pub formulas: usize,
    pub validations: usize,
    pub validations_replaced: usize,
}

/// Last row holding a value or formula, as seen before any write.
///
/// Cells that only carry formatting do not count.
pub fn last_row(sheet: &Worksheet) -> u32 {
    sheet
        .get_cell_collection()
        .into_iter()
        .filter(|cell| !cell.get_value().is_empty() || !cell.get_formula().is_empty())
        .filter_map(|cell| parse_a1(&cell.get_coordinate().get_coordinate()))
        .map(|(_, row)| row)
        .max()
        .unwrap_or(0)
}

/// Every write needed for a sheet whose data ends at `last_row`.
///
/// Headers come first, then each data row in order with its cells in
/// column order. A `last_row` below the first data row yields headers only.
pub fn plan(last_row: u32, lists: &ResolvedLists, opts: &FormulaOptions) -> Vec<CellWrite> {
    let data_rows = last_row.saturating_sub(HEADER_ROW) as usize;
    let mut writes = Vec::with_capacity(Field::OUTPUTS.len() * (data_rows + 1));

    for field in Field::OUTPUTS {
        if let Some(label) = field.header() {
            writes.push(CellWrite {
                row: HEADER_ROW,
                field,
                content: CellContent::Header(label),
            });
        }
    }

    for row in FIRST_DATA_ROW..=last_row {
        let row_writes = [
            (Field::BaseMarginPrice, CellContent::Formula(opts.base_margin_price(row))),
            (Field::CompPrice, CellContent::Formula(opts.comp_price(row))),
            (Field::ManualPrice, CellContent::Validation(lists.prices.clone())),
            (Field::Decision, CellContent::Validation(lists.decisions.clone())),
            (Field::NewPrice, CellContent::Formula(formulas::new_price(row))),
        ];

        writes.extend(
            row_writes
                .into_iter()
                .map(|(field, content)| CellWrite { row, field, content }),
        );
    }

    writes
}

/// Perform planned writes on `sheet`. Writing the same plan twice leaves the
/// sheet as after the first time.
pub fn apply(sheet: &mut Worksheet, writes: &[CellWrite]) -> Report {
    let mut report = Report::default();

    for write in writes {
        let coordinate = (write.field.index(), write.row);
        report.last_row = report.last_row.max(write.row);

        match &write.content {
            CellContent::Header(label) => {
                sheet.get_cell_mut(coordinate).set_value(*label);
                report.headers += 1;
            }
            CellContent::Formula(formula) => {
                // OOXML stores formulas without the leading '='.
                let cell = sheet.get_cell_mut(coordinate);
                cell.set_formula(formula.trim_start_matches('=').to_string());
                cell.get_cell_value_mut()
                    .set_formula_result_default(String::new());
                report.formulas += 1;
            }
            CellContent::Validation(source) => {
                if set_list_validation(sheet, write.address(), source) {
                    report.validations_replaced += 1;
                }
                report.validations += 1;
            }
        }
    }

    report.rows = report.last_row.saturating_sub(HEADER_ROW);
    report
}

/// Write headers, formulas and dropdowns for every data row of `sheet`.
pub fn configure(sheet: &mut Worksheet, lists: &ResolvedLists, opts: &FormulaOptions) -> Report {
    let last_row = last_row(sheet);
    debug!(sheet = sheet.get_name(), last_row, "configuring pricing columns");

    let writes = plan(last_row, lists, opts);
    let mut report = apply(sheet, &writes);
    report.last_row = last_row;
    report
}

/// Attach a list validation to `sqref`, replacing any rule on the same
/// range. Returns whether a rule was replaced.
fn set_list_validation(sheet: &mut Worksheet, sqref: String, source: &ListSource) -> bool {
    if sheet.get_data_validations().is_none() {
        sheet.set_data_validations(DataValidations::default());
    }
    let Some(dvs) = sheet.get_data_validations_mut() else {
        return false;
    };

    let list = dvs.get_data_validation_list_mut();
    let before = list.len();
    list.retain(|dv| {
        !dv.get_sequence_of_references()
            .get_sqref()
            .replace(' ', "")
            .eq_ignore_ascii_case(&sqref)
    });
    let replaced = list.len() < before;

    let mut dv = DataValidation::default();
    dv.set_type(DataValidationValues::List);
    dv.get_sequence_of_references_mut().set_sqref(sqref);
    dv.set_allow_blank(true);
    dv.set_formula1(source.formula().to_string());
    dv.set_show_error_message(true);
    dv.set_error_title("Invalid value");
    dv.set_error_message("Pick a value from the list.");

    dvs.add_data_validation_list(dv);
    replaced
}
