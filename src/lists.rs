//! Dropdown lists for the manual price and decision columns.

use crate::columns::{column_letter, parse_a1, quote_sheet_name, Field};
use crate::error::{Error, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Helper sheet that receives lists too long to be written inline.
pub const LIST_SHEET: &str = "lists";

/// Excel rejects inline list formulas longer than this (quotes excluded).
pub const INLINE_LIST_LIMIT: usize = 255;

/// Manual price points offered when no price file is given.
pub const DEFAULT_PRICES: &[&str] = &[
    "99", "149", "199", "249", "299", "349", "399", "449", "499", "549", "599", "649", "699",
    "749", "799", "849", "899", "949", "999", "1099", "1199", "1299", "1399", "1499", "1699",
    "1899", "1999", "2499", "2999",
];

/// Pricing decision picked per row in the decision column.
///
/// The order is the order of the dropdown and of the branches in the
/// `new_price` formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    PriorityCompetitors,
    CurrentPrice,
    BaseMargin,
    Automator,
    Optimizer,
    Manual,
}

impl Decision {
    pub const ALL: [Decision; 6] = [
        Decision::PriorityCompetitors,
        Decision::CurrentPrice,
        Decision::BaseMargin,
        Decision::Automator,
        Decision::Optimizer,
        Decision::Manual,
    ];

    /// Label shown in the dropdown and matched by the `new_price` formula.
    pub fn label(self) -> &'static str {
        match self {
            Decision::PriorityCompetitors => "Приоритет конкурентов",
            Decision::CurrentPrice => "Текущая цена",
            Decision::BaseMargin => "Базовая маржинальность",
            Decision::Automator => "Автоматизатор",
            Decision::Optimizer => "Оптимизатор",
            Decision::Manual => "Вручную",
        }
    }

    /// Column whose value becomes the new price when this decision is picked.
    pub fn source(self) -> Field {
        match self {
            Decision::PriorityCompetitors => Field::CompPrice,
            Decision::CurrentPrice => Field::CurrentPrice,
            Decision::BaseMargin => Field::BaseMarginPrice,
            Decision::Automator => Field::AutomatorPrice,
            Decision::Optimizer => Field::OptimizerPrice,
            Decision::Manual => Field::ManualPrice,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Decision::ALL.into_iter().find(|d| d.label() == label.trim())
    }

    pub fn labels() -> Vec<String> {
        Decision::ALL.iter().map(|d| d.label().to_string()).collect()
    }
}

/// The two lists offered as dropdowns.
#[derive(Debug, Clone)]
pub struct PricingLists {
    pub prices: Vec<String>,
    pub decisions: Vec<String>,
}

impl Default for PricingLists {
    fn default() -> Self {
        Self {
            prices: DEFAULT_PRICES.iter().map(|p| p.to_string()).collect(),
            decisions: Decision::labels(),
        }
    }
}

/// Where a validation takes its allowed values from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    /// Values embedded in the rule, e.g. `"99,149,199"`.
    Inline(String),
    /// Absolute range holding the values, e.g. `lists!$A$1:$A$40`.
    Range(String),
}

impl ListSource {
    /// Inline source for `items`, or `None` when they cannot be embedded.
    pub fn inline(items: &[String]) -> Option<Self> {
        if items.iter().any(|item| item.contains(',')) {
            return None;
        }

        let joined = items.join(",");
        if joined.chars().count() > INLINE_LIST_LIMIT {
            return None;
        }

        Some(ListSource::Inline(format!("\"{}\"", joined.replace('"', "\"\""))))
    }

    /// Validation `formula1` text (OOXML stores it without a leading `=`).
    pub fn formula(&self) -> &str {
        match self {
            ListSource::Inline(formula) | ListSource::Range(formula) => formula,
        }
    }
}

/// List sources resolved against a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLists {
    pub prices: ListSource,
    pub decisions: ListSource,
}

/// Resolve both lists, writing the ones that do not fit inline into the
/// helper sheet. Column A holds prices, column B decisions.
pub fn stage_lists(book: &mut Spreadsheet, lists: &PricingLists) -> Result<ResolvedLists> {
    Ok(ResolvedLists {
        prices: resolve(book, &lists.prices, 1)?,
        decisions: resolve(book, &lists.decisions, 2)?,
    })
}

fn resolve(book: &mut Spreadsheet, items: &[String], column: u32) -> Result<ListSource> {
    if let Some(source) = ListSource::inline(items) {
        return Ok(source);
    }

    if book.get_sheet_by_name(LIST_SHEET).is_none() {
        book.new_sheet(LIST_SHEET).map_err(|e| Error::InvalidExcel {
            path: PathBuf::new(),
            details: format!("cannot add sheet {}: {}", LIST_SHEET, e),
        })?;
    }

    let sheet = book
        .get_sheet_by_name_mut(LIST_SHEET)
        .ok_or_else(|| Error::SheetNotFound {
            name: LIST_SHEET.to_string(),
            available: String::new(),
        })?;

    let foreign = foreign_values(sheet, column, items);
    if foreign > 0 {
        warn!(
            sheet = LIST_SHEET,
            column = %column_letter(column),
            cells = foreign,
            "helper sheet holds other values in this column, they will be overwritten"
        );
    }

    for (offset, item) in items.iter().enumerate() {
        sheet
            .get_cell_mut((column, offset as u32 + 1))
            .set_value(item.clone());
    }

    let letter = column_letter(column);
    let range = format!(
        "{}!${}$1:${}${}",
        quote_sheet_name(LIST_SHEET),
        letter,
        letter,
        items.len()
    );
    debug!(items = items.len(), %range, "list staged on helper sheet");

    Ok(ListSource::Range(range))
}

/// Count non-empty cells in `column` that differ from what staging `items`
/// would leave there. A previous run with the same list counts as none.
fn foreign_values(sheet: &Worksheet, column: u32, items: &[String]) -> usize {
    sheet
        .get_cell_collection()
        .into_iter()
        .filter_map(|cell| {
            let (col, row) = parse_a1(&cell.get_coordinate().get_coordinate())?;
            let value = cell.get_value();
            (col == column && !value.is_empty()).then(|| (row, value.to_string()))
        })
        .filter(|(row, value)| items.get(*row as usize - 1) != Some(value))
        .count()
}

/// Read allowed prices from the first column of a CSV file.
///
/// Blank cells and a leading `price`/`manual_price` header are skipped;
/// duplicates keep their first position.
pub fn load_prices(path: &Path, delimiter: u8) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;

    let mut seen = HashSet::new();
    let mut prices = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let Some(value) = record.get(0).map(str::trim) else {
            continue;
        };

        if value.is_empty() {
            continue;
        }
        if idx == 0 && matches!(value.to_lowercase().as_str(), "price" | "manual_price") {
            continue;
        }
        if seen.insert(value.to_string()) {
            prices.push(value.to_string());
        }
    }

    if prices.is_empty() {
        return Err(Error::InvalidPriceList(format!(
            "no prices in {}",
            path.display()
        )));
    }

    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decisions_map_to_source_columns() {
        let mapped: Vec<(&str, String)> = Decision::ALL
            .iter()
            .map(|d| (d.label(), d.source().letter()))
            .collect();

        assert_eq!(
            mapped,
            vec![
                ("Приоритет конкурентов", "Z".to_string()),
                ("Текущая цена", "T".to_string()),
                ("Базовая маржинальность", "Y".to_string()),
                ("Автоматизатор", "U".to_string()),
                ("Оптимизатор", "W".to_string()),
                ("Вручную", "AA".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Decision::from_label(" Вручную "), Some(Decision::Manual));
        assert_eq!(Decision::from_label("Manual"), None);
        assert_eq!(Decision::from_label(""), None);
    }

    #[test]
    fn test_default_lists_fit_inline() {
        let lists = PricingLists::default();
        assert_eq!(lists.decisions.len(), 6);

        let decisions = ListSource::inline(&lists.decisions).unwrap();
        assert_eq!(
            decisions.formula(),
            "\"Приоритет конкурентов,Текущая цена,Базовая маржинальность,Автоматизатор,Оптимизатор,Вручную\""
        );
        assert!(ListSource::inline(&lists.prices).is_some());
    }

    #[test]
    fn test_inline_rejects_commas_and_long_lists() {
        let with_comma = vec!["1,5".to_string(), "2".to_string()];
        assert_eq!(ListSource::inline(&with_comma), None);

        let long: Vec<String> = (1000..1100).map(|p| p.to_string()).collect();
        assert_eq!(ListSource::inline(&long), None);
    }

    #[test]
    fn test_inline_doubles_quotes() {
        let items = vec!["5\"".to_string()];
        assert_eq!(
            ListSource::inline(&items),
            Some(ListSource::Inline("\"5\"\"\"".to_string()))
        );
    }

    #[test]
    fn test_stage_lists_writes_helper_sheet() {
        let mut book = umya_spreadsheet::new_file();
        let lists = PricingLists {
            prices: (1000..1100).map(|p| p.to_string()).collect(),
            decisions: Decision::labels(),
        };

        let resolved = stage_lists(&mut book, &lists).unwrap();
        assert_eq!(
            resolved.prices,
            ListSource::Range("lists!$A$1:$A$100".to_string())
        );
        assert!(matches!(resolved.decisions, ListSource::Inline(_)));

        let sheet = book.get_sheet_by_name(LIST_SHEET).unwrap();
        assert_eq!(sheet.get_value((1, 1)), "1000");
        assert_eq!(sheet.get_value((1, 100)), "1099");

        // staging again reuses the sheet
        stage_lists(&mut book, &lists).unwrap();
        let count = book
            .get_sheet_collection()
            .iter()
            .filter(|s| s.get_name() == LIST_SHEET)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_foreign_values_on_user_sheet() {
        let items: Vec<String> = (1000..1100).map(|p| p.to_string()).collect();
        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.new_sheet(LIST_SHEET).unwrap();
            sheet.get_cell_mut("A1").set_value("my notes");
            sheet.get_cell_mut("A200").set_value("more notes");
            sheet.get_cell_mut("B1").set_value("untouched column");
        }
        let sheet = book.get_sheet_by_name(LIST_SHEET).unwrap();
        assert_eq!(foreign_values(sheet, 1, &items), 2);

        let lists = PricingLists {
            prices: items.clone(),
            decisions: Decision::labels(),
        };
        stage_lists(&mut book, &lists).unwrap();

        // after staging only the row past the list still differs
        let sheet = book.get_sheet_by_name(LIST_SHEET).unwrap();
        assert_eq!(sheet.get_value("A1"), "1000");
        assert_eq!(sheet.get_value("B1"), "untouched column");
        assert_eq!(foreign_values(sheet, 1, &items), 1);
    }

    #[test]
    fn test_foreign_values_ignores_previous_run() {
        let items: Vec<String> = (1000..1100).map(|p| p.to_string()).collect();
        let mut book = umya_spreadsheet::new_file();
        let lists = PricingLists {
            prices: items.clone(),
            decisions: Decision::labels(),
        };
        stage_lists(&mut book, &lists).unwrap();

        let sheet = book.get_sheet_by_name(LIST_SHEET).unwrap();
        assert_eq!(foreign_values(sheet, 1, &items), 0);
    }

    #[test]
    fn test_stage_lists_leaves_book_alone_when_inline() {
        let mut book = umya_spreadsheet::new_file();
        stage_lists(&mut book, &PricingLists::default()).unwrap();
        assert!(book.get_sheet_by_name(LIST_SHEET).is_none());
    }

    #[test]
    fn test_load_prices() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "price,comment").unwrap();
        writeln!(file, "199,cheap").unwrap();
        writeln!(file, " 299 ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "199").unwrap();
        writeln!(file, "\"1,5\"").unwrap();
        file.flush().unwrap();

        let prices = load_prices(file.path(), b',').unwrap();
        assert_eq!(prices, vec!["199", "299", "1,5"]);
    }

    #[test]
    fn test_load_prices_semicolon() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "49;a").unwrap();
        writeln!(file, "99;b").unwrap();
        file.flush().unwrap();

        let prices = load_prices(file.path(), b';').unwrap();
        assert_eq!(prices, vec!["49", "99"]);
    }

    #[test]
    fn test_load_prices_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_prices(file.path(), b',').unwrap_err();
        assert!(matches!(err, Error::InvalidPriceList(_)));
    }

    #[test]
    fn test_load_prices_missing_file() {
        let err = load_prices(Path::new("/nonexistent/prices.csv"), b',').unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
