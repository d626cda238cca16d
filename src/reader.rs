use crate::error::{Error, Result};
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

pub fn open_workbook(path: &Path) -> Result<Spreadsheet> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    match extension(path).as_str() {
        "xlsx" | "xlsm" => open_xlsx(path),
        "xls" => open_xls(path),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

/// Lowercased file extension, empty when there is none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Legacy .xls files can be read but not written back.
pub fn is_read_only(path: &Path) -> bool {
    extension(path) == "xls"
}

pub fn sheet_names(workbook: &Spreadsheet) -> Vec<String> {
    workbook
        .get_sheet_collection()
        .iter()
        .map(|s| s.get_name().to_string())
        .collect()
}

pub fn has_sheet(workbook: &Spreadsheet, name: &str) -> bool {
    workbook.get_sheet_by_name(name).is_some()
}

/// Look up a sheet by exact name.
pub fn sheet_mut<'a>(workbook: &'a mut Spreadsheet, name: &str) -> Result<&'a mut Worksheet> {
    let available = sheet_names(workbook).join(", ");
    workbook
        .get_sheet_by_name_mut(name)
        .ok_or_else(|| Error::SheetNotFound {
            name: name.to_string(),
            available,
        })
}

fn open_xlsx(path: &Path) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(path).map_err(|e| Error::InvalidExcel {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

fn open_xls(path: &Path) -> Result<Spreadsheet> {
    xlrd::open(path).map_err(|e| Error::InvalidExcel {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        let err = open_workbook(Path::new("/nonexistent/book.xlsx")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_open_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ods").tempfile().unwrap();
        let err = open_workbook(file.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ext) if ext == "ods"));
    }

    #[test]
    fn test_is_read_only() {
        assert!(is_read_only(Path::new("prices.XLS")));
        assert!(!is_read_only(Path::new("prices.xlsx")));
        assert!(!is_read_only(Path::new("prices")));
    }

    #[test]
    fn test_sheet_mut_reports_available_sheets() {
        let mut book = umya_spreadsheet::new_file();
        book.new_sheet("price_rounding").unwrap();

        assert!(sheet_mut(&mut book, "Sheet1").is_ok());
        assert!(has_sheet(&book, "price_rounding"));

        let err = sheet_mut(&mut book, "main").unwrap_err();
        match err {
            Error::SheetNotFound { name, available } => {
                assert_eq!(name, "main");
                assert_eq!(available, "Sheet1, price_rounding");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
