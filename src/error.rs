use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid Excel file: {path} ({details})")]
    InvalidExcel { path: PathBuf, details: String },

    #[error("sheet \"{name}\" not found (available: {available})")]
    SheetNotFound { name: String, available: String },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error(".xls input is read-only, use -o <file.xlsx>")]
    OutputRequired,

    #[error("invalid price list: {0}")]
    InvalidPriceList(String),

    #[error("invalid override \"{0}\" (expected CELL=VALUE)")]
    InvalidOverride(String),

    #[error("failed to save workbook: {path} ({details})")]
    WriteFailed { path: PathBuf, details: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::FileNotFound(_) => 1,
            Error::InvalidExcel { .. } => 2,
            Error::SheetNotFound { .. } => 3,
            Error::UnsupportedFormat(_) => 3,
            Error::OutputRequired => 3,
            Error::InvalidPriceList(_) => 3,
            Error::InvalidOverride(_) => 3,
            Error::WriteFailed { .. } => 4,
            Error::Csv(_) => 4,
            Error::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
