use crate::configurator::CellWrite;
use crate::error::{Error, Result};
use crate::evaluator::EvaluatedRow;
use crate::OutputFormat;
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;
use umya_spreadsheet::Spreadsheet;

pub struct CsvConfig {
    pub format: OutputFormat,
    pub empty_value: String,
}

pub fn save_workbook(workbook: &Spreadsheet, path: &Path) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(workbook, path).map_err(|e| Error::WriteFailed {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// Write planned cell writes as `cell,kind,content` records.
pub fn write_plan<W: Write>(writes: &[CellWrite], writer: W, config: &CsvConfig) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(config.format.delimiter())
        .from_writer(writer);

    csv_writer.write_record(["cell", "kind", "content"])?;
    for write in writes {
        csv_writer.write_record([
            write.address().as_str(),
            write.content.kind(),
            write.content.text(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write recalculated decisions and prices as `row,decision,new_price`.
pub fn write_evaluated<W: Write>(
    rows: &[EvaluatedRow],
    writer: W,
    config: &CsvConfig,
) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(config.format.delimiter())
        .from_writer(writer);

    csv_writer.write_record(["row", "decision", "new_price"])?;
    for row in rows {
        let record = [
            row.row.to_string(),
            or_empty(&row.decision, &config.empty_value),
            or_empty(&row.new_price, &config.empty_value),
        ];
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn or_empty(value: &str, empty: &str) -> String {
    if value.is_empty() {
        empty.to_string()
    } else {
        value.to_string()
    }
}
