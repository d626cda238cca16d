mod columns;
mod configurator;
mod error;
mod evaluator;
mod formulas;
mod lists;
mod reader;
mod writer;

use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    European,
}

impl OutputFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
            OutputFormat::European => b';',
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pricecols")]
#[command(version, about = "Fill spreadsheet pricing columns with lookup formulas and dropdowns")]
pub struct Args {
    /// Workbook to configure (.xlsx, .xlsm, or .xls with -o)
    pub input: PathBuf,

    /// Write the configured workbook here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sheet holding the pricing rows
    #[arg(short, long, default_value = "main")]
    pub sheet: String,

    /// Sheet whose columns A:B hold the price rounding table
    #[arg(long, default_value = formulas::DEFAULT_LOOKUP_SHEET)]
    pub lookup_sheet: String,

    /// CSV file whose first column lists the allowed manual prices
    #[arg(short, long)]
    pub prices: Option<PathBuf>,

    /// Delimiter of the price file and of CSV output
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Print the planned cell writes as CSV and leave the workbook untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Recalculate the saved workbook and print decision and new price per row
    #[arg(long, conflicts_with = "dry_run")]
    pub evaluate: bool,

    /// Override a cell before recalculating, e.g. AB2=Вручную (repeatable)
    #[arg(long = "set", value_name = "CELL=VALUE", requires = "evaluate")]
    pub overrides: Vec<String>,

    /// Value printed for empty evaluated cells
    #[arg(short, long, default_value = "")]
    pub empty: String,

    /// Print detailed progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pricecols=debug" } else { "pricecols=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> error::Result<()> {
    if reader::is_read_only(&args.input) && !args.dry_run {
        match &args.output {
            Some(output) if reader::extension(output) == "xlsx" => {}
            _ => return Err(error::Error::OutputRequired),
        }
    }

    let pricing_lists = match &args.prices {
        Some(path) => lists::PricingLists {
            prices: lists::load_prices(path, args.format.delimiter())?,
            ..Default::default()
        },
        None => lists::PricingLists::default(),
    };
    debug!(
        prices = pricing_lists.prices.len(),
        decisions = pricing_lists.decisions.len(),
        "lists loaded"
    );

    debug!(input = %args.input.display(), "reading workbook");
    let mut workbook = reader::open_workbook(&args.input)?;
    debug!(sheets = %reader::sheet_names(&workbook).join(", "));

    if !reader::has_sheet(&workbook, &args.lookup_sheet) {
        warn!(
            lookup_sheet = %args.lookup_sheet,
            "lookup sheet is missing, price formulas will not resolve until it exists"
        );
    }

    let opts = formulas::FormulaOptions {
        lookup_sheet: args.lookup_sheet.clone(),
    };
    let csv_config = writer::CsvConfig {
        format: args.format,
        empty_value: args.empty.clone(),
    };

    let resolved = lists::stage_lists(&mut workbook, &pricing_lists)?;
    let sheet = reader::sheet_mut(&mut workbook, &args.sheet)?;

    if args.dry_run {
        let writes = configurator::plan(configurator::last_row(sheet), &resolved, &opts);
        let stdout = io::stdout();
        return writer::write_plan(&writes, stdout.lock(), &csv_config);
    }

    let report = configurator::configure(sheet, &resolved, &opts);
    info!(
        sheet = %args.sheet,
        rows = report.rows,
        headers = report.headers,
        formulas = report.formulas,
        validations = report.validations,
        replaced = report.validations_replaced,
        "pricing columns configured"
    );

    let output = args.output.clone().unwrap_or_else(|| args.input.clone());
    debug!(output = %output.display(), "saving workbook");
    writer::save_workbook(&workbook, &output)?;

    if args.evaluate {
        let eval_config = evaluator::EvalConfig::from_args(&args.overrides)?;
        for (cell, value) in &eval_config.overrides {
            let target = cell.rsplit('!').next().unwrap_or(cell);
            let is_decision = columns::parse_a1(target)
                .is_some_and(|(col, _)| col == columns::Field::Decision.index());
            if is_decision && lists::Decision::from_label(value).is_none() {
                warn!(%cell, %value, "not a known decision, new_price will be empty");
            }
        }
        let evaluated = evaluator::EvaluatedWorkbook::load(&output, &args.sheet, &eval_config)?;
        debug!(sheets = %evaluated.sheet_names().join(", "), "workbook recalculated");

        let rows = evaluated.pricing_rows(&args.sheet, report.last_row);
        let stdout = io::stdout();
        writer::write_evaluated(&rows, stdout.lock(), &csv_config)?;
    }

    Ok(())
}
