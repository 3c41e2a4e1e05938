pub mod cli;
pub mod compare;
pub mod config;
pub mod data;
pub mod database;
pub mod io_utils;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod rules;
pub mod schema;
pub mod search;
pub mod sheets;
pub mod source;
pub mod workbook;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    compare::ComparisonOptions,
    config::ComparisonConfig,
    database::SqliteReader,
    reconcile::Reconciler,
    workbook::WorkbookReader,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_recon", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => handle_compare(&args),
        Commands::Sheets(args) => handle_sheets(&args),
        Commands::Search(args) => handle_search(&args),
    }
}

fn handle_compare(args: &cli::CompareArgs) -> Result<()> {
    let config = ComparisonConfig::load(&args.config)?;
    info!(
        "Comparing {} table(s) from {:?} against workbooks in {:?}",
        config.tables.len(),
        args.db,
        args.excel_dir
    );
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let workbooks = WorkbookReader::new(args.delimiter, encoding);
    let database = SqliteReader::open(&args.db)?;
    let reconciler = Reconciler::new(
        &workbooks,
        &database,
        &args.excel_dir,
        ComparisonOptions {
            ignore_missing_source_columns: args.ignore_missing_source_columns,
        },
    );
    let reports = reconciler.run(&config);

    let cell_limit = (args.max_cell_rows > 0).then_some(args.max_cell_rows);
    report::print_grid(&report::headers(), &report::finding_rows(&reports, cell_limit));
    println!("{}", report::summary_line(&reports));

    if let Some(dir) = &args.report_dir {
        let contents = report::render(&reports, args.format)?;
        let name = report::report_file_name(chrono::Local::now().naive_local(), args.format);
        let path = io_utils::write_report_file(dir, &name, &contents)
            .with_context(|| format!("Saving report into {dir:?}"))?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

fn handle_sheets(args: &cli::SheetsArgs) -> Result<()> {
    let listing = sheets::list_sheets(&args.folder, &WorkbookReader::default())?;
    debug!("Found {} sheet(s) in {:?}", listing.len(), args.folder);
    println!("Found the following workbooks and worksheets:");
    for (file, sheet) in listing {
        println!("{file} -> {sheet}");
    }
    Ok(())
}

fn handle_search(args: &cli::SearchArgs) -> Result<()> {
    let pattern = search::Pattern::new(&args.term, args.regex)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let matches = search::search_folder(&args.folder, &pattern, &WorkbookReader::new(None, encoding))?;
    if matches.is_empty() {
        println!("No matches found.");
        return Ok(());
    }
    println!("=== MATCHES FOUND ===");
    for found in &matches {
        println!("{}", search::format_match(found));
    }
    info!("{} match(es) for '{}'", matches.len(), args.term);
    Ok(())
}
