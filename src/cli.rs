//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvObservationAdapter, CsvQuoteAdapter};
use crate::adapters::csv_export_adapter::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::tracing_observer::TracingObserver;
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::acquisition::{fetch_universe, AcquisitionResult};
use crate::domain::config_validation::{
    validate_data_config, validate_index_config, validate_report_config, DataSettings,
    ReportFormat, ReportSettings,
};
use crate::domain::error::IndexError;
use crate::domain::index::IndexConfig;
use crate::domain::pipeline::{run_index, IndexRun};
use crate::domain::summary::IndexSummary;
use crate::logging::init_tracing;
use crate::ports::config_port::ConfigPort;
use crate::ports::observation_port::ObservationPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "eqindex", about = "Equal-weighted top-N market cap index builder")]
pub struct Cli {
    /// Log filter, e.g. `debug` or `eqindex=trace` (overrides [logging] level)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch prices and share counts into the SQLite store
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    /// Build the index from stored observations and export it
    Build {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Read observations from a `date,ticker,market_cap,price` CSV instead of SQLite
        #[arg(long)]
        observations: Option<PathBuf>,
    },
    /// Fetch, then build
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the date range held by the SQLite store
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let log_level = cli.log_level.as_deref();
    match cli.command {
        Command::Fetch {
            config,
            start_date,
            end_date,
        } => run_fetch(&config, start_date.as_deref(), end_date.as_deref(), log_level),
        Command::Build {
            config,
            output,
            observations,
        } => run_build(&config, output.as_ref(), observations.as_ref(), log_level),
        Command::Run {
            config,
            start_date,
            end_date,
            output,
        } => run_end_to_end(
            &config,
            start_date.as_deref(),
            end_date.as_deref(),
            output.as_ref(),
            log_level,
        ),
        Command::Validate { config } => run_validate(&config, log_level),
        Command::Info { config } => run_info(&config, log_level),
    }
}

fn fail(err: &IndexError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Load the config file and install logging from `--log-level` or
/// `[logging] level`.
fn load_config_with_logging(path: &Path, log_level: Option<&str>) -> Result<FileConfigAdapter, ExitCode> {
    let config = load_config(path)?;
    let level = log_level
        .map(str::to_string)
        .or_else(|| config.get_string("logging", "level"));
    init_tracing(level.as_deref()).map_err(|e| fail(&e))?;
    tracing::debug!(config = %path.display(), "configuration loaded");
    Ok(config)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(feature = "sqlite")]
pub fn open_store(
    config: &dyn ConfigPort,
) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, IndexError> {
    let store = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

/// Acquire the configured universe from the CSV quote source. An empty
/// result (every ticker failed) is a `NoData` error.
pub fn fetch_stage(data: &DataSettings) -> Result<AcquisitionResult, IndexError> {
    let source_dir = data
        .source_dir
        .clone()
        .ok_or_else(|| IndexError::missing("data", "source_dir"))?;
    let quotes = CsvQuoteAdapter::open(source_dir)?;
    let observer = TracingObserver::new();

    let result = fetch_universe(
        &quotes,
        &data.universe.tickers,
        data.start_date,
        data.end_date,
        data.workers,
        &observer,
    )?;

    for failure in &result.failures {
        tracing::warn!(ticker = %failure.ticker, reason = %failure.reason, "ticker skipped");
    }
    if result.observations.is_empty() {
        return Err(IndexError::NoData {
            reason: format!(
                "no observations fetched for {} tickers between {} and {}",
                data.universe.count(),
                data.start_date,
                data.end_date
            ),
        });
    }

    tracing::info!(
        companies = result.companies.len(),
        observations = result.observations.len(),
        failures = result.failures.len(),
        "acquisition finished"
    );
    Ok(result)
}

/// Read observations from `port` and run the index pipeline.
pub fn build_stage(
    port: &dyn ObservationPort,
    index: &IndexConfig,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<IndexRun, IndexError> {
    let raw = port.fetch_observations(range.map(|r| r.0), range.map(|r| r.1))?;
    tracing::info!(rows = raw.len(), size = index.size.get(), "building index");

    let run = run_index(raw, index);

    if !run.skipped.is_empty() {
        tracing::warn!(rows = run.skipped.len(), "input rows skipped during cleaning");
        for row in &run.skipped {
            tracing::debug!(row = row.row, date = %row.date, ticker = %row.ticker, reason = %row.reason, "skipped row");
        }
    }
    if run.is_empty() {
        tracing::warn!("no usable observations; exporting empty tables");
    }
    Ok(run)
}

pub fn report_adapters(report: &ReportSettings) -> Vec<Box<dyn ReportPort>> {
    report
        .formats
        .iter()
        .map(|format| -> Box<dyn ReportPort> {
            match format {
                ReportFormat::Csv => Box::new(CsvExportAdapter),
                ReportFormat::Typst => Box::new(TypstReportAdapter::new(
                    report.title.clone(),
                    report.template_path.clone(),
                )),
            }
        })
        .collect()
}

pub fn export_stage(
    run: &IndexRun,
    summary: &IndexSummary,
    report: &ReportSettings,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, IndexError> {
    let mut written = Vec::new();
    for adapter in report_adapters(report) {
        written.extend(adapter.write(run, summary, output_dir)?);
    }
    for path in &written {
        tracing::info!(path = %path.display(), "written");
    }
    Ok(written)
}

fn print_summary(summary: &IndexSummary) {
    eprintln!("\n=== Index Summary ===");
    match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => eprintln!("Period:           {} to {}", first, last),
        _ => eprintln!("Period:           -"),
    }
    eprintln!("Index Days:       {}", summary.index_days);
    eprintln!("Final Value:      {:.4}", summary.final_value);
    eprintln!("Total Return:     {:.2}%", summary.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", summary.annualized_return * 100.0);
    eprintln!("Volatility:       {:.2}%", summary.annualized_volatility * 100.0);
    eprintln!("Max Drawdown:     -{:.1}%", summary.max_drawdown * 100.0);
    eprintln!(
        "Changes:          {} days, +{} / -{}",
        summary.change_days, summary.total_additions, summary.total_removals
    );
    if summary.skipped_rows > 0 {
        eprintln!("Skipped Rows:     {}", summary.skipped_rows);
    }
}

fn finish(run: &IndexRun, report: &ReportSettings, output_dir: &Path) -> ExitCode {
    let summary = IndexSummary::compute(run);
    print_summary(&summary);

    match export_stage(run, &summary, report, output_dir) {
        Ok(paths) => {
            eprintln!("\nOutput written to: {}", output_dir.display());
            for path in paths {
                eprintln!("  {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_fetch(
    config_path: &Path,
    start_date: Option<&str>,
    end_date: Option<&str>,
    log_level: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config_with_logging(config_path, log_level) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data = match validate_data_config(&config, start_date, end_date, today()) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    #[cfg(feature = "sqlite")]
    {
        // Stage 2: Open store
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        };

        // Stage 3: Acquire and persist
        eprintln!(
            "Fetching {} tickers from {} to {}...",
            data.universe.count(),
            data.start_date,
            data.end_date
        );
        let acquired = match fetch_stage(&data) {
            Ok(a) => a,
            Err(e) => return fail(&e),
        };
        if let Err(e) = store
            .insert_companies(&acquired.companies)
            .and_then(|_| store.insert_observations(&acquired.observations))
        {
            return fail(&e);
        }

        eprintln!(
            "Stored {} observations for {} companies ({} tickers failed)",
            acquired.observations.len(),
            acquired.companies.len(),
            acquired.failures.len()
        );
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = data;
        eprintln!("error: sqlite feature is required for fetch");
        ExitCode::from(1)
    }
}

fn run_build(
    config_path: &Path,
    output_override: Option<&PathBuf>,
    observations_path: Option<&PathBuf>,
    log_level: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config_with_logging(config_path, log_level) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (index, report) = match validate_index_config(&config)
        .and_then(|index| Ok((index, validate_report_config(&config)?)))
    {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };
    let output_dir = output_override.cloned().unwrap_or_else(|| report.output_dir.clone());

    // Stage 2: Read observations and build
    let built = match observations_path {
        Some(path) => {
            eprintln!("Reading observations from {}", path.display());
            build_stage(&CsvObservationAdapter::new(path.clone()), &index, None)
        }
        None => build_from_store(&config, &index),
    };
    let run = match built {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 3: Summarize and export
    finish(&run, &report, &output_dir)
}

#[cfg(feature = "sqlite")]
fn build_from_store(config: &dyn ConfigPort, index: &IndexConfig) -> Result<IndexRun, IndexError> {
    let store = open_store(config)?;
    build_stage(&store, index, None)
}

#[cfg(not(feature = "sqlite"))]
fn build_from_store(_config: &dyn ConfigPort, _index: &IndexConfig) -> Result<IndexRun, IndexError> {
    Err(IndexError::invalid(
        "sqlite",
        "path",
        "sqlite feature is disabled; pass --observations",
    ))
}

fn run_end_to_end(
    config_path: &Path,
    start_date: Option<&str>,
    end_date: Option<&str>,
    output_override: Option<&PathBuf>,
    log_level: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate everything before any fetch
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config_with_logging(config_path, log_level) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let validated = validate_index_config(&config).and_then(|index| {
        let data = validate_data_config(&config, start_date, end_date, today())?;
        let report = validate_report_config(&config)?;
        Ok((index, data, report))
    });
    let (index, data, report) = match validated {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };
    let output_dir = output_override.cloned().unwrap_or_else(|| report.output_dir.clone());

    // Stage 2: Acquire
    eprintln!(
        "Fetching {} tickers from {} to {}...",
        data.universe.count(),
        data.start_date,
        data.end_date
    );
    let acquired = match fetch_stage(&data) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    // Stage 3: Persist and read back the requested range
    let run = match persist_and_build(&config, &index, &data, acquired) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 4: Summarize and export
    finish(&run, &report, &output_dir)
}

#[cfg(feature = "sqlite")]
fn persist_and_build(
    config: &dyn ConfigPort,
    index: &IndexConfig,
    data: &DataSettings,
    acquired: AcquisitionResult,
) -> Result<IndexRun, IndexError> {
    let store = open_store(config)?;
    store.insert_companies(&acquired.companies)?;
    store.insert_observations(&acquired.observations)?;
    build_stage(&store, index, Some((data.start_date, data.end_date)))
}

#[cfg(not(feature = "sqlite"))]
fn persist_and_build(
    _config: &dyn ConfigPort,
    index: &IndexConfig,
    _data: &DataSettings,
    acquired: AcquisitionResult,
) -> Result<IndexRun, IndexError> {
    Ok(crate::domain::pipeline::build_index(&acquired.observations, index))
}

fn run_validate(config_path: &Path, log_level: Option<&str>) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config_with_logging(config_path, log_level) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let index = match validate_index_config(&config) {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };
    eprintln!("\nIndex:");
    eprintln!("  size:         {}", index.size.get());
    eprintln!("  tie_break:    {}", index.tie_break);
    eprintln!("  weighting:    {}", index.weighting);
    eprintln!("  return_basis: {}", index.return_basis);

    if config.get_string("data", "tickers").is_some() {
        let data = match validate_data_config(&config, None, None, today()) {
            Ok(d) => d,
            Err(e) => return fail(&e),
        };
        eprintln!("\nData:");
        eprintln!("  tickers:      {}", data.universe.tickers.join(", "));
        eprintln!("  range:        {} to {}", data.start_date, data.end_date);
        eprintln!(
            "  source_dir:   {}",
            data.source_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        eprintln!("  workers:      {}", data.workers);
    } else {
        eprintln!("\nData: not configured (build only)");
    }

    let report = match validate_report_config(&config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let formats: Vec<String> = report.formats.iter().map(|f| f.to_string()).collect();
    eprintln!("\nReport:");
    eprintln!("  title:        {}", report.title);
    eprintln!("  output_dir:   {}", report.output_dir.display());
    eprintln!("  formats:      {}", formats.join(", "));
    if let Some(template) = &report.template_path {
        eprintln!("  template:     {}", template.display());
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, log_level: Option<&str>) -> ExitCode {
    let config = match load_config_with_logging(config_path, log_level) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        };
        let companies = match store.companies() {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };
        match store.get_data_range() {
            Ok(Some(range)) => {
                println!(
                    "{} rows, {} tickers, {} companies, {} to {}",
                    range.rows,
                    range.tickers,
                    companies.len(),
                    range.first_date,
                    range.last_date
                );
                ExitCode::SUCCESS
            }
            Ok(None) => {
                eprintln!("No data found");
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        eprintln!("error: sqlite feature is required for info");
        ExitCode::from(1)
    }
}
