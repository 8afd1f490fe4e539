//! Configuration validation.
//!
//! Every check runs before any data is read or fetched, and the first
//! offending key is reported.

use crate::domain::acquisition::DEFAULT_WORKERS;
use crate::domain::error::IndexError;
use crate::domain::index::{IndexConfig, IndexSize};
use crate::domain::universe::{parse_tickers, Universe};
use crate::ports::config_port::ConfigPort;
use chrono::{Duration, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_TITLE: &str = "Equal-Weighted Index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Typst,
}

impl FromStr for ReportFormat {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "typst" => Ok(ReportFormat::Typst),
            other => Err(IndexError::invalid(
                "report",
                "formats",
                format!("unknown format '{other}', expected csv or typst"),
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Csv => write!(f, "csv"),
            ReportFormat::Typst => write!(f, "typst"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSettings {
    pub universe: Universe,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub source_dir: Option<PathBuf>,
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub title: String,
    pub formats: Vec<ReportFormat>,
    pub template_path: Option<PathBuf>,
}

pub fn validate_index_config(config: &dyn ConfigPort) -> Result<IndexConfig, IndexError> {
    let raw_size = config
        .get_string("index", "size")
        .ok_or_else(|| IndexError::missing("index", "size"))?;
    let size = raw_size
        .trim()
        .parse::<i64>()
        .map_err(|_| IndexError::invalid("index", "size", format!("'{raw_size}' is not an integer")))?;

    let mut index = IndexConfig::new(IndexSize::new(size)?);
    if let Some(value) = non_blank(config, "index", "tie_break") {
        index.tie_break = value
            .parse()
            .map_err(|e| IndexError::invalid("index", "tie_break", format!("{e}")))?;
    }
    if let Some(value) = non_blank(config, "index", "weighting") {
        index.weighting = value
            .parse()
            .map_err(|e| IndexError::invalid("index", "weighting", format!("{e}")))?;
    }
    if let Some(value) = non_blank(config, "index", "return_basis") {
        index.return_basis = value
            .parse()
            .map_err(|e| IndexError::invalid("index", "return_basis", format!("{e}")))?;
    }
    Ok(index)
}

/// Ticker universe, date range and fetch settings. Command-line dates take
/// precedence over `[data] start_date` / `end_date`.
pub fn validate_data_config(
    config: &dyn ConfigPort,
    start_override: Option<&str>,
    end_override: Option<&str>,
    today: NaiveDate,
) -> Result<DataSettings, IndexError> {
    let raw_tickers = config
        .get_string("data", "tickers")
        .ok_or_else(|| IndexError::missing("data", "tickers"))?;
    let universe =
        parse_tickers(&raw_tickers).map_err(|e| IndexError::invalid("data", "tickers", e.to_string()))?;

    let start = start_override
        .map(str::to_string)
        .or_else(|| non_blank(config, "data", "start_date"));
    let end = end_override
        .map(str::to_string)
        .or_else(|| non_blank(config, "data", "end_date"));
    let (start_date, end_date) = resolve_date_range(start.as_deref(), end.as_deref(), today)?;

    let workers = config.get_int("data", "workers", DEFAULT_WORKERS as i64)?;
    if workers <= 0 {
        return Err(IndexError::invalid("data", "workers", "workers must be positive"));
    }

    Ok(DataSettings {
        universe,
        start_date,
        end_date,
        source_dir: non_blank(config, "data", "source_dir").map(PathBuf::from),
        workers: workers as usize,
    })
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<ReportSettings, IndexError> {
    let formats = match config.get_list("report", "formats") {
        Some(items) if !items.is_empty() => {
            let mut formats = Vec::new();
            for item in items {
                let format: ReportFormat = item.parse()?;
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
            formats
        }
        _ => vec![ReportFormat::Csv, ReportFormat::Typst],
    };

    Ok(ReportSettings {
        output_dir: PathBuf::from(
            non_blank(config, "index", "output_dir").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        ),
        title: non_blank(config, "index", "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        formats,
        template_path: non_blank(config, "report", "template_path").map(PathBuf::from),
    })
}

/// Defaults: end = `today`, start = end - 30 days. A start after the end is
/// rejected; equal dates are a one-day range.
pub fn resolve_date_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), IndexError> {
    let end_date = match end {
        Some(s) => parse_date(s, "end_date")?,
        None => today,
    };
    let start_date = match start {
        Some(s) => parse_date(s, "start_date")?,
        None => end_date - Duration::days(DEFAULT_LOOKBACK_DAYS),
    };

    if start_date > end_date {
        return Err(IndexError::invalid(
            "data",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok((start_date, end_date))
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, IndexError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        IndexError::invalid(
            "data",
            field,
            format!("invalid {field} '{value}', expected YYYY-MM-DD"),
        )
    })
}

fn non_blank(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
