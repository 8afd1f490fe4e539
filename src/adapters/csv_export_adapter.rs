//! CSV export of the three index tables.

use crate::domain::error::IndexError;
use crate::domain::pipeline::IndexRun;
use crate::domain::summary::IndexSummary;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPOSITION_FILE: &str = "daily_composition.csv";
pub const CHANGES_FILE: &str = "composition_changes.csv";
pub const PERFORMANCE_FILE: &str = "index_performance.csv";

#[derive(Serialize)]
struct CompositionRow<'a> {
    date: String,
    ticker: &'a str,
    market_cap: u64,
    weight: f64,
}

#[derive(Serialize)]
struct ChangeRow {
    date: String,
    additions: usize,
    removals: usize,
    added_tickers: String,
    removed_tickers: String,
}

#[derive(Serialize)]
struct PerformanceRow {
    date: String,
    daily_return: Option<f64>,
    cumulative_value: f64,
}

pub struct CsvExportAdapter;

fn export_error(path: &Path, e: impl std::fmt::Display) -> IndexError {
    IndexError::Export {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Header is written even when `rows` is empty.
fn write_table<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<(), IndexError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| export_error(path, e))?;

    writer
        .write_record(header)
        .map_err(|e| export_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| export_error(path, e))?;
    }
    writer.flush().map_err(|e| export_error(path, e))?;
    Ok(())
}

impl ReportPort for CsvExportAdapter {
    fn write(
        &self,
        run: &IndexRun,
        _summary: &IndexSummary,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, IndexError> {
        fs::create_dir_all(output_dir).map_err(|e| export_error(output_dir, e))?;

        let composition_path = output_dir.join(COMPOSITION_FILE);
        write_table(
            &composition_path,
            &["date", "ticker", "market_cap", "weight"],
            run.constituents.iter().map(|c| CompositionRow {
                date: c.date.format("%Y-%m-%d").to_string(),
                ticker: &c.ticker,
                market_cap: c.market_cap,
                weight: c.weight,
            }),
        )?;

        let changes_path = output_dir.join(CHANGES_FILE);
        write_table(
            &changes_path,
            &["date", "additions", "removals", "added_tickers", "removed_tickers"],
            run.changes.iter().map(|c| ChangeRow {
                date: c.date.format("%Y-%m-%d").to_string(),
                additions: c.additions(),
                removals: c.removals(),
                added_tickers: c.added_list(),
                removed_tickers: c.removed_list(),
            }),
        )?;

        let performance_path = output_dir.join(PERFORMANCE_FILE);
        write_table(
            &performance_path,
            &["date", "daily_return", "cumulative_value"],
            run.performance.iter().map(|p| PerformanceRow {
                date: p.date.format("%Y-%m-%d").to_string(),
                daily_return: p.daily_return,
                cumulative_value: p.cumulative_value,
            }),
        )?;

        Ok(vec![composition_path, changes_path, performance_path])
    }
}
