//! CSV file adapters.
//!
//! `CsvQuoteAdapter` is the quote source used by acquisition. It reads a
//! directory laid out as:
//!
//! - `<TICKER>.csv` with columns `date,close`
//! - `companies.csv` with columns `ticker,company_name,shares_outstanding`
//! - `splits.csv` with columns `ticker,date,ratio` (optional)
//!
//! `CsvObservationAdapter` reads a flat observation table
//! `date,ticker,market_cap,price` and serves it through `ObservationPort`.

use crate::domain::error::IndexError;
use crate::domain::observation::{parse_date, RawObservation, RawValue};
use crate::domain::split::Split;
use crate::ports::observation_port::{DataRange, ObservationPort};
use crate::ports::quote_port::{QuotePort, TickerHistory};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CompanyRow {
    ticker: String,
    company_name: Option<String>,
    shares_outstanding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SplitRow {
    ticker: String,
    date: String,
    ratio: f64,
}

#[derive(Debug, Clone, Default)]
struct CompanyInfo {
    name: Option<String>,
    shares_outstanding: Option<u64>,
}

/// Metadata loaded from `companies.csv` and `splits.csv`. A malformed row is
/// charged to its own ticker in `rejected` and fails only that ticker's fetch.
#[derive(Debug, Default)]
struct Metadata {
    companies: HashMap<String, CompanyInfo>,
    splits: HashMap<String, Vec<Split>>,
    rejected: HashMap<String, String>,
}

impl Metadata {
    fn reject(&mut self, ticker: &str, reason: String) {
        self.rejected.entry(ticker.trim().to_uppercase()).or_insert(reason);
    }
}

pub struct CsvQuoteAdapter {
    base_path: PathBuf,
    metadata: Metadata,
}

impl CsvQuoteAdapter {
    /// Loads `companies.csv` and `splits.csv` up front; price files are read
    /// per ticker on fetch.
    pub fn open(base_path: PathBuf) -> Result<Self, IndexError> {
        let mut metadata = Metadata::default();
        load_companies(&base_path.join("companies.csv"), &mut metadata)?;
        load_splits(&base_path.join("splits.csv"), &mut metadata)?;
        Ok(Self { base_path, metadata })
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn read_error(path: &Path, e: impl std::fmt::Display) -> IndexError {
    IndexError::Io(std::io::Error::other(format!(
        "failed to read {}: {}",
        path.display(),
        e
    )))
}

/// Share counts may be written as `1000`, `1,000`, `1000.0` or `2.5e9`.
/// Fractions are truncated.
fn parse_shares(value: &str) -> Result<Option<u64>, String> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    RawValue::from(value)
        .to_number()
        .filter(|v| *v >= 0.0 && *v < u64::MAX as f64)
        .map(|v| Some(v.trunc() as u64))
        .ok_or_else(|| format!("invalid shares_outstanding '{}'", value.trim()))
}

fn reader(path: &Path) -> Result<csv::Reader<fs::File>, IndexError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| read_error(path, e))
}

fn ticker_column(headers: &csv::StringRecord) -> usize {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("ticker"))
        .unwrap_or(0)
}

fn load_companies(path: &Path, metadata: &mut Metadata) -> Result<(), IndexError> {
    if !path.exists() {
        return Ok(());
    }

    let mut rdr = reader(path)?;
    let headers = rdr.headers().map_err(|e| read_error(path, e))?.clone();
    let ticker_col = ticker_column(&headers);
    for result in rdr.records() {
        let record = result.map_err(|e| read_error(path, e))?;
        let ticker = record.get(ticker_col).unwrap_or("");
        if ticker.is_empty() {
            continue;
        }

        let row: CompanyRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                metadata.reject(ticker, format!("bad companies.csv row: {}", e));
                continue;
            }
        };
        match parse_shares(row.shares_outstanding.as_deref().unwrap_or("")) {
            Ok(shares_outstanding) => {
                metadata.companies.insert(
                    row.ticker.to_uppercase(),
                    CompanyInfo {
                        name: row.company_name.filter(|n| !n.is_empty()),
                        shares_outstanding,
                    },
                );
            }
            Err(reason) => metadata.reject(&row.ticker, reason),
        }
    }
    Ok(())
}

fn load_splits(path: &Path, metadata: &mut Metadata) -> Result<(), IndexError> {
    if !path.exists() {
        return Ok(());
    }

    let mut rdr = reader(path)?;
    let headers = rdr.headers().map_err(|e| read_error(path, e))?.clone();
    let ticker_col = ticker_column(&headers);
    for result in rdr.records() {
        let record = result.map_err(|e| read_error(path, e))?;
        let ticker = record.get(ticker_col).unwrap_or("");
        if ticker.is_empty() {
            continue;
        }

        let row: SplitRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                metadata.reject(ticker, format!("bad splits.csv row: {}", e));
                continue;
            }
        };
        match parse_date(&row.date) {
            Some(date) => metadata
                .splits
                .entry(row.ticker.to_uppercase())
                .or_default()
                .push(Split {
                    date,
                    ratio: row.ratio,
                }),
            None => metadata.reject(&row.ticker, format!("invalid split date '{}'", row.date)),
        }
    }
    Ok(())
}

impl QuotePort for CsvQuoteAdapter {
    fn fetch_history(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TickerHistory, IndexError> {
        let fetch_error = |reason: String| IndexError::Fetch {
            ticker: ticker.to_string(),
            reason,
        };

        if let Some(reason) = self.metadata.rejected.get(ticker) {
            return Err(fetch_error(reason.clone()));
        }

        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path)
            .map_err(|e| fetch_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut closes = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| fetch_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| fetch_error("missing date column".into()))?;
            let date = parse_date(date_str)
                .ok_or_else(|| fetch_error(format!("invalid date '{}'", date_str)))?;

            if date < start_date || date > end_date {
                continue;
            }

            let close: f64 = record
                .get(1)
                .ok_or_else(|| fetch_error("missing close column".into()))?
                .parse()
                .map_err(|e| fetch_error(format!("invalid close value: {}", e)))?;

            closes.push((date, close));
        }

        closes.sort_by_key(|(date, _)| *date);

        let info = self.metadata.companies.get(ticker).cloned().unwrap_or_default();
        Ok(TickerHistory {
            ticker: ticker.to_string(),
            company_name: info.name,
            closes,
            shares_outstanding: info.shares_outstanding,
            splits: self.metadata.splits.get(ticker).cloned().unwrap_or_default(),
        })
    }
}

pub struct CsvObservationAdapter {
    path: PathBuf,
}

impl CsvObservationAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<Vec<RawObservation>, IndexError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| read_error(&self.path, e))?;

        let headers = rdr.headers().map_err(|e| read_error(&self.path, e))?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| read_error(&self.path, format!("no '{}' column", name)))
        };
        let date_col = column("date")?;
        let ticker_col = column("ticker")?;
        let cap_col = column("market_cap")?;
        let price_col = column("price")?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| read_error(&self.path, e))?;
            let cell = |i: usize| record.get(i).unwrap_or("");
            rows.push(RawObservation {
                date: cell(date_col).to_string(),
                ticker: cell(ticker_col).to_string(),
                market_cap: RawValue::from(cell(cap_col)),
                price: RawValue::from(cell(price_col)),
            });
        }
        Ok(rows)
    }
}

impl ObservationPort for CsvObservationAdapter {
    /// Rows come back in file order. Rows whose date does not parse are kept
    /// so cleaning can report them.
    fn fetch_observations(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<RawObservation>, IndexError> {
        let rows: Vec<RawObservation> = self
            .read_all()?
            .into_iter()
            .filter(|row| match parse_date(&row.date) {
                Some(date) => {
                    start_date.is_none_or(|start| date >= start)
                        && end_date.is_none_or(|end| date <= end)
                }
                None => true,
            })
            .collect();

        Ok(rows)
    }

    fn get_data_range(&self) -> Result<Option<DataRange>, IndexError> {
        let rows = self.read_all()?;
        let dated: Vec<(NaiveDate, &str)> = rows
            .iter()
            .filter_map(|row| parse_date(&row.date).map(|d| (d, row.ticker.as_str())))
            .collect();

        let first = dated.iter().map(|(d, _)| *d).min();
        let last = dated.iter().map(|(d, _)| *d).max();
        Ok(match (first, last) {
            (Some(first_date), Some(last_date)) => Some(DataRange {
                first_date,
                last_date,
                rows: dated.len(),
                tickers: dated.iter().map(|(_, t)| *t).collect::<BTreeSet<_>>().len(),
            }),
            _ => None,
        })
    }
}
