#![allow(dead_code)]

use chrono::NaiveDate;
use eqindex::domain::error::IndexError;
use eqindex::domain::index::{IndexConfig, IndexSize};
pub use eqindex::domain::observation::{parse_date, Observation, RawObservation, RawValue};
use eqindex::domain::split::Split;
use eqindex::ports::observation_port::{DataRange, ObservationPort};
use eqindex::ports::observer_port::FetchObserver;
use eqindex::ports::quote_port::{QuotePort, TickerHistory};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockQuotePort {
    pub histories: HashMap<String, TickerHistory>,
    pub errors: HashMap<String, String>,
}

impl MockQuotePort {
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_history(mut self, ticker: &str, closes: &[(&str, f64)], shares: u64) -> Self {
        self.histories.insert(
            ticker.to_string(),
            TickerHistory {
                ticker: ticker.to_string(),
                company_name: Some(format!("{ticker} Inc")),
                closes: closes.iter().map(|&(d, c)| (parse(d), c)).collect(),
                shares_outstanding: Some(shares),
                splits: Vec::new(),
            },
        );
        self
    }

    pub fn with_split(mut self, ticker: &str, date: &str, ratio: f64) -> Self {
        if let Some(history) = self.histories.get_mut(ticker) {
            history.splits.push(Split {
                date: parse(date),
                ratio,
            });
        }
        self
    }

    pub fn without_shares(mut self, ticker: &str) -> Self {
        if let Some(history) = self.histories.get_mut(ticker) {
            history.shares_outstanding = None;
        }
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl QuotePort for MockQuotePort {
    fn fetch_history(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TickerHistory, IndexError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(IndexError::Fetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        let mut history = self
            .histories
            .get(ticker)
            .cloned()
            .ok_or_else(|| IndexError::Fetch {
                ticker: ticker.to_string(),
                reason: "unknown ticker".to_string(),
            })?;
        history
            .closes
            .retain(|(d, _)| *d >= start_date && *d <= end_date);
        Ok(history)
    }
}

pub struct MockObservationPort {
    pub rows: Vec<RawObservation>,
}

impl MockObservationPort {
    pub fn new(rows: Vec<RawObservation>) -> Self {
        Self { rows }
    }
}

impl ObservationPort for MockObservationPort {
    fn fetch_observations(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<RawObservation>, IndexError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| match parse_date(&r.date) {
                Some(d) => start_date.is_none_or(|s| d >= s) && end_date.is_none_or(|e| d <= e),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn get_data_range(&self) -> Result<Option<DataRange>, IndexError> {
        Ok(None)
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub fetched: Mutex<Vec<String>>,
    pub failed: Mutex<Vec<String>>,
}

impl FetchObserver for RecordingObserver {
    fn on_fetched(&self, ticker: &str, _rows: usize) {
        self.fetched.lock().unwrap().push(ticker.to_string());
    }

    fn on_failed(&self, ticker: &str, _reason: &str) {
        self.failed.lock().unwrap().push(ticker.to_string());
    }
}

pub fn parse(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn obs(date: &str, ticker: &str, market_cap: u64, price: f64) -> Observation {
    Observation {
        date: parse(date),
        ticker: ticker.to_string(),
        market_cap,
        price,
    }
}

pub fn raw(date: &str, ticker: &str, market_cap: f64, price: f64) -> RawObservation {
    RawObservation {
        date: date.to_string(),
        ticker: ticker.to_string(),
        market_cap: RawValue::Number(market_cap),
        price: RawValue::Number(price),
    }
}

pub fn index_config(n: i64) -> IndexConfig {
    IndexConfig::new(IndexSize::new(n).unwrap())
}

/// The A/B/C/D two-day replacement scenario with prices that move.
pub fn replacement_scenario() -> Vec<Observation> {
    vec![
        obs("2025-01-01", "A", 10, 100.0),
        obs("2025-01-01", "B", 8, 50.0),
        obs("2025-01-01", "C", 5, 20.0),
        obs("2025-01-01", "D", 4, 10.0),
        obs("2025-01-02", "A", 12, 110.0),
        obs("2025-01-02", "B", 6, 45.0),
        obs("2025-01-02", "C", 5, 20.0),
        obs("2025-01-02", "D", 9, 12.0),
    ]
}
