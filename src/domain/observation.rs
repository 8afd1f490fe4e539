//! Market observations and input cleaning.
//!
//! Storage adapters hand over loosely typed rows; [`clean_observations`]
//! turns them into [`Observation`]s and reports every dropped row as a
//! [`SkippedRow`] instead of failing.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fmt;

/// One (date, ticker) data point. Immutable once ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub ticker: String,
    pub market_cap: u64,
    pub price: f64,
}

/// A cell as read from storage, before numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Missing,
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Coerce to a finite number. Text has `$`, `,` and surrounding
    /// whitespace stripped before parsing.
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            RawValue::Missing => return None,
            RawValue::Number(v) => *v,
            RawValue::Text(s) => {
                let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
                cleaned.trim().parse::<f64>().ok()?
            }
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            RawValue::Missing
        } else {
            RawValue::Text(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub date: String,
    pub ticker: String,
    pub market_cap: RawValue,
    pub price: RawValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidDate,
    BlankTicker,
    InvalidMarketCap,
    InvalidPrice,
    Duplicate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::InvalidDate => "unparseable date",
            SkipReason::BlankTicker => "blank ticker",
            SkipReason::InvalidMarketCap => "missing or non-numeric market cap",
            SkipReason::InvalidPrice => "missing, non-numeric or non-positive price",
            SkipReason::Duplicate => "duplicate (date, ticker)",
        };
        f.write_str(text)
    }
}

/// A dropped input row. `row` is the zero-based position in the raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub date: String,
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedRow>,
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

/// Drop malformed rows and the second and later copies of a (date, ticker)
/// pair. Input order is preserved for the rows that survive.
pub fn clean_observations(raw: Vec<RawObservation>) -> ObservationSet {
    let mut set = ObservationSet::default();
    let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();

    for (row, record) in raw.into_iter().enumerate() {
        let reason = match validate(&record) {
            Ok(observation) => {
                if seen.insert((observation.date, observation.ticker.clone())) {
                    set.observations.push(observation);
                    continue;
                }
                SkipReason::Duplicate
            }
            Err(reason) => reason,
        };
        set.skipped.push(SkippedRow {
            row,
            date: record.date,
            ticker: record.ticker,
            reason,
        });
    }

    set
}

fn validate(record: &RawObservation) -> Result<Observation, SkipReason> {
    let date = parse_date(&record.date).ok_or(SkipReason::InvalidDate)?;

    let ticker = record.ticker.trim();
    if ticker.is_empty() {
        return Err(SkipReason::BlankTicker);
    }

    let market_cap = record
        .market_cap
        .to_number()
        .filter(|v| *v >= 0.0 && *v < u64::MAX as f64)
        .ok_or(SkipReason::InvalidMarketCap)?;

    let price = record
        .price
        .to_number()
        .filter(|v| *v > 0.0)
        .ok_or(SkipReason::InvalidPrice)?;

    Ok(Observation {
        date,
        ticker: ticker.to_string(),
        market_cap: market_cap.trunc() as u64,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, ticker: &str, cap: RawValue, price: RawValue) -> RawObservation {
        RawObservation {
            date: date.to_string(),
            ticker: ticker.to_string(),
            market_cap: cap,
            price,
        }
    }

    #[test]
    fn text_values_strip_currency_formatting() {
        assert_eq!(RawValue::from("$1,234.50").to_number(), Some(1234.5));
        assert_eq!(RawValue::from(" 42 ").to_number(), Some(42.0));
        assert_eq!(RawValue::from("n/a").to_number(), None);
        assert_eq!(RawValue::from("").to_number(), None);
        assert_eq!(RawValue::Number(f64::NAN).to_number(), None);
    }

    #[test]
    fn parse_date_accepts_time_suffix() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 2);
        assert_eq!(parse_date("2025-01-02"), expected);
        assert_eq!(parse_date("2025-01-02 00:00:00"), expected);
        assert_eq!(parse_date("2025-01-02T00:00:00"), expected);
        assert_eq!(parse_date("02/01/2025"), None);
    }

    #[test]
    fn clean_keeps_valid_rows_in_order() {
        let set = clean_observations(vec![
            raw("2025-01-02", "MSFT", 2200.0.into(), 300.0.into()),
            raw("2025-01-01", "AAPL", "$2,500".into(), "150".into()),
        ]);

        assert!(set.skipped.is_empty());
        assert_eq!(set.observations.len(), 2);
        assert_eq!(set.observations[0].ticker, "MSFT");
        assert_eq!(set.observations[1].market_cap, 2500);
        assert!((set.observations[1].price - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clean_reports_each_skip_reason() {
        let set = clean_observations(vec![
            raw("bad", "AAPL", 1.0.into(), 1.0.into()),
            raw("2025-01-01", "  ", 1.0.into(), 1.0.into()),
            raw("2025-01-01", "AAPL", RawValue::Missing, 1.0.into()),
            raw("2025-01-01", "AAPL", (-5.0).into(), 1.0.into()),
            raw("2025-01-01", "AAPL", 10.0.into(), 0.0.into()),
            raw("2025-01-01", "AAPL", 10.0.into(), "abc".into()),
            raw("2025-01-01", "AAPL", 10.0.into(), 5.0.into()),
            raw("2025-01-01", "AAPL", 11.0.into(), 6.0.into()),
        ]);

        let reasons: Vec<_> = set.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::InvalidDate,
                SkipReason::BlankTicker,
                SkipReason::InvalidMarketCap,
                SkipReason::InvalidMarketCap,
                SkipReason::InvalidPrice,
                SkipReason::InvalidPrice,
                SkipReason::Duplicate,
            ]
        );
        assert_eq!(set.skipped.last().map(|s| s.row), Some(7));
        assert_eq!(set.observations.len(), 1);
        assert_eq!(set.observations[0].market_cap, 10);
    }

    #[test]
    fn fractional_market_cap_truncates() {
        let set = clean_observations(vec![raw("2025-01-01", "AAPL", 99.9.into(), 1.0.into())]);
        assert_eq!(set.observations[0].market_cap, 99);
    }

    #[test]
    fn ticker_is_trimmed() {
        let set = clean_observations(vec![raw("2025-01-01", " AAPL ", 1.0.into(), 1.0.into())]);
        assert_eq!(set.observations[0].ticker, "AAPL");
    }
}
