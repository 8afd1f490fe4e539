//! Universe acquisition on a bounded worker pool.
//!
//! Each ticker is fetched independently; a failing ticker is recorded in
//! [`AcquisitionResult::failures`] and never stops the others. Results are
//! sorted by ticker once all workers finish.

use crate::domain::error::IndexError;
use crate::domain::observation::Observation;
use crate::domain::split::{adjusted_shares, market_cap};
use crate::ports::observer_port::FetchObserver;
use crate::ports::quote_port::{QuotePort, TickerHistory};
use chrono::NaiveDate;
use rayon::prelude::*;

pub const DEFAULT_WORKERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub ticker: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquisitionResult {
    pub companies: Vec<Company>,
    pub observations: Vec<Observation>,
    pub failures: Vec<FetchFailure>,
}

/// Turn one ticker's price history into split-adjusted observations.
///
/// Closes that are not finite and positive are dropped. Output is date
/// ordered.
pub fn history_to_observations(history: &TickerHistory) -> Result<Vec<Observation>, IndexError> {
    let shares = history
        .shares_outstanding
        .filter(|s| *s > 0)
        .ok_or_else(|| IndexError::MissingShares {
            ticker: history.ticker.clone(),
        })?;

    let mut closes: Vec<(NaiveDate, f64)> = history
        .closes
        .iter()
        .copied()
        .filter(|(_, close)| close.is_finite() && *close > 0.0)
        .collect();
    closes.sort_by_key(|(date, _)| *date);
    closes.dedup_by_key(|(date, _)| *date);

    let dates: Vec<NaiveDate> = closes.iter().map(|(date, _)| *date).collect();
    let share_counts = adjusted_shares(shares, &history.splits, &dates);

    Ok(closes
        .into_iter()
        .zip(share_counts)
        .map(|((date, close), shares)| Observation {
            date,
            ticker: history.ticker.clone(),
            market_cap: market_cap(close, shares),
            price: close,
        })
        .collect())
}

fn fetch_one(
    port: &dyn QuotePort,
    ticker: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(Company, Vec<Observation>), IndexError> {
    let history = port.fetch_history(ticker, start_date, end_date)?;
    let observations = history_to_observations(&history)?;
    let company = Company {
        ticker: ticker.to_string(),
        name: history
            .company_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| ticker.to_string()),
    };
    Ok((company, observations))
}

pub fn fetch_universe(
    port: &dyn QuotePort,
    tickers: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    workers: usize,
    observer: &dyn FetchObserver,
) -> Result<AcquisitionResult, IndexError> {
    let workers = workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| IndexError::Io(std::io::Error::other(e.to_string())))?;

    observer.on_start(tickers.len(), workers);

    let mut outcomes: Vec<(String, Result<(Company, Vec<Observation>), IndexError>)> =
        pool.install(|| {
            tickers
                .par_iter()
                .map(|ticker| {
                    let outcome = fetch_one(port, ticker, start_date, end_date);
                    match &outcome {
                        Ok((_, observations)) => observer.on_fetched(ticker, observations.len()),
                        Err(e) => observer.on_failed(ticker, &e.to_string()),
                    }
                    (ticker.clone(), outcome)
                })
                .collect()
        });
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut result = AcquisitionResult::default();
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok((_, observations)) if observations.is_empty() => result.failures.push(FetchFailure {
                ticker,
                reason: "no price data in range".to_string(),
            }),
            Ok((company, observations)) => {
                result.companies.push(company);
                result.observations.extend(observations);
            }
            Err(e) => result.failures.push(FetchFailure {
                ticker,
                reason: e.to_string(),
            }),
        }
    }

    Ok(result)
}
