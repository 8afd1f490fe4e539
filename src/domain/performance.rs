//! Index return aggregation and compounding.
//!
//! daily_return(t) = sum over constituents of r_i(t) * w_i
//! cumulative(t)   = cumulative(t-1) * (1 + daily_return(t)), cumulative(-1) = 1.0
//!
//! A ticker with no prior price has an undefined return; it keeps its weight
//! but contributes nothing. A day where no constituent has a defined return
//! has an undefined index return and leaves the cumulative value unchanged.

use crate::domain::constituent::Constituent;
use crate::domain::index::ReturnBasis;
use crate::domain::observation::Observation;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub date: NaiveDate,
    pub daily_return: Option<f64>,
    pub cumulative_value: f64,
}

/// Period-over-period price change per ticker, keyed by (ticker, date).
/// A ticker's first point has no entry.
pub fn ticker_returns<'a, I>(points: I) -> HashMap<(&'a str, NaiveDate), f64>
where
    I: IntoIterator<Item = (&'a str, NaiveDate, f64)>,
{
    let mut series: BTreeMap<&'a str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for (ticker, date, price) in points {
        series.entry(ticker).or_default().push((date, price));
    }

    let mut returns = HashMap::new();
    for (ticker, mut prices) in series {
        prices.sort_by_key(|(date, _)| *date);
        for pair in prices.windows(2) {
            let (_, prev) = pair[0];
            let (date, curr) = pair[1];
            if prev > 0.0 {
                returns.insert((ticker, date), (curr - prev) / prev);
            }
        }
    }
    returns
}

pub fn aggregate_performance(
    constituents: &[Constituent],
    observations: &[Observation],
    basis: ReturnBasis,
) -> Vec<PerformanceRecord> {
    let returns = match basis {
        ReturnBasis::Observations => ticker_returns(
            observations
                .iter()
                .map(|o| (o.ticker.as_str(), o.date, o.price)),
        ),
        ReturnBasis::Constituents => ticker_returns(
            constituents
                .iter()
                .map(|c| (c.ticker.as_str(), c.date, c.price)),
        ),
    };

    let mut by_date: BTreeMap<NaiveDate, Vec<&Constituent>> = BTreeMap::new();
    for c in constituents {
        by_date.entry(c.date).or_default().push(c);
    }

    let mut cumulative = 1.0_f64;
    by_date
        .into_iter()
        .map(|(date, day)| {
            let daily_return = day
                .iter()
                .filter_map(|c| returns.get(&(c.ticker.as_str(), date)).map(|r| r * c.weight))
                .fold(None, |acc: Option<f64>, contribution| {
                    Some(acc.unwrap_or(0.0) + contribution)
                });
            cumulative *= 1.0 + daily_return.unwrap_or(0.0);
            PerformanceRecord {
                date,
                daily_return,
                cumulative_value: cumulative,
            }
        })
        .collect()
}
