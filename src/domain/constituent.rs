//! Daily top-N selection by market capitalisation.

use crate::domain::index::{IndexConfig, TieBreak, WeightScheme};
use crate::domain::observation::Observation;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

/// A ticker selected into the index on `date`. `rank` starts at 1 for the
/// largest market cap of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct Constituent {
    pub date: NaiveDate,
    pub ticker: String,
    pub market_cap: u64,
    pub price: f64,
    pub weight: f64,
    pub rank: usize,
}

/// Group observations by date in ascending order, keeping input order
/// inside each day.
pub fn group_by_date(observations: &[Observation]) -> BTreeMap<NaiveDate, Vec<&Observation>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        groups.entry(obs.date).or_default().push(obs);
    }
    groups
}

/// Select the `N` largest caps of each day and weight them equally.
///
/// Output is ordered by date, then rank. A day yields exactly
/// `min(N, distinct tickers that day)` constituents; if a ticker appears
/// twice on one day only its higher-ranked row is used.
pub fn build_constituents(observations: &[Observation], config: &IndexConfig) -> Vec<Constituent> {
    let n = config.size.get();
    let mut constituents = Vec::new();

    for (date, mut day) in group_by_date(observations) {
        match config.tie_break {
            TieBreak::RowOrder => day.sort_by(|a, b| b.market_cap.cmp(&a.market_cap)),
            TieBreak::Ticker => day.sort_by(|a, b| {
                b.market_cap
                    .cmp(&a.market_cap)
                    .then_with(|| a.ticker.cmp(&b.ticker))
            }),
        }

        let mut chosen: HashSet<&str> = HashSet::new();
        let selected: Vec<&Observation> = day
            .into_iter()
            .filter(|obs| chosen.insert(obs.ticker.as_str()))
            .take(n)
            .collect();

        let denominator = match config.weighting {
            WeightScheme::Fixed => n,
            WeightScheme::Normalized => selected.len(),
        };
        let weight = 1.0 / denominator as f64;

        constituents.extend(selected.into_iter().enumerate().map(|(i, obs)| Constituent {
            date,
            ticker: obs.ticker.clone(),
            market_cap: obs.market_cap,
            price: obs.price,
            weight,
            rank: i + 1,
        }));
    }

    constituents
}
