//! Day-over-day constituent set changes.
//!
//! Days are compared with the previous day that has data, not the previous
//! calendar day. The first day is the baseline and never yields a change.

use crate::domain::constituent::Constituent;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionChange {
    pub date: NaiveDate,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl CompositionChange {
    pub fn additions(&self) -> usize {
        self.added.len()
    }

    pub fn removals(&self) -> usize {
        self.removed.len()
    }

    pub fn added_list(&self) -> String {
        join_tickers(&self.added)
    }

    pub fn removed_list(&self) -> String {
        join_tickers(&self.removed)
    }
}

fn join_tickers(tickers: &BTreeSet<String>) -> String {
    tickers.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Constituent ticker sets keyed by date, ascending.
pub fn constituent_sets(constituents: &[Constituent]) -> BTreeMap<NaiveDate, BTreeSet<String>> {
    let mut sets: BTreeMap<NaiveDate, BTreeSet<String>> = BTreeMap::new();
    for c in constituents {
        sets.entry(c.date).or_default().insert(c.ticker.clone());
    }
    sets
}

pub fn track_composition_changes(constituents: &[Constituent]) -> Vec<CompositionChange> {
    let mut changes = Vec::new();
    let mut previous: Option<BTreeSet<String>> = None;

    for (date, current) in constituent_sets(constituents) {
        if let Some(prev) = &previous {
            let added: BTreeSet<String> = current.difference(prev).cloned().collect();
            let removed: BTreeSet<String> = prev.difference(&current).cloned().collect();
            if !added.is_empty() || !removed.is_empty() {
                changes.push(CompositionChange {
                    date,
                    added,
                    removed,
                });
            }
        }
        previous = Some(current);
    }

    changes
}
