//! End-to-end index run: clean, select, diff, aggregate.
//!
//! Every run is a pure batch transform recomputed from the observations;
//! nothing here keeps state between calls.

use crate::domain::composition::{track_composition_changes, CompositionChange};
use crate::domain::constituent::{build_constituents, Constituent};
use crate::domain::index::IndexConfig;
use crate::domain::observation::{clean_observations, Observation, RawObservation, SkippedRow};
use crate::domain::performance::{aggregate_performance, PerformanceRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct IndexRun {
    pub constituents: Vec<Constituent>,
    pub changes: Vec<CompositionChange>,
    pub performance: Vec<PerformanceRecord>,
    pub skipped: Vec<SkippedRow>,
}

impl IndexRun {
    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    /// Constituents of the last index day.
    pub fn latest_constituents(&self) -> &[Constituent] {
        match self.constituents.last() {
            Some(last) => {
                let start = self
                    .constituents
                    .iter()
                    .position(|c| c.date == last.date)
                    .unwrap_or(0);
                &self.constituents[start..]
            }
            None => &[],
        }
    }
}

/// Build the index from already-clean observations.
pub fn build_index(observations: &[Observation], config: &IndexConfig) -> IndexRun {
    let constituents = build_constituents(observations, config);
    let changes = track_composition_changes(&constituents);
    let performance = aggregate_performance(&constituents, observations, config.return_basis);

    IndexRun {
        constituents,
        changes,
        performance,
        skipped: Vec::new(),
    }
}

/// Clean raw storage rows, then build the index. Dropped rows are reported
/// in `IndexRun::skipped`.
pub fn run_index(raw: Vec<RawObservation>, config: &IndexConfig) -> IndexRun {
    let set = clean_observations(raw);
    let mut run = build_index(&set.observations, config);
    run.skipped = set.skipped;
    run
}
