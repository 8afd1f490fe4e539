//! Run statistics over the index value series.

use super::composition::CompositionChange;
use super::performance::PerformanceRecord;
use super::pipeline::IndexRun;
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub index_days: usize,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
    pub change_days: usize,
    pub total_additions: usize,
    pub total_removals: usize,
    pub skipped_rows: usize,
}

impl IndexSummary {
    pub fn compute(run: &IndexRun) -> Self {
        let performance = &run.performance;

        let final_value = performance
            .last()
            .map(|p| p.cumulative_value)
            .unwrap_or(1.0);
        let total_return = final_value - 1.0;

        let years = performance.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && final_value > 0.0 {
            final_value.powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (total_additions, total_removals) = count_turnover(&run.changes);

        IndexSummary {
            first_date: performance.first().map(|p| p.date),
            last_date: performance.last().map(|p| p.date),
            index_days: performance.len(),
            final_value,
            total_return,
            annualized_return,
            annualized_volatility: compute_volatility(performance),
            max_drawdown: compute_drawdown(performance),
            change_days: run.changes.len(),
            total_additions,
            total_removals,
            skipped_rows: run.skipped.len(),
        }
    }
}

fn count_turnover(changes: &[CompositionChange]) -> (usize, usize) {
    changes.iter().fold((0, 0), |(adds, removes), change| {
        (adds + change.additions(), removes + change.removals())
    })
}

/// Population standard deviation of defined daily returns, annualised.
fn compute_volatility(performance: &[PerformanceRecord]) -> f64 {
    let returns: Vec<f64> = performance.iter().filter_map(|p| p.daily_return).collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Largest peak-to-trough fall, peak seeded at the 1.0 baseline.
fn compute_drawdown(performance: &[PerformanceRecord]) -> f64 {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;

    for point in performance {
        if point.cumulative_value > peak {
            peak = point.cumulative_value;
        } else if peak > 0.0 {
            let dd = (peak - point.cumulative_value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
