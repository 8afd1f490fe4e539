//! Share count adjustment for stock splits.
//!
//! The reported shares-outstanding figure is current, i.e. after every split.
//! On date `d` the share count is that figure divided by the product of the
//! ratios of all splits dated strictly after `d`.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub date: NaiveDate,
    pub ratio: f64,
}

/// Adjusted share count for each of `dates`, in the same order.
pub fn adjusted_shares(shares_outstanding: u64, splits: &[Split], dates: &[NaiveDate]) -> Vec<f64> {
    let valid: Vec<&Split> = splits
        .iter()
        .filter(|s| s.ratio.is_finite() && s.ratio > 0.0)
        .collect();

    dates
        .iter()
        .map(|date| {
            let later: f64 = valid
                .iter()
                .filter(|s| s.date > *date)
                .map(|s| s.ratio)
                .product();
            shares_outstanding as f64 / later
        })
        .collect()
}

/// `trunc(close * shares)`, saturating at zero for non-finite products.
pub fn market_cap(close: f64, shares: f64) -> u64 {
    let cap = close * shares;
    if cap.is_finite() && cap > 0.0 {
        cap.trunc() as u64
    } else {
        0
    }
}
