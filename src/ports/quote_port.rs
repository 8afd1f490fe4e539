//! Per-ticker price and share-count retrieval port.

use crate::domain::error::IndexError;
use crate::domain::split::Split;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct TickerHistory {
    pub ticker: String,
    pub company_name: Option<String>,
    pub closes: Vec<(NaiveDate, f64)>,
    pub shares_outstanding: Option<u64>,
    pub splits: Vec<Split>,
}

/// Implementations must be shareable across the fetch worker pool.
pub trait QuotePort: Sync {
    fn fetch_history(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TickerHistory, IndexError>;
}
