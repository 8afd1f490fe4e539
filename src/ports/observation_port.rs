//! Market observation store port.

use crate::domain::error::IndexError;
use crate::domain::observation::RawObservation;
use chrono::NaiveDate;

/// First date, last date, row count and ticker count held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRange {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub rows: usize,
    pub tickers: usize,
}

pub trait ObservationPort {
    /// Rows optionally bounded by date (inclusive). Rows sharing a date come
    /// back in the store's own order, which the row-order tie-break uses:
    /// file order for CSV, ticker order for SQLite.
    fn fetch_observations(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<RawObservation>, IndexError>;

    fn get_data_range(&self) -> Result<Option<DataRange>, IndexError>;
}
