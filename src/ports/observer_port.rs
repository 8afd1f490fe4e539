//! Progress and error callbacks for acquisition.

/// Receives per-ticker progress from the fetch worker pool. Calls arrive
/// from worker threads in completion order.
pub trait FetchObserver: Sync {
    fn on_start(&self, _tickers: usize, _workers: usize) {}

    fn on_fetched(&self, ticker: &str, rows: usize);

    fn on_failed(&self, ticker: &str, reason: &str);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn on_fetched(&self, _ticker: &str, _rows: usize) {}

    fn on_failed(&self, _ticker: &str, _reason: &str) {}
}
