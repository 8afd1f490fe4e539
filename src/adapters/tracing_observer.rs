//! Fetch progress forwarded to `tracing`.

use crate::ports::observer_port::FetchObserver;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TracingObserver {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(&self) -> (usize, usize) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        (done, self.total.load(Ordering::Relaxed))
    }
}

impl FetchObserver for TracingObserver {
    fn on_start(&self, tickers: usize, workers: usize) {
        self.total.store(tickers, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        tracing::info!(tickers, workers, "fetching market data");
    }

    fn on_fetched(&self, ticker: &str, rows: usize) {
        let (done, total) = self.advance();
        tracing::info!(%ticker, rows, "fetched {}/{}", done, total);
    }

    fn on_failed(&self, ticker: &str, reason: &str) {
        let (done, total) = self.advance();
        tracing::warn!(%ticker, %reason, "fetch failed {}/{}", done, total);
    }
}
