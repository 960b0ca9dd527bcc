use async_trait::async_trait;

use crate::{Bar, Result};

/// Abstraction over the market-data source.
///
/// `YahooClient` implements this against the Yahoo chart API; the TTL cache
/// in `crates/engine` wraps any implementation to bound the call rate.
///
/// Unavailability is a return value (`Error::DataUnavailable`), never a
/// panic — the evaluation cycle degrades to a waiting snapshot.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch recent OHLC bars for `symbol` at the given interval (e.g. "1h")
    /// over the given lookback range (e.g. "5d"), ascending by timestamp.
    async fn fetch_bars(&self, symbol: &str, interval: &str, range: &str) -> Result<Vec<Bar>>;
}
