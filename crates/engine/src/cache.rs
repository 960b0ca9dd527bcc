use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use common::{Bar, MarketData, Result};

/// Freshness-window cache over any `MarketData` implementation.
///
/// Repeated evaluations inside the TTL reuse the cached series instead of
/// re-fetching — the only place staleness is tolerated, and the bound on the
/// provider call rate. Keys are (symbol, interval, range) so the two
/// timeframes cache independently. An expired entry that fails to refresh
/// propagates the error; the engine degrades to a waiting snapshot.
pub struct CachedMarketData<P> {
    inner: P,
    ttl: Duration,
    slots: Mutex<HashMap<(String, String, String), CacheSlot>>,
}

struct CacheSlot {
    fetched_at: Instant,
    bars: Vec<Bar>,
}

impl<P: MarketData> CachedMarketData<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<P: MarketData> MarketData for CachedMarketData<P> {
    async fn fetch_bars(&self, symbol: &str, interval: &str, range: &str) -> Result<Vec<Bar>> {
        let key = (symbol.to_string(), interval.to_string(), range.to_string());

        {
            let slots = self.slots.lock().await;
            if let Some(slot) = slots.get(&key) {
                if slot.fetched_at.elapsed() < self.ttl {
                    debug!(symbol, interval, "Serving bars from cache");
                    return Ok(slot.bars.clone());
                }
            }
        }

        let bars = self.inner.fetch_bars(symbol, interval, range).await?;
        self.slots.lock().await.insert(
            key,
            CacheSlot {
                fetched_at: Instant::now(),
                bars: bars.clone(),
            },
        );
        Ok(bars)
    }
}
