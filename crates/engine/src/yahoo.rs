use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Bar, Error, MarketData, Result};

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo has no official API; requests without a browser user-agent are
/// rejected intermittently.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// REST client for the Yahoo Finance v8 chart API.
///
/// All failure modes surface as `Error::DataUnavailable` or `Error::Http`
/// return values — nothing here panics past the boundary, and the request
/// timeout bounds a slow provider.
pub struct YahooClient {
    http: Client,
}

impl YahooClient {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .timeout(Duration::from_secs(10))
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn fetch_bars(&self, symbol: &str, interval: &str, range: &str) -> Result<Vec<Bar>> {
        let url = format!("{BASE_URL}/v8/finance/chart/{symbol}?interval={interval}&range={range}");

        debug!(symbol, interval, range, "Fetching bars from Yahoo");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::DataUnavailable(format!("HTTP {status}: {body}")));
        }

        let chart: ChartResponse = serde_json::from_str(&body)?;
        parse_chart(chart)
    }
}

fn parse_chart(resp: ChartResponse) -> Result<Vec<Bar>> {
    let result = match (resp.chart.result, resp.chart.error) {
        (Some(result), _) => result,
        (None, Some(err)) => {
            return Err(Error::DataUnavailable(format!(
                "{}: {}",
                err.code, err.description
            )))
        }
        (None, None) => {
            return Err(Error::DataUnavailable("empty chart result".into()));
        }
    };

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| Error::DataUnavailable("chart result array is empty".into()))?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| Error::DataUnavailable("chart has no timestamps".into()))?;

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| Error::DataUnavailable("chart has no quote data".into()))?;

    let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        // Yahoo emits nulls for the still-forming bar and occasional gaps;
        // a row is only usable when all four fields are present.
        let (open, high, low, close) = match (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        ) {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => continue,
        };

        let Some(timestamp) = Utc.timestamp_opt(ts, 0).single() else {
            continue;
        };

        // Enforce the series contract: ascending, no duplicate timestamps.
        if bars.last().is_some_and(|last| timestamp <= last.timestamp) {
            continue;
        }

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
        });
    }

    if bars.is_empty() {
        return Err(Error::DataUnavailable("chart contained no usable bars".into()));
    }

    Ok(bars)
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartNode,
}

#[derive(Deserialize)]
struct ChartNode {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_json(body: &str) -> ChartResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn parses_a_well_formed_chart() {
        let resp = chart_json(
            r#"{"chart":{"result":[{"timestamp":[1700000000,1700003600],
                "indicators":{"quote":[{
                    "open":[2000.0,2001.0],
                    "high":[2002.0,2003.0],
                    "low":[1999.0,2000.0],
                    "close":[2001.0,2002.5]}]}}],
                "error":null}}"#,
        );
        let bars = parse_chart(resp).unwrap();
        assert_eq!(bars.len(), 2);
        assert!((bars[1].close - 2002.5).abs() < 1e-9);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn null_rows_are_skipped() {
        let resp = chart_json(
            r#"{"chart":{"result":[{"timestamp":[1700000000,1700003600],
                "indicators":{"quote":[{
                    "open":[2000.0,null],
                    "high":[2002.0,2003.0],
                    "low":[1999.0,2000.0],
                    "close":[2001.0,2002.5]}]}}],
                "error":null}}"#,
        );
        let bars = parse_chart(resp).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn duplicate_timestamps_are_dropped() {
        let resp = chart_json(
            r#"{"chart":{"result":[{"timestamp":[1700000000,1700000000],
                "indicators":{"quote":[{
                    "open":[2000.0,2000.5],
                    "high":[2002.0,2002.0],
                    "low":[1999.0,1999.0],
                    "close":[2001.0,2001.2]}]}}],
                "error":null}}"#,
        );
        let bars = parse_chart(resp).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn provider_error_is_data_unavailable() {
        let resp = chart_json(
            r#"{"chart":{"result":null,
                "error":{"code":"Not Found","description":"No data found"}}}"#,
        );
        match parse_chart(resp) {
            Err(Error::DataUnavailable(msg)) => assert!(msg.contains("Not Found")),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn all_null_chart_is_data_unavailable() {
        let resp = chart_json(
            r#"{"chart":{"result":[{"timestamp":[1700000000],
                "indicators":{"quote":[{
                    "open":[null],"high":[null],"low":[null],"close":[null]}]}}],
                "error":null}}"#,
        );
        assert!(matches!(parse_chart(resp), Err(Error::DataUnavailable(_))));
    }
}
