use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The bar series is shorter than the longest indicator lookback.
    /// Upstream treats this as "no signal, show waiting state".
    #[error("insufficient data: need {required} bars, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// The provider returned nothing usable. Degraded handling, never a crash.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
