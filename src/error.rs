// src/error.rs
use thiserror::Error;

/// Error taxonomy of the decision engine.
///
/// The Decision Loop only cares about three outcomes: retry the cycle after a
/// backoff, end the cycle without retrying (rejected order), or refuse to start.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Network failure, timeout, 5xx, or authentication problem.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Exchange API error outside of order placement.
    #[error("exchange error {code}: {msg}")]
    Exchange { code: i64, msg: String },

    /// The exchange declined an order.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Payload from the exchange did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl EngineError {
    /// Whether the Decision Loop should back off and run the same cycle again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Connectivity(_) | EngineError::Exchange { .. } | EngineError::Decode(_)
        )
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            EngineError::Decode(e.to_string())
        } else {
            EngineError::Connectivity(e.to_string())
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Decode(e.to_string())
    }
}

impl From<serde_urlencoded::ser::Error> for EngineError {
    fn from(e: serde_urlencoded::ser::Error) -> Self {
        EngineError::Decode(e.to_string())
    }
}

impl From<rust_decimal::Error> for EngineError {
    fn from(e: rust_decimal::Error) -> Self {
        EngineError::Decode(e.to_string())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(e: config::ConfigError) -> Self {
        EngineError::Configuration(e.to_string())
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
