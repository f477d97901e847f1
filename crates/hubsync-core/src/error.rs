//! Error types for the hubsync pipeline
//!
//! Every pipeline step returns one of these kinds; the orchestrator is the
//! sole consumer and decides retry vs. terminal abort. An unchanged WAN IP is
//! deliberately *not* represented here - it is a control signal, not a
//! failure (see `orchestrator`).

use thiserror::Error;

/// Result type alias for hubsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the hubsync pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or non-success HTTP status
    #[error("network error: {0}")]
    Network(String),

    /// Expected content missing from an HTML response
    #[error("parse error: {0}")]
    Parse(String),

    /// The gateway rejected the login submission
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The DNS provider rejected the update call
    #[error("provider API error: {0}")]
    Api(String),

    /// Configuration errors (startup-fatal, never retried)
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a provider API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short classification tag used in logs and cycle events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Auth(_) => "auth",
            Self::Api(_) => "api",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
