use thiserror::Error;

/// Failure talking to the issue search API.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 answer; carries the status line, e.g. `403 Forbidden`.
    #[error("search query failed: {0}")]
    Status(String),

    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid search endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Result content the text report cannot be built from.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("issue #{number} has no user")]
    MissingUser { number: u64 },

    #[error(transparent)]
    Format(#[from] std::fmt::Error),
}

/// Causes reported back to a client. `Display` is the wire text that follows
/// `error: search query failed: `.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("{0}")]
    Throttled(#[from] crate::rate_limit::Rejected),

    #[error("50x External API Error: {0}")]
    ExternalApi(#[from] SearchError),

    #[error("500 Internal Server Error: {0}")]
    Render(#[from] RenderError),
}

impl ReplyError {
    /// Throttling keeps the session open; everything else ends it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReplyError::Throttled(_))
    }
}
