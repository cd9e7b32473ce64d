#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[cfg(feature = "network")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("snapshot store error (HTTP {status}): {body}")]
    Store { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad config: {0}")]
    Config(String),

    #[error("missing snapshot store settings: set $LLMHUB_STORE_URL and $LLMHUB_STORE_KEY")]
    NoStore,

    #[error("IO error: {0}")]
    Io(String),
}

impl AdvisorError {
    /// Short machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::Json(_) => "invalid_payload",
            Self::Config(_) => "bad_config",
            _ => "upstream_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
