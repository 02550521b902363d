/// Error types for Tab Grouper
use thiserror::Error;

/// Everything that can go wrong while categorizing and grouping tabs.
///
/// None of these are fatal: callers log them and carry on with the
/// in-memory rule list as the source of truth.
#[derive(Debug, Error)]
pub enum GrouperError {
    /// The browser has no tab-groups API in this environment
    #[error("tab groups are not supported in this browser")]
    GroupsUnsupported,

    /// A tab/group/window call was rejected by the browser
    #[error("host call failed: {0}")]
    Host(String),

    /// The host reported no group or tab with the requested id
    #[error("no such {kind} on host: {id}")]
    MissingHost { kind: &'static str, id: i32 },

    /// Reading or writing the key-value store failed
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Rejected user input from the settings form
    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, GrouperError>;

impl GrouperError {
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
