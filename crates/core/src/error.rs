use crate::timeline::ElementId;

/// Result alias that carries the custom [`ScrollReelError`] type.
pub type Result<T> = std::result::Result<T, ScrollReelError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ScrollReelError {
    /// A configuration value was missing, unparsable or out of range. Raised
    /// at construction time only; running scrubbers never produce it.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An element may drive at most one scrubber.
    #[error("element {0} already has a registered scrubber")]
    DuplicateRegistration(ElementId),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl ScrollReelError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for ScrollReelError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ScrollReelError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
