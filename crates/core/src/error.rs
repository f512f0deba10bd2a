/// Result alias that carries the custom [`TweenError`] type.
pub type Result<T> = std::result::Result<T, TweenError>;

/// Common error type for the core crate.
///
/// The time-stepping state machine never fails; these variants only surface at
/// the edges where timing configuration is loaded or validated.
#[derive(Debug, thiserror::Error)]
pub enum TweenError {
    /// Free-form message, mostly produced by the command line front end.
    #[error("{0}")]
    Message(String),
    /// A timing configuration that the engine would accept but that breaks
    /// the caller contract (negative delay or duration).
    #[error("invalid timing configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl TweenError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for TweenError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for TweenError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
