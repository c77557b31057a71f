pub type ReelResult<T> = Result<T, ReelError>;

/// Failure kinds surfaced by a render.
///
/// Only [`ReelError::MissingSecondary`] is recoverable: the pipeline skips that pair and keeps
/// going. Every other variant aborts the current render.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("missing secondary image for sequence key '{0}'")]
    MissingSecondary(String),

    #[error("insufficient beats: {0}")]
    InsufficientBeats(String),

    #[error("no frames to render: every image pair was skipped")]
    NoFrames,

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn missing_secondary(key: impl Into<String>) -> Self {
        Self::MissingSecondary(key.into())
    }

    pub fn insufficient_beats(msg: impl Into<String>) -> Self {
        Self::InsufficientBeats(msg.into())
    }

    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `false` only for per-pair failures that the compositor skips.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingSecondary(_))
    }

    /// Whether running the same render again could succeed.
    ///
    /// Input-shaped failures (no beats, no frames, bad durations, bad config) fail the same way
    /// every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::Other(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
