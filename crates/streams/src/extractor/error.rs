use std::time::Duration;

use thiserror::Error;

/// Failure of the external extraction tool.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("extraction tool not available: {0}")]
    ToolNotFound(String),
    #[error("failed to run extraction tool: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("extraction tool exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("no playable url in extraction tool output")]
    NoUrl,
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid metadata json: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ExtractionError {
    /// Failures that may succeed on a second attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractionError::Timeout(_)
                | ExtractionError::NonZeroExit { .. }
                | ExtractionError::Spawn(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unsupported channel type: {0:?}")]
    Unsupported(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionError),
}

impl ResolveError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ResolveError::ExtractionFailed(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_extraction_failures_are_retryable() {
        assert!(!ResolveError::InvalidInput("empty url".into()).is_retryable());
        assert!(!ResolveError::Unsupported("radio".into()).is_retryable());
        assert!(!ResolveError::from(ExtractionError::NoUrl).is_retryable());
        assert!(!ResolveError::from(ExtractionError::ToolNotFound("yt-dlp".into())).is_retryable());
        assert!(
            ResolveError::from(ExtractionError::Timeout(Duration::from_secs(10))).is_retryable()
        );
    }
}
