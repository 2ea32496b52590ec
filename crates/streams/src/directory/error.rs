use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status code {0}")]
    Status(StatusCode),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid directory json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tls configuration error: {0}")]
    Tls(String),
    #[error("no {0} source configured")]
    NotConfigured(&'static str),
    #[error("channels not available (remote: {remote}; local: {local})")]
    Unavailable { remote: String, local: String },
}

impl DirectoryError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DirectoryError::Unavailable { .. })
    }

    /// Whether asking the same source again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DirectoryError::Http(_) | DirectoryError::Unavailable { .. } => true,
            DirectoryError::Status(status) => status.is_server_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(DirectoryError::Status(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!DirectoryError::Status(StatusCode::NOT_FOUND).is_retryable());
        assert!(!DirectoryError::NotConfigured("remote").is_retryable());
        assert!(
            DirectoryError::Unavailable {
                remote: "down".into(),
                local: "missing".into()
            }
            .is_retryable()
        );
    }
}
