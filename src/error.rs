use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogwatchError {
    #[error("Session invalidated, re-authentication required")]
    SessionInvalidated,

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Server returned non-success status: {0}")]
    StatusError(reqwest::StatusCode),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Command error: {0}")]
    CommandError(String),
}

impl LogwatchError {
    pub fn is_session_loss(&self) -> bool {
        matches!(self, LogwatchError::SessionInvalidated)
    }
}
