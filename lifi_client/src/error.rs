use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl LifiError {
    /// Network failures and upstream error statuses are retried; a response
    /// that arrived but does not decode is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, LifiError::Http(_) | LifiError::Api { .. })
    }
}
