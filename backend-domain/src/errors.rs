// Domain error taxonomy

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse date expression '{input}': {reason}")]
pub struct DateParseError {
    pub input: String,
    pub reason: String,
}

impl DateParseError {
    pub fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseParseError {
    #[error("model response is empty")]
    Empty,
    #[error("model response is not a JSON object: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store call timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
