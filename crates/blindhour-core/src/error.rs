//! Error types for contest data sources.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transport or HTTP failure that persisted through every retry.
    #[error("source unavailable after {attempts} attempt(s): {message}")]
    Unavailable { attempts: u32, message: String },

    /// The source answered, but refused the request (e.g. unknown contest).
    #[error("source rejected request: {0}")]
    Rejected(String),

    #[error("malformed source response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
