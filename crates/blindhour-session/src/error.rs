use blindhour_core::SourceError;
use thiserror::Error;

use crate::phase::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("no contest is being tracked")]
    NoContest,

    /// Reveal could not fetch the complete log; no payload was built.
    #[error("reveal reconstruction failed: {0}")]
    Reconstruction(SourceError),
}
