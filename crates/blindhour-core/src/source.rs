//! Seams to the contest data provider.
//!
//! Implementations paginate internally and must return complete data:
//! every official row, every submission. Partial results are errors.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{ContestId, StandingsData, Submission};

#[async_trait]
pub trait StandingsSource: Send + Sync {
    async fn fetch_standings(&self, contest_id: ContestId) -> Result<StandingsData, SourceError>;
}

#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// The full submission log, in any order.
    async fn fetch_submissions(&self, contest_id: ContestId)
    -> Result<Vec<Submission>, SourceError>;
}
