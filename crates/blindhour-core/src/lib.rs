//! blindhour-core: event model, standings replay, and freeze/reveal
//! reconstruction for ICPC-style scoreboards.
//!
//! Pure library. No runtime, no IO; the provider is reached only through
//! the traits in [`source`].

pub mod error;
pub mod replay;
pub mod reveal;
pub mod scoring;
pub mod snapshot;
pub mod source;
pub mod types;

pub use error::SourceError;
pub use replay::standings_at;
pub use reveal::{RevealInput, reconstruct};
pub use snapshot::{
    BlindHourSubmission, FreezeProblemResult, RankedContestant, RevealContestant, RevealHeader,
    RevealPayload, SnapshotHeader, StandingsSnapshot,
};
pub use source::{StandingsSource, SubmissionSource};
