//! blindhour-source-codeforces: the Codeforces API as a contest data source.

pub mod client;
pub mod retry;
pub mod wire;

pub use client::{CodeforcesClient, DEFAULT_BASE_URL};
pub use retry::{AttemptError, RetryPolicy, run_with_retry};
