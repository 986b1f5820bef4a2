//! blindhour-session: the contest lifecycle (setup, live, frozen, reveal)
//! and the background work that keeps its board current.

pub mod config;
pub mod error;
pub mod phase;
pub mod session;
mod worker;

pub use config::{ContestConfig, MIN_REFRESH_INTERVAL, SessionOptions, SimulationConfig};
pub use error::SessionError;
pub use phase::{Phase, Transition};
pub use session::{ContestSession, SessionStatus, View};
