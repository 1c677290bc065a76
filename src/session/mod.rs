//! Session scheduler
//!
//! One session per accepted source image. All mutable state lives in a
//! single task fed by a mailbox:
//! - **Status board:** per-style lifecycle tracking
//! - **Queue & selection:** FIFO dispatch order and the UI staging set
//! - **Governor:** spacing, exponential backoff, circuit breaker
//! - **Core:** the level-triggered dispatch loop, at most one call in
//!   flight

mod config;
mod core;
mod governor;
mod handle;
mod messages;
mod queue;
mod status;

pub use config::SessionConfig;
pub use core::Session;
pub use governor::{RateGovernor, RateLimitAction};
pub use handle::SessionHandle;
pub use messages::{SessionMetrics, SessionRequest, SessionSnapshot};
pub use queue::{GenerationQueue, SelectionSet};
pub use status::{ItemResult, ItemStatus, StatusBoard};
