//! Stylecast - Portrait style generation scheduler
//!
//! Stylecast turns a list of desired style ids into a throttled, retrying,
//! circuit-broken stream of single-concurrency image-generation API calls,
//! and reconciles each call's outcome into per-item status.
//!
//! # Core Concepts
//!
//! - **One Call In Flight**: the external API allows a single concurrent
//!   generation, enforced structurally by a gated counter
//! - **Level-Triggered Dispatch**: every state change re-runs the same
//!   evaluation, so a missed trigger cannot wedge the pipeline
//! - **Backoff Then Breaker**: rate-limit errors requeue the item at the
//!   head and double the cooldown; a streak of them pauses the session
//!   until a manual resume
//! - **Single Owner**: all mutable state lives in one session task fed by
//!   a mailbox; the UI layer interacts through a cloneable handle
//!
//! # Modules
//!
//! - [`catalog`] - Style preset catalog and subject types
//! - [`generator`] - Image-generation trait seam and error classification
//! - [`session`] - The scheduler: status board, queue, governor, core task

pub mod catalog;
pub mod generator;
pub mod session;

// Re-export commonly used types
pub use catalog::{StyleCatalog, StyleCatalogEntry, SubjectGender};
pub use generator::{EncodedImage, GenerateError, ImageGenerator};
pub use session::{
    ItemResult, ItemStatus, Session, SessionConfig, SessionHandle, SessionMetrics, SessionRequest, SessionSnapshot,
};
