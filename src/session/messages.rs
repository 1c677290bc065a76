//! Message types for the session actor

use std::time::Duration;

use tokio::sync::oneshot;
use uuid::Uuid;

use super::status::ItemResult;
use crate::catalog::SubjectGender;
use crate::generator::{EncodedImage, GenerateError};

/// Requests into the session task
///
/// User actions and internal call completions flow through the same
/// mailbox, so all state transitions are applied by the single owning
/// task.
#[derive(Debug)]
pub enum SessionRequest {
    /// Accept a new source image: fresh status board, cleared queue and
    /// selection, governor reset. Discards all prior results.
    Start {
        image: EncodedImage,
        subject: SubjectGender,
    },

    /// Enqueue every selected idle style, then clear the selection
    GenerateSelected,

    /// Re-enqueue a settled (failed or completed) style
    Retry { style_id: u32 },

    /// Toggle one style in the selection set
    ToggleSelect { style_id: u32 },

    /// Select or deselect the whole idle (or, failing that, completed)
    /// population
    SelectAll,

    /// Toggle the governor between paused and running
    PauseToggle,

    /// Read-only snapshot of the observable state
    Snapshot {
        reply_tx: oneshot::Sender<SessionSnapshot>,
    },

    /// A generation call settled (internal)
    CallFinished {
        session_id: Uuid,
        style_id: u32,
        outcome: Result<EncodedImage, GenerateError>,
    },

    /// Shut down the session task
    Shutdown,
}

/// Read-only snapshot of session state for the UI layer
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Per-style results in catalog order (empty before the first upload)
    pub items: Vec<ItemResult>,

    /// Number of styles waiting in the queue
    pub queue_len: usize,

    /// In-flight generation calls (0 or 1)
    pub active_calls: usize,

    /// Whether the governor is paused (breaker or manual)
    pub paused: bool,

    /// Time until the running cooldown expires, if one is running
    pub cooldown_remaining: Option<Duration>,

    /// Current consecutive rate-limit error streak
    pub rate_limit_streak: u32,

    /// Currently selected style ids, in catalog order
    pub selected: Vec<u32>,

    /// Whether a source image has been accepted
    pub has_source: bool,

    pub metrics: SessionMetrics,
}

/// Session counters for observability
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub calls_dispatched: u64,
    pub calls_completed: u64,
    pub calls_failed_permanent: u64,
    pub calls_rate_limited: u64,
    pub breaker_trips: u64,
}
