//! Session task implementation
//!
//! One session owns all mutable scheduling state for one user: the status
//! board, the queue, the selection set, the governor, and the in-flight
//! call counter. Every mutation arrives through the mailbox and is
//! followed by a level-triggered dispatch step, so a missed trigger cannot
//! wedge the system: any state change re-runs the same evaluation.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::sleep_until;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::governor::{RateGovernor, RateLimitAction};
use super::handle::SessionHandle;
use super::messages::{SessionMetrics, SessionRequest, SessionSnapshot};
use super::queue::{GenerationQueue, SelectionSet};
use super::status::{ItemStatus, StatusBoard};
use crate::catalog::{StyleCatalog, SubjectGender};
use crate::generator::{EncodedImage, ImageGenerator};

/// Advisory note shown on items returned to the queue by a rate limit
const RATE_LIMIT_NOTE: &str = "Rate limited, will retry";

/// Advisory note shown on the item that tripped the circuit breaker
const PAUSED_NOTE: &str = "Rate limited repeatedly, generation paused";

/// Mutable state owned by the session task
struct SessionState {
    /// Identifies the current upload; fences stale call results
    session_id: Option<Uuid>,
    source: Option<Arc<EncodedImage>>,
    subject: Option<SubjectGender>,
    board: StatusBoard,
    queue: GenerationQueue,
    selection: SelectionSet,
    governor: RateGovernor,
    /// In-flight generation calls; hard cap of 1, gated before dispatch
    active_calls: usize,
    metrics: SessionMetrics,
}

impl SessionState {
    fn new(governor: RateGovernor) -> Self {
        Self {
            session_id: None,
            source: None,
            subject: None,
            board: StatusBoard::empty(),
            queue: GenerationQueue::new(),
            selection: SelectionSet::new(),
            governor,
            active_calls: 0,
            metrics: SessionMetrics::default(),
        }
    }

    /// Deadline to wake at, if a cooldown is the only thing blocking a
    /// dispatch (cooldown expiry is polled, there is no external event)
    fn next_wake(&self, now: Instant) -> Option<Instant> {
        if self.governor.is_paused()
            || self.active_calls >= 1
            || self.queue.is_empty()
            || self.source.is_none()
        {
            return None;
        }
        self.governor.cooldown_deadline(now)
    }
}

/// The session task: turns desired style ids into a throttled, retrying,
/// circuit-broken stream of single-concurrency generation calls
pub struct Session {
    config: SessionConfig,
    catalog: StyleCatalog,
    generator: Arc<dyn ImageGenerator>,
    tx: mpsc::Sender<SessionRequest>,
    rx: mpsc::Receiver<SessionRequest>,
}

impl Session {
    /// Create a new session over the given catalog and generator
    pub fn new(config: SessionConfig, catalog: StyleCatalog, generator: Arc<dyn ImageGenerator>) -> Self {
        debug!(styles = catalog.len(), "Session::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer);
        Self {
            config,
            catalog,
            generator,
            tx,
            rx,
        }
    }

    /// Create a handle for the UI layer
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.tx.clone())
    }

    /// Run the session task
    ///
    /// Consumes the session and runs until shutdown is requested.
    pub async fn run(mut self) {
        let mut state = SessionState::new(RateGovernor::from_config(&self.config));

        info!("Session started");

        loop {
            let request = match state.next_wake(Instant::now()) {
                Some(deadline) => {
                    tokio::select! {
                        req = self.rx.recv() => match req {
                            Some(req) => Some(req),
                            None => break,
                        },
                        // Cooldown expired with work waiting; re-evaluate
                        _ = sleep_until(deadline.into()) => None,
                    }
                }
                None => match self.rx.recv().await {
                    Some(req) => Some(req),
                    None => break,
                },
            };

            if let Some(request) = request {
                if matches!(request, SessionRequest::Shutdown) {
                    info!("Session shutdown requested");
                    break;
                }
                self.apply(&mut state, request);
            }

            self.pump(&mut state);
        }

        info!("Session stopped");
    }

    /// Apply one mailbox request to the session state
    fn apply(&self, state: &mut SessionState, request: SessionRequest) {
        match request {
            SessionRequest::Start { image, subject } => {
                let session_id = Uuid::now_v7();
                info!(%session_id, ?subject, "New source image accepted");

                // A new upload discards all prior results and selection.
                // An in-flight call from the previous upload still settles;
                // the session id mismatch discards its result.
                state.session_id = Some(session_id);
                state.source = Some(Arc::new(image));
                state.subject = Some(subject);
                state.board = StatusBoard::initialize(&self.catalog);
                state.queue.clear();
                state.selection.clear();
                state.governor = RateGovernor::from_config(&self.config);
            }

            SessionRequest::GenerateSelected => {
                let targets: Vec<u32> = state
                    .selection
                    .in_order(self.catalog.ids())
                    .filter(|id| state.board.status(*id) == Some(ItemStatus::Idle))
                    .collect();
                debug!(count = targets.len(), "Generate selected");

                for &id in &targets {
                    state.board.mark_queued(id);
                }
                state.queue.enqueue(targets);
                state.selection.clear();
            }

            SessionRequest::Retry { style_id } => match state.board.status(style_id) {
                Some(ItemStatus::Failed) | Some(ItemStatus::Completed) => {
                    debug!(style_id, "Retrying style");
                    state.board.mark_queued(style_id);
                    state.queue.enqueue([style_id]);
                }
                other => {
                    debug!(style_id, ?other, "Retry ignored, style not settled");
                }
            },

            SessionRequest::ToggleSelect { style_id } => {
                if self.catalog.contains(style_id) {
                    state.selection.toggle(style_id);
                } else {
                    debug!(style_id, "Toggle ignored, style not in catalog");
                }
            }

            SessionRequest::SelectAll => {
                state.selection.select_all(&state.board);
            }

            SessionRequest::PauseToggle => {
                if state.governor.is_paused() {
                    info!("Session resumed");
                    state.governor.resume();
                } else {
                    info!("Session paused");
                    state.governor.pause();
                }
            }

            SessionRequest::Snapshot { reply_tx } => {
                let _ = reply_tx.send(self.snapshot(state));
            }

            SessionRequest::CallFinished {
                session_id,
                style_id,
                outcome,
            } => {
                // The slot is released unconditionally, so an erroring
                // call can never leak it
                state.active_calls = state.active_calls.saturating_sub(1);

                if Some(session_id) != state.session_id {
                    debug!(%session_id, style_id, "Discarding result from a replaced upload");
                    return;
                }

                self.reconcile(state, style_id, outcome);
            }

            // Handled by the run loop
            SessionRequest::Shutdown => {}
        }
    }

    /// Apply a settled call's outcome to the board and the governor
    fn reconcile(
        &self,
        state: &mut SessionState,
        style_id: u32,
        outcome: Result<EncodedImage, crate::generator::GenerateError>,
    ) {
        let now = Instant::now();
        match outcome {
            Ok(image) => {
                debug!(style_id, "Generation completed");
                state.board.mark_completed(style_id, image);
                state.governor.note_success(now);
                state.metrics.calls_completed += 1;
            }

            Err(error) if error.is_rate_limit() => {
                state.metrics.calls_rate_limited += 1;

                // Head reinsertion: the backed-off item is retried before
                // newer items
                state.queue.requeue_front(style_id);

                match state.governor.note_rate_limit(now) {
                    RateLimitAction::Backoff(delay) => {
                        info!(style_id, ?delay, streak = state.governor.streak(), "Rate limited, backing off");
                        state.board.mark_failed_transient(style_id, Some(RATE_LIMIT_NOTE.to_string()));
                    }
                    RateLimitAction::Paused => {
                        warn!(style_id, "Circuit breaker tripped, pausing until manual resume");
                        state.board.mark_failed_transient(style_id, Some(PAUSED_NOTE.to_string()));
                        state.metrics.breaker_trips += 1;
                    }
                }
            }

            Err(error) => {
                let message = error.to_string();
                warn!(style_id, %message, "Generation failed");
                state.board.mark_failed_permanent(style_id, message);
                state.governor.note_permanent_failure();
                state.metrics.calls_failed_permanent += 1;
            }
        }
    }

    /// Level-triggered dispatch step
    ///
    /// Dispatches at most one item per invocation; relies on being re-run
    /// after every relevant state change for forward progress.
    fn pump(&self, state: &mut SessionState) {
        loop {
            if state.active_calls >= 1 || !state.governor.permits_dispatch(Instant::now()) {
                return;
            }
            let (Some(source), Some(subject), Some(session_id)) =
                (state.source.clone(), state.subject, state.session_id)
            else {
                return;
            };
            let Some(style_id) = state.queue.dequeue_head() else {
                return;
            };

            // Structural guards: decline to dispatch, release the slot,
            // and evaluate the next head. Normal UI flow cannot reach
            // these.
            let Some(entry) = self.catalog.get(style_id) else {
                warn!(style_id, "Dequeued style missing from catalog, skipping");
                continue;
            };
            if !state.board.mark_generating(style_id) {
                warn!(style_id, "Dequeued style was not pending, skipping");
                continue;
            }

            state.active_calls += 1;
            state.metrics.calls_dispatched += 1;
            debug!(style_id, style = %entry.name, "Dispatching generation call");

            let generator = Arc::clone(&self.generator);
            let directive = entry.prompt_text.clone();
            let tx = self.tx.clone();

            tokio::spawn(async move {
                let outcome = generator.generate(&source, subject, &directive).await;
                // A closed channel means the session is gone; the result
                // has nowhere to go
                let _ = tx
                    .send(SessionRequest::CallFinished {
                        session_id,
                        style_id,
                        outcome,
                    })
                    .await;
            });

            return;
        }
    }

    /// Build a read-only snapshot for the UI layer
    fn snapshot(&self, state: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            items: state.board.results().cloned().collect(),
            queue_len: state.queue.len(),
            active_calls: state.active_calls,
            paused: state.governor.is_paused(),
            cooldown_remaining: state.governor.cooldown_remaining(Instant::now()),
            rate_limit_streak: state.governor.streak(),
            selected: state.selection.in_order(self.catalog.ids()).collect(),
            has_source: state.source.is_some(),
            metrics: state.metrics.clone(),
        }
    }
}
