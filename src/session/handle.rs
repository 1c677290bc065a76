//! SessionHandle - client interface for the UI layer

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::messages::{SessionRequest, SessionSnapshot};
use crate::catalog::SubjectGender;
use crate::generator::EncodedImage;

/// Handle for the UI layer to interact with a running session
///
/// Cloneable; all operations are async and non-blocking. Every method's
/// observable effect is applied by the session task, never by the caller.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionRequest>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionRequest>) -> Self {
        Self { tx }
    }

    async fn send(&self, request: SessionRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| eyre!("Session channel closed"))
    }

    /// Accept a new source image, discarding all prior results
    pub async fn start(&self, image: EncodedImage, subject: SubjectGender) -> Result<()> {
        debug!(?subject, "SessionHandle::start: called");
        self.send(SessionRequest::Start { image, subject }).await
    }

    /// Enqueue every selected idle style and clear the selection
    pub async fn generate_selected(&self) -> Result<()> {
        debug!("SessionHandle::generate_selected: called");
        self.send(SessionRequest::GenerateSelected).await
    }

    /// Re-enqueue a failed or completed style
    pub async fn retry(&self, style_id: u32) -> Result<()> {
        debug!(style_id, "SessionHandle::retry: called");
        self.send(SessionRequest::Retry { style_id }).await
    }

    /// Toggle one style in the selection set
    pub async fn toggle_select(&self, style_id: u32) -> Result<()> {
        debug!(style_id, "SessionHandle::toggle_select: called");
        self.send(SessionRequest::ToggleSelect { style_id }).await
    }

    /// Select or deselect the whole eligible population
    pub async fn select_all(&self) -> Result<()> {
        debug!("SessionHandle::select_all: called");
        self.send(SessionRequest::SelectAll).await
    }

    /// Pause dispatch, or resume it (resetting the rate-limit streak)
    pub async fn pause_toggle(&self) -> Result<()> {
        debug!("SessionHandle::pause_toggle: called");
        self.send(SessionRequest::PauseToggle).await
    }

    /// Fetch a read-only snapshot of the observable state
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        debug!("SessionHandle::snapshot: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionRequest::Snapshot { reply_tx }).await?;
        reply_rx.await.map_err(|_| eyre!("Session shutdown before reply"))
    }

    /// Request the session task to stop
    pub async fn shutdown(&self) -> Result<()> {
        debug!("SessionHandle::shutdown: called");
        self.send(SessionRequest::Shutdown).await
    }
}
