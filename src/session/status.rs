//! Per-style lifecycle tracking
//!
//! The status board is a pure data structure: transitions mutate exactly
//! one entry and never touch the queue or the governor (the session core
//! orchestrates those).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::StyleCatalog;
use crate::generator::EncodedImage;

/// Lifecycle state of a single style
///
/// `Idle → Pending → Generating → Completed | Failed`, with `Failed` and
/// `Completed` retriable back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Idle,
    Pending,
    Generating,
    Completed,
    Failed,
}

/// Result entry for a single style
///
/// Invariants: `image.is_some()` iff `status == Completed`; `error` is
/// meaningful on `Failed`, and may transiently hold an advisory note on
/// `Pending` (cleared on the next transition).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    #[serde(rename = "style-id")]
    pub style_id: u32,
    pub image: Option<EncodedImage>,
    pub status: ItemStatus,
    pub error: Option<String>,
}

impl ItemResult {
    fn idle(style_id: u32) -> Self {
        Self {
            style_id,
            image: None,
            status: ItemStatus::Idle,
            error: None,
        }
    }
}

/// Status board: one `ItemResult` per catalog entry, in catalog order
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    items: HashMap<u32, ItemResult>,
    order: Vec<u32>,
}

impl StatusBoard {
    /// Empty board, used before any source image has been accepted
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fresh board with every catalog entry `Idle`
    ///
    /// Called once per newly accepted source image; replaces any prior
    /// mapping.
    pub fn initialize(catalog: &StyleCatalog) -> Self {
        debug!(styles = catalog.len(), "StatusBoard::initialize: called");
        let order: Vec<u32> = catalog.ids().collect();
        let items = order.iter().map(|&id| (id, ItemResult::idle(id))).collect();
        Self { items, order }
    }

    pub fn get(&self, id: u32) -> Option<&ItemResult> {
        self.items.get(&id)
    }

    pub fn status(&self, id: u32) -> Option<ItemStatus> {
        self.items.get(&id).map(|item| item.status)
    }

    /// Results in catalog order
    pub fn results(&self) -> impl Iterator<Item = &ItemResult> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Ids with the given status, in catalog order
    pub fn ids_with_status(&self, status: ItemStatus) -> Vec<u32> {
        self.order
            .iter()
            .filter(|id| self.status(**id) == Some(status))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `status := Pending`, clearing `error` and `image`
    ///
    /// Returns false if the id is unknown (the caller logs and moves on).
    pub fn mark_queued(&mut self, id: u32) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        item.status = ItemStatus::Pending;
        item.error = None;
        item.image = None;
        true
    }

    /// `Pending → Generating` for a freshly dequeued item
    ///
    /// Refuses any other starting state so a stale dequeue cannot clobber
    /// a settled result.
    pub fn mark_generating(&mut self, id: u32) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        if item.status != ItemStatus::Pending {
            return false;
        }
        item.status = ItemStatus::Generating;
        item.error = None;
        true
    }

    /// `status := Completed` with the generated image
    pub fn mark_completed(&mut self, id: u32, image: EncodedImage) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        item.status = ItemStatus::Completed;
        item.image = Some(image);
        item.error = None;
        true
    }

    /// Terminal failure: `status := Failed` with the message retained
    pub fn mark_failed_permanent(&mut self, id: u32, message: impl Into<String>) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        item.status = ItemStatus::Failed;
        item.error = Some(message.into());
        item.image = None;
        true
    }

    /// Transient failure: back to `Pending` with an optional advisory note
    pub fn mark_failed_transient(&mut self, id: u32, note: Option<String>) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        item.status = ItemStatus::Pending;
        item.error = note;
        item.image = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StyleCatalogEntry;

    fn catalog() -> StyleCatalog {
        let entries = (1..=3)
            .map(|id| StyleCatalogEntry {
                id,
                name: format!("style-{id}"),
                category: "test".to_string(),
                prompt_text: format!("prompt-{id}"),
            })
            .collect();
        StyleCatalog::from_entries(entries).unwrap()
    }

    fn image() -> EncodedImage {
        EncodedImage::new("image/png", "AAAA")
    }

    #[test]
    fn test_initialize_all_idle() {
        let board = StatusBoard::initialize(&catalog());
        assert_eq!(board.len(), 3);
        for item in board.results() {
            assert_eq!(item.status, ItemStatus::Idle);
            assert!(item.image.is_none());
            assert!(item.error.is_none());
        }
    }

    #[test]
    fn test_happy_path_lifecycle() {
        let mut board = StatusBoard::initialize(&catalog());

        assert!(board.mark_queued(1));
        assert_eq!(board.status(1), Some(ItemStatus::Pending));

        assert!(board.mark_generating(1));
        assert_eq!(board.status(1), Some(ItemStatus::Generating));

        assert!(board.mark_completed(1, image()));
        let item = board.get(1).unwrap();
        assert_eq!(item.status, ItemStatus::Completed);
        assert!(item.image.is_some());
        assert!(item.error.is_none());
    }

    #[test]
    fn test_mark_generating_requires_pending() {
        let mut board = StatusBoard::initialize(&catalog());
        assert!(!board.mark_generating(1)); // still Idle

        board.mark_queued(1);
        board.mark_generating(1);
        board.mark_completed(1, image());
        assert!(!board.mark_generating(1)); // already Completed
    }

    #[test]
    fn test_permanent_failure_keeps_message() {
        let mut board = StatusBoard::initialize(&catalog());
        board.mark_queued(2);
        board.mark_generating(2);
        board.mark_failed_permanent(2, "invalid argument");

        let item = board.get(2).unwrap();
        assert_eq!(item.status, ItemStatus::Failed);
        assert_eq!(item.error.as_deref(), Some("invalid argument"));
        assert!(item.image.is_none());
    }

    #[test]
    fn test_transient_failure_returns_to_pending_with_note() {
        let mut board = StatusBoard::initialize(&catalog());
        board.mark_queued(2);
        board.mark_generating(2);
        board.mark_failed_transient(2, Some("rate limited, retrying".to_string()));

        let item = board.get(2).unwrap();
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.error.as_deref(), Some("rate limited, retrying"));

        // Advisory note is cleared on the next transition
        board.mark_generating(2);
        assert!(board.get(2).unwrap().error.is_none());
    }

    #[test]
    fn test_retry_clears_image_and_error() {
        let mut board = StatusBoard::initialize(&catalog());
        board.mark_queued(3);
        board.mark_generating(3);
        board.mark_failed_permanent(3, "boom");

        board.mark_queued(3); // explicit user retry
        let item = board.get(3).unwrap();
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.error.is_none());
        assert!(item.image.is_none());
    }

    #[test]
    fn test_image_iff_completed() {
        let mut board = StatusBoard::initialize(&catalog());
        board.mark_queued(1);
        board.mark_generating(1);
        board.mark_completed(1, image());
        board.mark_queued(1); // regenerate
        assert!(board.get(1).unwrap().image.is_none());

        for item in board.results() {
            assert_eq!(item.image.is_some(), item.status == ItemStatus::Completed);
        }
    }

    #[test]
    fn test_unknown_id_rejected() {
        let mut board = StatusBoard::initialize(&catalog());
        assert!(!board.mark_queued(42));
        assert!(!board.mark_completed(42, image()));
        assert!(!board.mark_failed_permanent(42, "nope"));
    }

    #[test]
    fn test_ids_with_status_in_catalog_order() {
        let mut board = StatusBoard::initialize(&catalog());
        board.mark_queued(3);
        assert_eq!(board.ids_with_status(ItemStatus::Idle), vec![1, 2]);
        assert_eq!(board.ids_with_status(ItemStatus::Pending), vec![3]);
    }
}
