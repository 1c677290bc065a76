//! Generation queue and selection set

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use super::status::{ItemStatus, StatusBoard};

/// FIFO queue of style ids awaiting a generation call
///
/// Duplicates are disallowed by construction: an id is only enqueued when
/// it leaves `Idle` (or on explicit retry of a settled item), and dequeued
/// exactly once before its call starts.
#[derive(Debug, Default)]
pub struct GenerationQueue {
    ids: VecDeque<u32>,
}

impl GenerationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append ids at the tail, preserving their relative order
    pub fn enqueue(&mut self, ids: impl IntoIterator<Item = u32>) {
        for id in ids {
            debug_assert!(!self.ids.contains(&id), "style {id} enqueued twice");
            self.ids.push_back(id);
        }
    }

    /// Reinsert an id at the head
    ///
    /// Used only on transient failure, so a backed-off item is retried
    /// before newer items.
    pub fn requeue_front(&mut self, id: u32) {
        debug!(style_id = id, "GenerationQueue::requeue_front: called");
        debug_assert!(!self.ids.contains(&id), "style {id} requeued while queued");
        self.ids.push_front(id);
    }

    /// Remove and return the head id, if any
    pub fn dequeue_head(&mut self) -> Option<u32> {
        self.ids.pop_front()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<u32> {
        self.ids.iter().copied().collect()
    }
}

/// User-chosen subset of style ids, independent of processing state
///
/// Purely a staging area: targets for "generate" while items are idle,
/// targets for export once they are completed. Cleared after being
/// consumed by generate-selected.
#[derive(Debug, Default)]
pub struct SelectionSet {
    ids: HashSet<u32>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: u32) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Ids in the given catalog order
    pub fn in_order<'a>(&'a self, order: impl Iterator<Item = u32> + 'a) -> impl Iterator<Item = u32> + 'a {
        order.filter(|id| self.ids.contains(id))
    }

    /// Select-all over the current board population
    ///
    /// If any item is `Idle`, the target population is all `Idle` items;
    /// otherwise it is all `Completed` items. Idle-before-completed lets
    /// the same control serve both workflows, never both at once. The
    /// whole population toggles uniformly: fully selected → deselect,
    /// anything missing → select all of it. Recomputed eagerly on every
    /// invocation.
    pub fn select_all(&mut self, board: &StatusBoard) {
        let idle = board.ids_with_status(ItemStatus::Idle);
        let targets = if idle.is_empty() {
            board.ids_with_status(ItemStatus::Completed)
        } else {
            idle
        };
        debug!(targets = targets.len(), "SelectionSet::select_all: called");
        if targets.is_empty() {
            return;
        }

        if targets.iter().all(|id| self.ids.contains(id)) {
            for id in targets {
                self.ids.remove(&id);
            }
        } else {
            self.ids.extend(targets);
        }
    }
}
