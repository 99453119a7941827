//! Host mutation-notification facility.
//!
//! Models the environment's batch mutation observer: subscriptions are held
//! per tree root with subtree tracking, and every child-list change inside a
//! subscribed tree is buffered as a [`MutationRecord`]. The host delivers the
//! buffer later (see `Window::run_microtasks`); [`MutationLog::take_records`]
//! drains it synchronously.

use crate::dom::NodeId;

/// One child-list change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The node whose children changed.
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

impl MutationRecord {
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty() && self.removed_nodes.is_empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct MutationLog {
    observed_roots: Vec<NodeId>,
    pending: Vec<MutationRecord>,
}

impl MutationLog {
    /// Subscribes `root` and its whole subtree. Subscribing twice is a no-op.
    pub(crate) fn observe(&mut self, root: NodeId) {
        if !self.observed_roots.contains(&root) {
            self.observed_roots.push(root);
        }
    }

    pub(crate) fn observes(&self, root: NodeId) -> bool {
        self.observed_roots.contains(&root)
    }

    pub(crate) fn push(&mut self, record: MutationRecord) {
        if !record.is_empty() {
            self.pending.push(record);
        }
    }

    pub(crate) fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
