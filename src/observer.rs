//! Mutation Batch Observer
//!
//! The registry's single subscription to the host's batch mutation
//! notifications. It is started lazily by the first definition and from then
//! on watches every observed tree.
//!
//! The host only reports the top-level nodes of an insertion or removal, so
//! each reported node's matching descendants are discovered here. They are
//! captured *before* any element code runs: upgrading the reported node can
//! itself mutate its subtree.

use crate::dom::{Dom, NodeId};
use crate::mutation::MutationRecord;
use crate::query::LocalNameQuery;

/// One lifecycle transition to deliver, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    Connect(NodeId),
    Disconnect(NodeId),
}

#[derive(Debug, Default)]
pub struct MutationBatchObserver {
    started: bool,
    selector: LocalNameQuery,
    subscribed: Vec<NodeId>,
}

impl MutationBatchObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The selector of every name being watched.
    pub fn selector(&self) -> &LocalNameQuery {
        &self.selector
    }

    pub fn subscribed(&self) -> &[NodeId] {
        &self.subscribed
    }

    /// Adds `name` to the watch selector. The first call starts observing
    /// every tree in `roots`; returns whether this call started the observer.
    pub fn watch(&mut self, dom: &mut Dom, name: &str, roots: &[NodeId]) -> bool {
        self.selector.push(name);
        if self.started {
            return false;
        }

        self.started = true;
        for root in roots {
            self.subscribe(dom, *root);
        }
        tracing::debug!(
            trees = roots.len(),
            first = name,
            "started custom element mutation observer"
        );
        true
    }

    /// Begins watching `root` if the observer has started.
    pub fn observe(&mut self, dom: &mut Dom, root: NodeId) {
        if self.started {
            self.subscribe(dom, root);
        }
    }

    fn subscribe(&mut self, dom: &mut Dom, root: NodeId) {
        if !self.subscribed.contains(&root) {
            dom.observe_subtree(root);
            self.subscribed.push(root);
        }
    }

    /// Drains the host's buffered records. Nothing is buffered before start.
    pub fn take_records(&self, dom: &mut Dom) -> Vec<MutationRecord> {
        if self.started {
            dom.take_records()
        } else {
            Vec::new()
        }
    }

    /// Orders the lifecycle transitions a batch of records implies.
    ///
    /// For every added node: its matching descendants are captured, then the
    /// node is connected, then the captured descendants in document order.
    /// Removed nodes mirror this with disconnects.
    pub fn plan(&self, dom: &Dom, records: &[MutationRecord]) -> Vec<LifecycleStep> {
        let mut steps = Vec::new();
        for record in records {
            for node in &record.added_nodes {
                let candidates = dom.query_all(*node, &self.selector);
                steps.push(LifecycleStep::Connect(*node));
                steps.extend(candidates.into_iter().map(LifecycleStep::Connect));
            }
            for node in &record.removed_nodes {
                let candidates = dom.query_all(*node, &self.selector);
                steps.push(LifecycleStep::Disconnect(*node));
                steps.extend(candidates.into_iter().map(LifecycleStep::Disconnect));
            }
        }
        tracing::trace!(
            records = records.len(),
            steps = steps.len(),
            "planned mutation batch"
        );
        steps
    }
}
