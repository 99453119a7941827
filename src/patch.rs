//! Tree Mutation Patcher
//!
//! [`TreeMutationPort`] is the seam between callers and the host's tree
//! primitives. [`Dom`] implements it natively; [`PatchedTree`] decorates the
//! native implementation so that every operation finishes with the registry
//! reconciled: affected custom elements are upgraded, connected or
//! disconnected before the call returns.

use crate::dom::{Dom, NodeId};
use crate::error::DomError;
use crate::registry::Registry;

/// The tree operations that can change which custom elements exist or are
/// connected.
pub trait TreeMutationPort {
    fn create_element(&mut self, local_name: &str) -> NodeId;

    fn import_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError>;

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError>;

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError>;

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeId, DomError>;

    fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), DomError>;

    fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError>;
}

impl TreeMutationPort for Dom {
    fn create_element(&mut self, local_name: &str) -> NodeId {
        Dom::create_element(self, local_name)
    }

    fn import_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        Dom::import_node(self, node, deep)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        Dom::clone_node(self, node, deep)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        Dom::append_child(self, parent, child)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        Dom::insert_before(self, parent, child, reference)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        Dom::remove_child(self, parent, child)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeId, DomError> {
        Dom::replace_child(self, parent, new_child, old_child)
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), DomError> {
        Dom::set_inner_html(self, node, html)
    }

    fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        Dom::attach_shadow(self, host)
    }
}

/// The host tree with the registry's patches installed.
pub struct PatchedTree<'a> {
    dom: &'a mut Dom,
    registry: &'a mut Registry,
}

impl<'a> PatchedTree<'a> {
    pub(crate) fn new(dom: &'a mut Dom, registry: &'a mut Registry) -> Self {
        Self { dom, registry }
    }

    pub fn dom(&self) -> &Dom {
        &*self.dom
    }

    /// Upgrades `node` and its subtree when it belongs to the main document.
    fn upgrade_subtree(&mut self, node: NodeId) {
        if self.dom.owner_document(node) != Some(self.dom.document()) {
            return;
        }
        self.registry.upgrade_self(self.dom, node);
        self.registry.upgrade(self.dom, node, None);
    }

    fn finish<T>(&mut self, result: Result<T, DomError>) -> Result<T, DomError> {
        let value = result?;
        self.registry.sync(self.dom);
        Ok(value)
    }
}

impl TreeMutationPort for PatchedTree<'_> {
    fn create_element(&mut self, local_name: &str) -> NodeId {
        self.registry.create_element(self.dom, local_name)
    }

    fn import_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let imported = self.dom.import_node(node, deep)?;
        self.upgrade_subtree(imported);
        self.finish(Ok(imported))
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let copy = self.dom.clone_node(node, deep)?;
        self.upgrade_subtree(copy);
        self.finish(Ok(copy))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        let result = self.dom.append_child(parent, child);
        self.finish(result)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        let result = self.dom.insert_before(parent, child, reference);
        self.finish(result)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        let result = self.dom.remove_child(parent, child);
        self.finish(result)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeId, DomError> {
        let result = self.dom.replace_child(parent, new_child, old_child);
        self.finish(result)
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), DomError> {
        self.dom.set_inner_html(node, html)?;
        self.registry.upgrade(self.dom, node, None);
        self.finish(Ok(()))
    }

    /// New shadow roots join the registry's observed trees.
    fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        let shadow = self.dom.attach_shadow(host)?;
        self.registry.observe(self.dom, shadow);
        Ok(shadow)
    }
}
