//! # Host Tree Module
//!
//! An arena-backed element tree standing in for the host environment's DOM.
//! Everything here is the *native*, unpatched behavior: mutations never run
//! custom element code, they only buffer [`MutationRecord`]s for subscribed
//! trees.
//!
//! ## Key Invariants
//!
//! 1. **Stable Identity**: a [`NodeId`] is never reused or freed; upgrading a
//!    node changes its binding, never its id.
//! 2. **Independent Roots**: the document, every shadow root, detached
//!    fragments and inert template documents are separate trees. A node is
//!    *connected* iff its shadow-including root is the window's document.
//! 3. **Owner Documents**: every node belongs to exactly one document. Nodes
//!    inserted under a parent from another document are adopted.

use std::any::TypeId;
use std::fmt;

use crate::element::{CustomElement, ElementObject};
use crate::error::DomError;
use crate::markup;
use crate::mutation::{MutationLog, MutationRecord};
use crate::query::LocalNameQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document {
        /// Inert documents (template content owners) are never upgraded.
        inert: bool,
    },
    Fragment,
    ShadowRoot {
        host: NodeId,
    },
    Element {
        local_name: String,
        attrs: Vec<(String, String)>,
        shadow_root: Option<NodeId>,
        template_content: Option<NodeId>,
    },
    Text(String),
    Comment(String),
}

/// The node-to-type binding. The binding *is* the node's custom identity.
pub(crate) enum Binding {
    Unbound,
    Constructing {
        ty: TypeId,
    },
    Bound {
        ty: TypeId,
        /// Taken out while one of the element's own hooks is running.
        element: Option<Box<dyn ElementObject>>,
        connected: bool,
    },
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Unbound => write!(f, "Unbound"),
            Binding::Constructing { ty } => f.debug_struct("Constructing").field("ty", ty).finish(),
            Binding::Bound { ty, connected, .. } => f
                .debug_struct("Bound")
                .field("ty", ty)
                .field("connected", connected)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    owner: NodeId,
    data: NodeData,
    binding: Binding,
}

#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
    template_document: NodeId,
    mutations: MutationLog,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId(0),
            template_document: NodeId(1),
            mutations: MutationLog::default(),
        };
        let document = dom.alloc_document(false);
        let template_document = dom.alloc_document(true);
        dom.document = document;
        dom.template_document = template_document;
        dom
    }

    /// Builds a tree from a complete HTML document, as a parser would.
    ///
    /// Custom elements in the markup come out as plain, unbound elements.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        let mut dom = Self::new();
        let document = dom.document;
        markup::parse_document_into(&mut dom, document, html)?;
        Ok(dom)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ALLOCATION
    // ═══════════════════════════════════════════════════════════════════════════════

    fn alloc_document(&mut self, inert: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            owner: id,
            data: NodeData::Document { inert },
            binding: Binding::Unbound,
        });
        id
    }

    pub(crate) fn alloc(&mut self, owner: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            owner,
            data,
            binding: Binding::Unbound,
        });
        id
    }

    /// Appends without validation or mutation records; used while building
    /// detached trees.
    pub(crate) fn attach_raw(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub(crate) fn set_template_content(&mut self, template: NodeId, content: NodeId) {
        if let NodeData::Element {
            template_content, ..
        } = &mut self.nodes[template.0].data
        {
            *template_content = Some(content);
        }
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The inert document owning parsed `<template>` contents.
    pub fn template_document(&self) -> NodeId {
        self.template_document
    }

    /// Creates a new, empty inert document (e.g. for off-screen parsing).
    pub fn create_inert_document(&mut self) -> NodeId {
        self.alloc_document(true)
    }

    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        let document = self.document;
        self.create_element_in(document, local_name)
    }

    pub fn create_element_in(&mut self, owner: NodeId, local_name: &str) -> NodeId {
        let local_name = local_name.to_ascii_lowercase();
        let template_content = if local_name == "template" {
            let template_document = self.template_document;
            Some(self.alloc(template_document, NodeData::Fragment))
        } else {
            None
        };
        self.alloc(
            owner,
            NodeData::Element {
                local_name,
                attrs: Vec::new(),
                shadow_root: None,
                template_content,
            },
        )
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        let document = self.document;
        self.alloc(document, NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let document = self.document;
        self.alloc(document, NodeData::Comment(text.to_string()))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        let document = self.document;
        self.alloc(document, NodeData::Fragment)
    }

    /// Attaches a new, independently rooted shadow tree to `host`.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        let owner = self.node(host)?.owner;
        match &self.node(host)?.data {
            NodeData::Element {
                shadow_root: Some(_),
                ..
            } => return Err(DomError::ShadowRootExists(host)),
            NodeData::Element { .. } => {}
            _ => return Err(DomError::NotAnElement(host)),
        }
        let shadow = self.alloc(owner, NodeData::ShadowRoot { host });
        if let NodeData::Element { shadow_root, .. } = &mut self.nodes[host.0].data {
            *shadow_root = Some(shadow);
        }
        Ok(shadow)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // READ ACCESS
    // ═══════════════════════════════════════════════════════════════════════════════

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::InvalidNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).map(|n| &n.data)
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { local_name, .. } => Some(local_name.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.local_name(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).map(|n| n.owner)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        match self.data(host)? {
            NodeData::Element { shadow_root, .. } => *shadow_root,
            _ => None,
        }
    }

    pub fn template_content(&self, template: NodeId) -> Option<NodeId> {
        match self.data(template)? {
            NodeData::Element {
                template_content, ..
            } => *template_content,
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.data(id) {
            Some(NodeData::Element { attrs, .. }) => attrs.as_slice(),
            _ => &[],
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.node(id)?;
        match &mut self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => {
                let name = name.to_ascii_lowercase();
                match attrs.iter_mut().find(|(key, _)| *key == name) {
                    Some(slot) => slot.1 = value.to_string(),
                    None => attrs.push((name, value.to_string())),
                }
                Ok(())
            }
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Comment(_)) | None => {}
            Some(_) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// The topmost ancestor of `id` (itself when detached and childless).
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut cursor = id;
        while let Some(parent) = self.parent(cursor) {
            cursor = parent;
        }
        cursor
    }

    /// Like [`Dom::tree_root`], but continues from the host of every shadow
    /// root on the way up.
    pub fn shadow_including_root(&self, id: NodeId) -> NodeId {
        let mut root = self.tree_root(id);
        while let Some(NodeData::ShadowRoot { host }) = self.data(root) {
            root = self.tree_root(*host);
        }
        root
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.shadow_including_root(id) == self.document
    }

    /// Whether `ancestor` is `id` or one of its ancestors, crossing from
    /// shadow roots to their hosts.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == ancestor {
                return true;
            }
            cursor = match (self.parent(node), self.data(node)) {
                (Some(parent), _) => Some(parent),
                (None, Some(NodeData::ShadowRoot { host })) => Some(*host),
                (None, _) => None,
            };
        }
        false
    }

    pub fn is_inert(&self, id: NodeId) -> bool {
        let owner = match self.owner_document(id) {
            Some(owner) => owner,
            None => return false,
        };
        matches!(self.data(owner), Some(NodeData::Document { inert: true }))
    }

    /// All element descendants of `root` (excluding `root`) whose local name
    /// is in `query`, in document order. Shadow trees and template contents
    /// are not traversed.
    pub fn query_all(&self, root: NodeId, query: &LocalNameQuery) -> Vec<NodeId> {
        let mut matches = Vec::new();
        if query.is_empty() || !self.contains(root) {
            return matches;
        }
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if let Some(name) = self.local_name(node) {
                if query.contains(name) {
                    matches.push(node);
                }
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        matches
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        markup::serialize_children(self, id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        markup::serialize_node(self, id)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // BINDINGS
    // ═══════════════════════════════════════════════════════════════════════════════

    pub(crate) fn binding(&self, id: NodeId) -> Option<&Binding> {
        self.nodes.get(id.0).map(|n| &n.binding)
    }

    pub(crate) fn binding_mut(&mut self, id: NodeId) -> Option<&mut Binding> {
        self.nodes.get_mut(id.0).map(|n| &mut n.binding)
    }

    /// The element type `id` has been upgraded to, if any.
    pub fn bound_type(&self, id: NodeId) -> Option<TypeId> {
        match self.binding(id)? {
            Binding::Bound { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    pub fn is_upgraded(&self, id: NodeId) -> bool {
        self.bound_type(id).is_some()
    }

    /// `instanceof` for custom element types.
    pub fn is_instance<T: CustomElement>(&self, id: NodeId) -> bool {
        self.bound_type(id) == Some(TypeId::of::<T>())
    }

    /// Whether the registry considers `id` connected (last lifecycle
    /// transition delivered to the element).
    pub fn is_marked_connected(&self, id: NodeId) -> bool {
        matches!(
            self.binding(id),
            Some(Binding::Bound {
                connected: true,
                ..
            })
        )
    }

    pub fn element<T: CustomElement>(&self, id: NodeId) -> Option<&T> {
        match self.binding(id)? {
            Binding::Bound {
                element: Some(element),
                ..
            } => element.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn element_mut<T: CustomElement>(&mut self, id: NodeId) -> Option<&mut T> {
        match self.binding_mut(id)? {
            Binding::Bound {
                element: Some(element),
                ..
            } => element.as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // MUTATION NOTIFICATIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Subscribes the tree rooted at `root` for child-list notifications.
    pub fn observe_subtree(&mut self, root: NodeId) {
        self.mutations.observe(root);
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.mutations.take_records()
    }

    pub fn has_pending_records(&self) -> bool {
        self.mutations.has_pending()
    }

    fn record(&mut self, target: NodeId, added_nodes: Vec<NodeId>, removed_nodes: Vec<NodeId>) {
        if self.mutations.observes(self.tree_root(target)) {
            self.mutations.push(MutationRecord {
                target,
                added_nodes,
                removed_nodes,
            });
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // NATIVE MUTATION PRIMITIVES
    // ═══════════════════════════════════════════════════════════════════════════════

    fn can_have_children(&self, id: NodeId) -> bool {
        matches!(
            self.data(id),
            Some(
                NodeData::Document { .. }
                    | NodeData::Fragment
                    | NodeData::ShadowRoot { .. }
                    | NodeData::Element { .. }
            )
        )
    }

    fn ensure_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        self.node(child)?;
        if !self.can_have_children(parent) {
            return Err(DomError::CannotHaveChildren(parent));
        }
        if matches!(
            self.data(child),
            Some(NodeData::Document { .. } | NodeData::ShadowRoot { .. })
        ) || self.is_inclusive_ancestor(child, parent)
        {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|id| *id != child);
            self.record(parent, Vec::new(), vec![child]);
        }
    }

    fn adopt_subtree(&mut self, id: NodeId, owner: NodeId) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            self.nodes[node.0].owner = owner;
            stack.extend(self.nodes[node.0].children.iter().copied());
        }
    }

    /// Takes the nodes that `child` contributes to an insertion: a fragment
    /// hands over its children, anything else is moved as itself.
    fn take_insertion_nodes(&mut self, child: NodeId) -> Vec<NodeId> {
        if matches!(self.nodes[child.0].data, NodeData::Fragment) {
            let moved = std::mem::take(&mut self.nodes[child.0].children);
            for node in &moved {
                self.nodes[node.0].parent = None;
            }
            self.record(child, Vec::new(), moved.clone());
            moved
        } else {
            self.detach(child);
            vec![child]
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.insert_before(parent, child, None)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.ensure_insertable(parent, child)?;
        let mut reference = reference;
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
            if r == child {
                reference = self.next_sibling(child);
            }
        }

        let moved = self.take_insertion_nodes(child);
        let owner = self.nodes[parent.0].owner;
        let index = match reference {
            Some(r) => self.nodes[parent.0]
                .children
                .iter()
                .position(|id| *id == r)
                .unwrap_or(self.nodes[parent.0].children.len()),
            None => self.nodes[parent.0].children.len(),
        };
        for (offset, node) in moved.iter().enumerate() {
            self.nodes[node.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(index + offset, *node);
            self.adopt_subtree(*node, owner);
        }
        self.record(parent, moved, Vec::new());
        Ok(child)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.node(parent)?;
        self.node(child)?;
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(child)
    }

    /// Replaces `old_child` with `new_child`, returning `old_child`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeId, DomError> {
        self.ensure_insertable(parent, new_child)?;
        if self.parent(old_child) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: old_child,
            });
        }
        if new_child == old_child {
            return Ok(old_child);
        }

        let moved = self.take_insertion_nodes(new_child);
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == old_child)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.remove(index);
        self.nodes[old_child.0].parent = None;

        let owner = self.nodes[parent.0].owner;
        for (offset, node) in moved.iter().enumerate() {
            self.nodes[node.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(index + offset, *node);
            self.adopt_subtree(*node, owner);
        }
        self.record(parent, moved, vec![old_child]);
        Ok(old_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|s| *s == id)?;
        siblings.get(index + 1).copied()
    }

    /// Copies `id` (and its subtree when `deep`) into its own document.
    ///
    /// Clones are always unbound; custom identity is never copied.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let owner = self.node(id)?.owner;
        self.clone_into(id, owner, deep)
    }

    /// Copies `id` into this tree's main document.
    pub fn import_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let document = self.document;
        self.clone_into(id, document, deep)
    }

    fn clone_into(&mut self, id: NodeId, owner: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let data = match &self.node(id)?.data {
            NodeData::Document { .. } | NodeData::ShadowRoot { .. } => {
                return Err(DomError::HierarchyRequest {
                    parent: owner,
                    child: id,
                })
            }
            NodeData::Fragment => NodeData::Fragment,
            NodeData::Text(text) => NodeData::Text(text.clone()),
            NodeData::Comment(text) => NodeData::Comment(text.clone()),
            NodeData::Element {
                local_name, attrs, ..
            } => NodeData::Element {
                local_name: local_name.clone(),
                attrs: attrs.clone(),
                shadow_root: None,
                template_content: None,
            },
        };
        let copy = self.alloc(owner, data);

        if let Some(content) = self.template_content(id) {
            let template_document = self.template_document;
            let content_copy = if deep {
                self.clone_into(content, template_document, true)?
            } else {
                self.alloc(template_document, NodeData::Fragment)
            };
            if let NodeData::Element {
                template_content, ..
            } = &mut self.nodes[copy.0].data
            {
                *template_content = Some(content_copy);
            }
        }

        if deep {
            let children = self.nodes[id.0].children.clone();
            for child in children {
                let child_copy = self.clone_into(child, owner, true)?;
                self.attach_raw(copy, child_copy);
            }
        }
        Ok(copy)
    }

    /// Replaces the children of `id` with the nodes parsed from `html`.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), DomError> {
        self.node(id)?;
        if !self.can_have_children(id) {
            return Err(DomError::CannotHaveChildren(id));
        }
        let owner = match self.nodes[id.0].data {
            NodeData::Document { .. } => id,
            _ => self.nodes[id.0].owner,
        };
        let parsed = markup::parse_fragment_nodes(self, owner, html)?;

        let removed = std::mem::take(&mut self.nodes[id.0].children);
        for node in &removed {
            self.nodes[node.0].parent = None;
        }
        for node in &parsed {
            self.attach_raw(id, *node);
        }
        self.record(id, parsed, removed);
        Ok(())
    }
}
