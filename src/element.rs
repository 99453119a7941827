//! Custom element types and the context their code runs in.
//!
//! A custom element is any `'static` type implementing [`CustomElement`].
//! Its state lives on the node it is bound to; dispatch happens through the
//! node's binding tag instead of a prototype chain.

use std::any::Any;

use crate::dom::{Dom, NodeId};
use crate::error::ElementError;
use crate::patch::PatchedTree;
use crate::registry::Registry;

/// How an element type's constructor may be invoked.
///
/// `Transpiled` constructors can run as a plain function against an existing
/// value; `Native` ones can only run as a real construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstructorKind {
    Native,
    Transpiled,
}

/// An author-registered element type.
pub trait CustomElement: Any {
    /// The type's own initialization logic, run exactly once per node.
    ///
    /// `cx.node()` is the node being constructed: a freshly allocated bare
    /// element for `new`-style construction, or the pre-existing node for an
    /// upgrade. Base construction has already happened.
    fn construct(cx: &mut ElementContext<'_>) -> Result<Self, ElementError>
    where
        Self: Sized;

    fn constructor_kind() -> ConstructorKind
    where
        Self: Sized,
    {
        ConstructorKind::Native
    }

    fn connected_callback(&mut self, _cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
        Ok(())
    }

    fn disconnected_callback(&mut self, _cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
        Ok(())
    }
}

/// Object-safe view of a bound element, stored on its node.
pub(crate) trait ElementObject {
    fn connected(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ElementError>;
    fn disconnected(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ElementError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: CustomElement> ElementObject for T {
    fn connected(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
        self.connected_callback(cx)
    }

    fn disconnected(&mut self, cx: &mut ElementContext<'_>) -> Result<(), ElementError> {
        self.disconnected_callback(cx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Access handed to element code while it constructs or handles a hook.
///
/// [`ElementContext::dom`] is the unpatched host tree: mutations made through
/// it are reconciled on the next notification delivery. [`ElementContext::tree`]
/// goes through the patched port and reconciles before returning.
pub struct ElementContext<'a> {
    node: NodeId,
    dom: &'a mut Dom,
    registry: &'a mut Registry,
}

impl<'a> ElementContext<'a> {
    pub(crate) fn new(node: NodeId, dom: &'a mut Dom, registry: &'a mut Registry) -> Self {
        Self {
            node,
            dom,
            registry,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn dom(&mut self) -> &mut Dom {
        &mut *self.dom
    }

    pub fn dom_ref(&self) -> &Dom {
        &*self.dom
    }

    pub fn tree(&mut self) -> PatchedTree<'_> {
        PatchedTree::new(self.dom, self.registry)
    }

    pub fn local_name(&self) -> Option<&str> {
        self.dom.local_name(self.node)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.dom.attribute(self.node, name)
    }

    pub fn is_connected(&self) -> bool {
        self.dom.is_connected(self.node)
    }
}
