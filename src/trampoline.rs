//! Construction Trampoline
//!
//! Runs an element type's construction against a node that already exists.
//! The target node is handed over explicitly: a fresh construction allocates
//! a bare element first, an upgrade passes the parsed node. Either way the
//! type's own `construct` runs exactly once against that node and no second
//! node is ever allocated.

use crate::definition::Definition;
use crate::dom::{Binding, Dom, NodeId};
use crate::element::ElementContext;
use crate::error::ConstructionError;
use crate::registry::Registry;

/// Base construction for `new`-style creation: a bare, unbound element with
/// the definition's local name.
pub(crate) fn allocate(dom: &mut Dom, definition: &Definition) -> NodeId {
    dom.create_element(&definition.name)
}

/// Constructs `target`, or a freshly allocated node when `target` is `None`.
pub(crate) fn allocate_or_adopt(
    registry: &mut Registry,
    dom: &mut Dom,
    definition: &Definition,
    target: Option<NodeId>,
) -> Result<NodeId, ConstructionError> {
    let node = match target {
        Some(node) => node,
        None => allocate(dom, definition),
    };
    adopt(registry, dom, definition, node)
}

/// Binds `node` to `definition`'s type and runs the type's initialization.
///
/// Adopting a node already bound to the same type is a no-op.
pub(crate) fn adopt(
    registry: &mut Registry,
    dom: &mut Dom,
    definition: &Definition,
    node: NodeId,
) -> Result<NodeId, ConstructionError> {
    let ty = definition.constructor.type_id();
    let identity_error = || ConstructionError::ConstructorIdentity {
        name: definition.name.clone(),
        node,
    };

    match dom.binding(node) {
        Some(Binding::Bound { ty: bound, .. }) if *bound == ty => return Ok(node),
        Some(Binding::Unbound) => {}
        // Bound to another type, already under construction, or missing.
        _ => return Err(identity_error()),
    }
    if let Some(slot) = dom.binding_mut(node) {
        *slot = Binding::Constructing { ty };
    }

    let constructed = {
        let mut cx = ElementContext::new(node, dom, registry);
        definition.constructor.construct(&mut cx)
    };

    match constructed {
        Ok(element) => {
            let still_ours = matches!(dom.binding(node), Some(Binding::Constructing { ty: t }) if *t == ty);
            match dom.binding_mut(node) {
                Some(slot) if still_ours => {
                    *slot = Binding::Bound {
                        ty,
                        element: Some(element),
                        connected: false,
                    };
                    Ok(node)
                }
                _ => Err(identity_error()),
            }
        }
        Err(source) => {
            if let Some(slot) = dom.binding_mut(node) {
                *slot = Binding::Unbound;
            }
            Err(ConstructionError::Constructor {
                name: definition.name.clone(),
                source,
            })
        }
    }
}
