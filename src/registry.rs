//! # Registry Module
//!
//! The engine behind `customElements`: definitions, upgrades and lifecycle
//! dispatch for every observed tree.
//!
//! ## Key Invariants
//!
//! 1. **Upgrade Once**: a node is constructed at most once. Upgrading a node
//!    already bound to its definition's type is a no-op.
//! 2. **Real Transitions Only**: `connected_callback` and
//!    `disconnected_callback` fire only when the node's last delivered state
//!    differs, so synchronous patches and late notification batches never
//!    double-fire a hook.
//! 3. **Retroactivity**: defining a name upgrades and connects every matching
//!    node already present in any observed tree, in document order.
//! 4. **Isolation**: a constructor or hook failure on one node is reported
//!    and never stops processing of its siblings.
//! 5. **Inert Documents**: nodes owned by an inert document are never
//!    upgraded.

use crate::definition::{DefineOptions, Definition, DefinitionTable, ElementConstructor};
use crate::dom::{Binding, Dom, NodeId};
use crate::element::ElementContext;
use crate::error::{
    CallbackError, ConstructionError, Hook, RegistryError, UnsupportedExtension,
};
use crate::name::validate_name;
use crate::observer::{LifecycleStep, MutationBatchObserver};
use crate::query::LocalNameQuery;
use crate::trampoline;

#[derive(Debug)]
pub struct Registry {
    definitions: DefinitionTable,
    query: LocalNameQuery,
    observer: MutationBatchObserver,
    /// Every tree the registry watches; the document is always first.
    roots: Vec<NodeId>,
    reported: Vec<RegistryError>,
}

impl Registry {
    pub fn new(document: NodeId) -> Self {
        Self {
            definitions: DefinitionTable::new(),
            query: LocalNameQuery::default(),
            observer: MutationBatchObserver::new(),
            roots: vec![document],
            reported: Vec::new(),
        }
    }

    pub fn definitions(&self) -> &DefinitionTable {
        &self.definitions
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Definition> {
        self.definitions.get_by_name(name)
    }

    pub fn get_by_constructor(&self, constructor: &ElementConstructor) -> Option<&Definition> {
        self.definitions.get_by_constructor(constructor)
    }

    /// Selector of every defined name, in definition order.
    pub fn query(&self) -> &LocalNameQuery {
        &self.query
    }

    pub fn observer(&self) -> &MutationBatchObserver {
        &self.observer
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DEFINITION
    // ═══════════════════════════════════════════════════════════════════════════════

    pub fn define(
        &mut self,
        dom: &mut Dom,
        name: &str,
        constructor: ElementConstructor,
        options: &DefineOptions,
    ) -> Result<(), RegistryError> {
        if let Some(extends) = &options.extends {
            return Err(UnsupportedExtension {
                extends: extends.clone(),
            }
            .into());
        }
        validate_name(name)?;
        self.definitions.insert(name, constructor)?;
        self.query.push(name);
        self.observer.watch(dom, name, &self.roots);

        tracing::debug!(
            name,
            constructor = constructor.type_name(),
            "defined custom element"
        );

        let newly_defined = LocalNameQuery::single(name);
        for root in self.roots.clone() {
            self.upgrade(dom, root, Some(&newly_defined));
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // UPGRADES
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Upgrades matching descendants of `root` (not `root` itself).
    ///
    /// With `match_query` the names were just defined and every match is
    /// upgraded *and connected*; without it every defined name is upgraded
    /// but nothing is connected.
    pub fn upgrade(&mut self, dom: &mut Dom, root: NodeId, match_query: Option<&LocalNameQuery>) {
        let candidates = match match_query {
            Some(query) => dom.query_all(root, query),
            None => dom.query_all(root, &self.query),
        };
        for node in candidates {
            if match_query.is_some() {
                self.connected_callback(dom, node);
            } else {
                self.upgrade_self(dom, node);
            }
        }
    }

    /// Upgrades a single node if its local name is defined.
    pub fn upgrade_self(&mut self, dom: &mut Dom, node: NodeId) {
        if let Some(definition) = self.definition_for(dom, node) {
            self.upgrade_with(dom, node, &definition);
        }
    }

    fn definition_for(&self, dom: &Dom, node: NodeId) -> Option<Definition> {
        let name = dom.local_name(node)?;
        self.definitions.get_by_name(name).cloned()
    }

    /// Returns whether `node` ends up bound to `definition`'s type.
    fn upgrade_with(&mut self, dom: &mut Dom, node: NodeId, definition: &Definition) -> bool {
        let ty = definition.constructor.type_id();
        if dom.bound_type(node) == Some(ty) {
            return true;
        }
        if dom.is_inert(node) {
            return false;
        }
        match trampoline::adopt(self, dom, definition, node) {
            Ok(_) => {
                tracing::trace!(name = %definition.name, %node, "upgraded element");
                true
            }
            Err(err) => {
                self.report(err.into());
                false
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Upgrades `node` if needed, then delivers its connected hook unless the
    /// element already considers itself connected.
    pub fn connected_callback(&mut self, dom: &mut Dom, node: NodeId) {
        let Some(definition) = self.definition_for(dom, node) else {
            return;
        };
        if !self.upgrade_with(dom, node, &definition) {
            return;
        }
        self.transition(dom, node, &definition.name, Hook::Connected);
    }

    /// Delivers the disconnected hook of an upgraded, connected node.
    pub fn disconnected_callback(&mut self, dom: &mut Dom, node: NodeId) {
        let Some(name) = dom.local_name(node).map(str::to_string) else {
            return;
        };
        self.transition(dom, node, &name, Hook::Disconnected);
    }

    fn transition(&mut self, dom: &mut Dom, node: NodeId, name: &str, hook: Hook) {
        let target = hook == Hook::Connected;
        let element = match dom.binding_mut(node) {
            Some(Binding::Bound {
                element,
                connected,
                ..
            }) if *connected != target => {
                *connected = target;
                element.take()
            }
            _ => return,
        };
        // The element's own hook is already on the stack.
        let Some(mut element) = element else {
            return;
        };

        let result = {
            let mut cx = ElementContext::new(node, dom, self);
            match hook {
                Hook::Connected => element.connected(&mut cx),
                Hook::Disconnected => element.disconnected(&mut cx),
            }
        };

        if let Some(Binding::Bound { element: slot, .. }) = dom.binding_mut(node) {
            *slot = Some(element);
        }
        if let Err(source) = result {
            self.report(
                CallbackError {
                    hook,
                    name: name.to_string(),
                    node,
                    source,
                }
                .into(),
            );
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // OBSERVATION
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Adds `tree` to the observed trees (e.g. a new shadow root).
    pub fn observe(&mut self, dom: &mut Dom, tree: NodeId) {
        if !self.roots.contains(&tree) {
            self.roots.push(tree);
        }
        self.observer.observe(dom, tree);
    }

    /// Drains pending notifications and processes them immediately.
    pub fn sync(&mut self, dom: &mut Dom) {
        let records = self.observer.take_records(dom);
        if records.is_empty() {
            return;
        }
        for step in self.observer.plan(dom, &records) {
            match step {
                LifecycleStep::Connect(node) => self.connected_callback(dom, node),
                LifecycleStep::Disconnect(node) => self.disconnected_callback(dom, node),
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CONSTRUCTION
    // ═══════════════════════════════════════════════════════════════════════════════

    /// `new Ctor()`: allocates and constructs a fresh, detached element.
    pub fn construct(
        &mut self,
        dom: &mut Dom,
        constructor: &ElementConstructor,
    ) -> Result<NodeId, ConstructionError> {
        let definition = self
            .definitions
            .get_by_constructor(constructor)
            .cloned()
            .ok_or(ConstructionError::NotDefined {
                type_name: constructor.type_name(),
            })?;
        trampoline::allocate_or_adopt(self, dom, &definition, None)
    }

    /// `createElement`: constructs defined names, plain elements otherwise.
    ///
    /// A failing constructor is reported and the plain element returned.
    pub fn create_element(&mut self, dom: &mut Dom, local_name: &str) -> NodeId {
        let definition = self
            .definitions
            .get_by_name(&local_name.to_ascii_lowercase())
            .cloned();
        match definition {
            Some(definition) => {
                let node = trampoline::allocate(dom, &definition);
                if let Err(err) = trampoline::adopt(self, dom, &definition, node) {
                    self.report(err.into());
                }
                node
            }
            None => dom.create_element(local_name),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ERROR REPORTING
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Queues an error raised by element code for out-of-band delivery.
    pub fn report(&mut self, err: RegistryError) {
        tracing::warn!(error = %err, "custom element code failed");
        self.reported.push(err);
    }

    pub fn has_reported(&self) -> bool {
        !self.reported.is_empty()
    }

    pub fn take_reported(&mut self) -> Vec<RegistryError> {
        std::mem::take(&mut self.reported)
    }
}
