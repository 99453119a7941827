//! # Window Module
//!
//! One `Window` is one program instance: the host tree, the
//! `customElements` registry installed on it, the chosen install mode and
//! the queue of errors element code raised out of band.
//!
//! ## Key Invariants
//!
//! 1. **Single Registry**: every definition made through a window lives as
//!    long as the window and applies to its document and every shadow root
//!    attached through it.
//! 2. **Reconciled Port**: in every install mode, each mutation made
//!    through the window's [`TreeMutationPort`] returns with the registry
//!    reconciled. Mutations made through [`Window::dom_mut`] are native and
//!    reconciled by [`Window::run_microtasks`].

use crate::config::RegistryConfig;
use crate::definition::{DefineOptions, ElementConstructor};
use crate::dom::{Dom, NodeId};
use crate::element::CustomElement;
use crate::error::{DomError, NameError, RegistryError};
use crate::facade::{CustomElementRegistry, WhenDefined};
use crate::install::{probe_constructor_kind, select_install_mode, InstallMode};
use crate::patch::{PatchedTree, TreeMutationPort};

#[derive(Debug)]
pub struct Window {
    dom: Dom,
    custom_elements: CustomElementRegistry,
    config: RegistryConfig,
    install_mode: InstallMode,
    uncaught: Vec<RegistryError>,
}

impl Window {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_dom(config, Dom::new())
    }

    /// A window whose document was materialized by the HTML parser.
    pub fn parse(config: RegistryConfig, html: &str) -> Result<Self, DomError> {
        Ok(Self::with_dom(config, Dom::parse(html)?))
    }

    pub fn with_dom(config: RegistryConfig, dom: Dom) -> Self {
        let install_mode = select_install_mode(config.host(), config.sample_constructor);
        tracing::debug!(
            ?install_mode,
            host_lifecycle = install_mode.host_lifecycle(),
            trampoline = install_mode.uses_trampoline(),
            "installing custom elements"
        );
        let custom_elements = CustomElementRegistry::new(dom.document());
        Self {
            dom,
            custom_elements,
            config,
            install_mode,
            uncaught: Vec::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn install_mode(&self) -> InstallMode {
        self.install_mode
    }

    pub fn document(&self) -> NodeId {
        self.dom.document()
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// The host tree without patches.
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    /// The host tree with patches, regardless of install mode.
    pub fn tree(&mut self) -> PatchedTree<'_> {
        PatchedTree::new(&mut self.dom, self.custom_elements.registry_mut())
    }

    pub fn custom_elements(&self) -> &CustomElementRegistry {
        &self.custom_elements
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // customElements
    // ═══════════════════════════════════════════════════════════════════════════════

    pub fn define<T: CustomElement>(&mut self, name: &str) -> Result<(), RegistryError> {
        self.define_with(name, ElementConstructor::of::<T>(), DefineOptions::default())
    }

    pub fn define_with(
        &mut self,
        name: &str,
        constructor: ElementConstructor,
        options: DefineOptions,
    ) -> Result<(), RegistryError> {
        if self.install_mode == InstallMode::Deferred {
            let kind = probe_constructor_kind(&constructor);
            self.install_mode = self.install_mode.resolve(kind, self.config.host());
            tracing::debug!(
                install_mode = ?self.install_mode,
                ?kind,
                trampoline = self.install_mode.uses_trampoline(),
                "resolved deferred install"
            );
        }
        self.custom_elements
            .define(&mut self.dom, name, constructor, &options)
    }

    pub fn get(&self, name: &str) -> Option<ElementConstructor> {
        self.custom_elements.get(name)
    }

    pub fn when_defined(&mut self, name: &str) -> Result<WhenDefined, NameError> {
        self.custom_elements.when_defined(name)
    }

    pub fn upgrade(&mut self, root: NodeId) {
        self.custom_elements.upgrade(&mut self.dom, root);
    }

    /// Adds an independently rooted tree to the observed set.
    pub fn observe(&mut self, tree: NodeId) {
        self.custom_elements
            .registry_mut()
            .observe(&mut self.dom, tree);
    }

    /// Processes pending notifications now instead of at the next microtask.
    pub fn sync(&mut self) {
        self.custom_elements.registry_mut().sync(&mut self.dom);
    }

    /// `new T()`: a fresh, detached element of a defined type.
    pub fn construct<T: CustomElement>(&mut self) -> Result<NodeId, RegistryError> {
        let constructor = ElementConstructor::of::<T>();
        Ok(self
            .custom_elements
            .registry_mut()
            .construct(&mut self.dom, &constructor)?)
    }

    pub fn element<T: CustomElement>(&self, node: NodeId) -> Option<&T> {
        self.dom.element::<T>(node)
    }

    pub fn element_mut<T: CustomElement>(&mut self, node: NodeId) -> Option<&mut T> {
        self.dom.element_mut::<T>(node)
    }

    pub fn is_instance<T: CustomElement>(&self, node: NodeId) -> bool {
        self.dom.is_instance::<T>(node)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // EVENT LOOP
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Runs the microtask checkpoint: delivers buffered mutation
    /// notifications, then surfaces errors element code raised.
    pub fn run_microtasks(&mut self) {
        if self.dom.has_pending_records() {
            self.sync();
        }
        for err in self.custom_elements.registry_mut().take_reported() {
            tracing::error!(error = %err, "uncaught error in custom element code");
            self.uncaught.push(err);
        }
    }

    pub fn take_uncaught_errors(&mut self) -> Vec<RegistryError> {
        std::mem::take(&mut self.uncaught)
    }
}

/// Page code's view of the tree. Every install mode reconciles through the
/// patched port: host-native modes are emulated by the same machinery.
impl TreeMutationPort for Window {
    fn create_element(&mut self, local_name: &str) -> NodeId {
        self.tree().create_element(local_name)
    }

    fn import_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        self.tree().import_node(node, deep)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        self.tree().clone_node(node, deep)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.tree().append_child(parent, child)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.tree().insert_before(parent, child, reference)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.tree().remove_child(parent, child)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeId, DomError> {
        self.tree().replace_child(parent, new_child, old_child)
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), DomError> {
        self.tree().set_inner_html(node, html)
    }

    fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        self.tree().attach_shadow(host)
    }
}
