//! # Custom Element Registry
//!
//! A synchronous `customElements` registry over an arena-backed host tree.
//! Author types implementing [`CustomElement`] are bound to tree nodes by
//! local name; the registry constructs them, upgrades parser-made nodes in
//! place and delivers `connectedCallback` / `disconnectedCallback`.
//!
//! ## Lifecycle Invariants
//!
//! 1. **Valid Names**: only names matching the custom element grammar and
//!    outside the reserved list can be defined or waited on.
//!
//! 2. **One Definition Per Name And Type**: a name is defined at most once and
//!    an element type backs at most one name.
//!
//! 3. **Node Identity**: upgrading never replaces a node. The node the parser
//!    produced is the node the element type is bound to.
//!
//! 4. **Synchronous Reconciliation**: every mutation made through a patched
//!    [`TreeMutationPort`] returns with affected elements upgraded, connected
//!    and disconnected. Native mutations are reconciled when
//!    [`Window::run_microtasks`] delivers buffered notifications.
//!
//! 5. **Transitions, Not Calls**: a lifecycle hook fires only when the
//!    element's connected state actually changes.
//!
//! 6. **Isolation**: errors raised by element code are reported out of band
//!    and never abort the mutation or definition that triggered them.

mod config;
mod definition;
mod dom;
mod element;
mod error;
mod facade;
mod install;
mod markup;
mod mutation;
mod name;
mod observer;
mod patch;
mod query;
mod registry;
mod trampoline;
mod window;

#[cfg(test)]
mod window_tests;

pub use config::RegistryConfig;
pub use definition::{DefineOptions, Definition, DefinitionTable, ElementConstructor};
pub use dom::{Dom, NodeData, NodeId};
pub use element::{ConstructorKind, CustomElement, ElementContext};
pub use error::{
    CallbackError, ConfigError, ConstructionError, DomError, DuplicateError, ElementError, Hook,
    NameError, RegistryError, UnsupportedExtension,
};
pub use facade::{CustomElementRegistry, WhenDefined};
pub use install::{probe_constructor_kind, select_install_mode, HostCapabilities, InstallMode};
pub use mutation::MutationRecord;
pub use name::{is_valid_name, validate_name, RESERVED_NAMES};
pub use observer::{LifecycleStep, MutationBatchObserver};
pub use patch::{PatchedTree, TreeMutationPort};
pub use query::LocalNameQuery;
pub use registry::Registry;
pub use window::Window;
