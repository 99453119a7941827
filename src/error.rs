//! Error taxonomy for the registry.
//!
//! Errors caused directly by the caller's own input (a bad name, a duplicate
//! definition, an unsupported `extends` option) propagate synchronously.
//! Errors raised by third-party element code (constructors and lifecycle
//! hooks) are isolated: the registry reports them out of band and keeps
//! processing sibling nodes.

use crate::dom::NodeId;

/// A custom element name that is malformed or reserved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid custom element name \"{name}\"")]
pub struct NameError {
    pub name: String,
}

/// A definition that collides with an existing one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuplicateError {
    #[error("duplicate definition \"{name}\"")]
    Name { name: String },
    #[error("constructor {type_name} is already registered as \"{existing}\"")]
    Constructor {
        type_name: &'static str,
        existing: String,
    },
}

/// `extends` was requested; customized built-in elements are not supported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("extending native element \"{extends}\" is not supported")]
pub struct UnsupportedExtension {
    pub extends: String,
}

/// Failure raised by element code itself (constructor or lifecycle hook).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ElementError {
    message: String,
}

impl ElementError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failures while running the construction trampoline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// The constructor did not produce the node it was handed.
    #[error("constructor for \"{name}\" illegally produced a different instance for {node}")]
    ConstructorIdentity { name: String, node: NodeId },
    /// The element type's own initialization failed.
    #[error("constructor for \"{name}\" failed: {source}")]
    Constructor {
        name: String,
        #[source]
        source: ElementError,
    },
    /// `construct::<T>()` was called for a type that was never defined.
    #[error("illegal constructor: {type_name} is not a defined custom element")]
    NotDefined { type_name: &'static str },
}

/// Which lifecycle hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Connected,
    Disconnected,
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hook::Connected => write!(f, "connectedCallback"),
            Hook::Disconnected => write!(f, "disconnectedCallback"),
        }
    }
}

/// A lifecycle hook threw.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{hook} of \"{name}\" ({node}) failed: {source}")]
pub struct CallbackError {
    pub hook: Hook,
    pub name: String,
    pub node: NodeId,
    #[source]
    pub source: ElementError,
}

/// Misuse of the host tree primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("{0} does not exist")]
    InvalidNode(NodeId),
    #[error("{0} is not an element")]
    NotAnElement(NodeId),
    #[error("{0} cannot have children")]
    CannotHaveChildren(NodeId),
    #[error("inserting {child} into {parent} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("{0} already hosts a shadow root")]
    ShadowRootExists(NodeId),
    #[error("html parse error: {0}")]
    Markup(String),
}

/// Errors surfaced by the public registry facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Duplicate(#[from] DuplicateError),
    #[error(transparent)]
    UnsupportedExtension(#[from] UnsupportedExtension),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Callback(#[from] CallbackError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid registry config: {0}")]
    Json(#[from] serde_json::Error),
}
