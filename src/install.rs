//! Installation strategy selection.
//!
//! Which parts of the polyfill a host needs depends on two facts: whether the
//! host already drives the custom element lifecycle, and whether element
//! constructors can be invoked as plain functions against an existing value.

use serde::{Deserialize, Serialize};

use crate::definition::ElementConstructor;
use crate::element::ConstructorKind;

/// What the host environment provides natively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    pub native_lifecycle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstallMode {
    /// The host drives the lifecycle and runs constructors itself.
    Native,
    /// Native lifecycle, but transpiled constructors need the trampoline.
    WrapperOnly,
    /// Full polyfill: registry, facade and tree patches.
    Full,
    /// Full polyfill plus the construction trampoline.
    FullWithTrampoline,
    /// Full polyfill until the first definition reveals the constructor kind.
    Deferred,
}

impl InstallMode {
    /// Picks the final mode once the first constructor is known.
    /// Modes other than `Deferred` are already final.
    pub fn resolve(self, kind: ConstructorKind, host: HostCapabilities) -> InstallMode {
        if self != InstallMode::Deferred {
            return self;
        }
        match (host.native_lifecycle, kind) {
            (true, ConstructorKind::Transpiled) => InstallMode::WrapperOnly,
            (_, ConstructorKind::Transpiled) => InstallMode::FullWithTrampoline,
            (_, ConstructorKind::Native) => InstallMode::Full,
        }
    }

    /// Whether the host is trusted to drive the lifecycle itself. The arena
    /// host emulates that facility with the same patched port, so this only
    /// affects reporting.
    pub fn host_lifecycle(self) -> bool {
        matches!(self, InstallMode::Native | InstallMode::WrapperOnly)
    }

    pub fn uses_trampoline(self) -> bool {
        matches!(
            self,
            InstallMode::WrapperOnly | InstallMode::FullWithTrampoline
        )
    }
}

pub fn select_install_mode(
    host: HostCapabilities,
    sample: Option<ConstructorKind>,
) -> InstallMode {
    match (host.native_lifecycle, sample) {
        (_, None) => InstallMode::Deferred,
        (true, Some(ConstructorKind::Native)) => InstallMode::Native,
        (true, Some(ConstructorKind::Transpiled)) => InstallMode::WrapperOnly,
        (false, Some(ConstructorKind::Native)) => InstallMode::Full,
        (false, Some(ConstructorKind::Transpiled)) => InstallMode::FullWithTrampoline,
    }
}

/// A constructor that can run as a plain function is a transpiled one.
pub fn probe_constructor_kind(constructor: &ElementConstructor) -> ConstructorKind {
    constructor.kind()
}
