//! The author-facing `customElements` object.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::definition::{DefineOptions, ElementConstructor};
use crate::dom::{Dom, NodeId};
use crate::error::{NameError, RegistryError};
use crate::name::validate_name;
use crate::registry::Registry;

#[derive(Debug)]
pub struct CustomElementRegistry {
    registry: Registry,
    /// Waiters per name not yet defined; resolved and dropped by `define`.
    pending: HashMap<String, Vec<oneshot::Sender<()>>>,
}

impl CustomElementRegistry {
    pub fn new(document: NodeId) -> Self {
        Self {
            registry: Registry::new(document),
            pending: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn define(
        &mut self,
        dom: &mut Dom,
        name: &str,
        constructor: ElementConstructor,
        options: &DefineOptions,
    ) -> Result<(), RegistryError> {
        self.registry.define(dom, name, constructor, options)?;
        if let Some(waiters) = self.pending.remove(name) {
            tracing::debug!(name, waiters = waiters.len(), "resolving whenDefined");
            for waiter in waiters {
                // A dropped receiver just means nobody is waiting any more.
                let _ = waiter.send(());
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<ElementConstructor> {
        self.registry.get_by_name(name).map(|d| d.constructor)
    }

    /// Resolves once `name` is defined; immediately if it already is.
    pub fn when_defined(&mut self, name: &str) -> Result<WhenDefined, NameError> {
        validate_name(name)?;
        if self.registry.get_by_name(name).is_some() {
            return Ok(WhenDefined { waiter: None });
        }
        let (sender, receiver) = oneshot::channel();
        self.pending.entry(name.to_string()).or_default().push(sender);
        Ok(WhenDefined {
            waiter: Some(receiver),
        })
    }

    /// Upgrades every defined descendant of `root` without connecting it.
    pub fn upgrade(&mut self, dom: &mut Dom, root: NodeId) {
        self.registry.upgrade(dom, root, None);
    }
}

/// Future returned by [`CustomElementRegistry::when_defined`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct WhenDefined {
    waiter: Option<oneshot::Receiver<()>>,
}

impl WhenDefined {
    pub fn is_resolved(&self) -> bool {
        self.waiter.is_none()
    }
}

impl Future for WhenDefined {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let Some(waiter) = self.waiter.as_mut() else {
            return Poll::Ready(());
        };
        match Pin::new(waiter).poll(cx) {
            Poll::Ready(Ok(())) => {
                self.waiter = None;
                Poll::Ready(())
            }
            // The registry went away without defining the name: never resolves.
            Poll::Ready(Err(oneshot::Canceled)) | Poll::Pending => Poll::Pending,
        }
    }
}
