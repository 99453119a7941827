//! Custom element definitions.

use std::any::{type_name, TypeId};
use std::fmt;

use crate::element::{ConstructorKind, CustomElement, ElementContext, ElementObject};
use crate::error::{DuplicateError, ElementError};

type ConstructFn = fn(&mut ElementContext<'_>) -> Result<Box<dyn ElementObject>, ElementError>;

/// A type-erased handle to a [`CustomElement`] type's constructor.
///
/// Two handles are equal iff they construct the same element type.
#[derive(Clone, Copy)]
pub struct ElementConstructor {
    type_id: TypeId,
    type_name: &'static str,
    kind: ConstructorKind,
    construct: ConstructFn,
}

impl ElementConstructor {
    pub fn of<T: CustomElement>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            kind: T::constructor_kind(),
            construct: construct_boxed::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> ConstructorKind {
        self.kind
    }

    pub(crate) fn construct(
        &self,
        cx: &mut ElementContext<'_>,
    ) -> Result<Box<dyn ElementObject>, ElementError> {
        (self.construct)(cx)
    }
}

fn construct_boxed<T: CustomElement>(
    cx: &mut ElementContext<'_>,
) -> Result<Box<dyn ElementObject>, ElementError> {
    let element = T::construct(cx)?;
    Ok(Box::new(element))
}

impl PartialEq for ElementConstructor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ElementConstructor {}

impl fmt::Debug for ElementConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementConstructor")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Options accepted by `define`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefineOptions {
    /// Customized built-in elements; always rejected.
    pub extends: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub constructor: ElementConstructor,
}

/// Name → definition mapping with constructor-identity reverse lookup.
#[derive(Debug, Default)]
pub struct DefinitionTable {
    definitions: Vec<Definition>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: &str,
        constructor: ElementConstructor,
    ) -> Result<(), DuplicateError> {
        if self.get_by_name(name).is_some() {
            return Err(DuplicateError::Name {
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.get_by_constructor(&constructor) {
            return Err(DuplicateError::Constructor {
                type_name: constructor.type_name(),
                existing: existing.name.clone(),
            });
        }
        self.definitions.push(Definition {
            name: name.to_string(),
            constructor,
        });
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Linear scan; definition counts stay in the tens to low hundreds.
    pub fn get_by_constructor(&self, constructor: &ElementConstructor) -> Option<&Definition> {
        self.definitions
            .iter()
            .find(|d| d.constructor == *constructor)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }
}
