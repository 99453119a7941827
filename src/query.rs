//! Local-name selectors.
//!
//! The registry only ever needs "element whose local name is one of these",
//! rendered as a selector list like `x-foo,x-bar`.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalNameQuery {
    names: Vec<String>,
}

impl LocalNameQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: &str) -> Self {
        Self {
            names: vec![name.to_string()],
        }
    }

    /// Parses a comma separated selector list of local names.
    pub fn parse(selector: &str) -> Self {
        let mut query = Self::new();
        for name in selector.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            query.push(name);
        }
        query
    }

    /// Adds `name`. The query only grows; duplicates are ignored.
    pub fn push(&mut self, name: &str) {
        if !self.contains(name) {
            self.names.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Display for LocalNameQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(","))
    }
}
