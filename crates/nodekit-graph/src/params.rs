//! Placeholder allocation for values bound into a statement.

use nodekit_core::{Attributes, Value};

/// Hands out `p1`, `p2`, ... for one compiler instance.
#[derive(Debug, Clone, Default)]
pub struct ParameterAllocator {
    issued: u32,
}

impl ParameterAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> String {
        self.issued += 1;
        format!("p{}", self.issued)
    }
}

/// An allocator together with the values bound so far.
///
/// Every value that reaches statement text goes through [`Bindings::bind`],
/// so no two values in one statement can share a placeholder.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    allocator: ParameterAllocator,
    values: Attributes,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to a fresh placeholder and return its name (without `$`).
    pub fn bind(&mut self, value: impl Into<Value>) -> String {
        let name = self.allocator.next();
        self.values.insert(name.clone(), value.into());
        name
    }

    /// Bind under a fixed name such as `id` or `fromId`.
    ///
    /// Fixed names never start with `p` followed by digits, so they cannot
    /// clash with allocated ones.
    pub(crate) fn bind_named(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn values(&self) -> &Attributes {
        &self.values
    }

    pub fn into_values(self) -> Attributes {
        self.values
    }
}
