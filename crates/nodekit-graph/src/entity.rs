//! In-memory representation of one graph node.

use nodekit_core::{Attributes, Value};
use serde::Serialize;

/// Property name the identity is stored under in the graph.
pub const IDENTITY_KEY: &str = "id";

/// One graph node: identity, labels, attributes, and whether it has been
/// persisted.
///
/// The identity never lives in the attribute map; it is threaded into
/// statements separately under [`IDENTITY_KEY`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Entity {
    identity: Option<String>,
    labels: Vec<String>,
    attributes: Attributes,
    persisted: bool,
}

impl Entity {
    /// Build an unsaved entity. A string `id` attribute becomes the identity.
    pub fn new<I, S>(labels: I, attributes: Attributes) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entity = Self::default();
        for label in labels {
            entity.add_label(label);
        }
        for (key, value) in attributes {
            entity.set(key, value);
        }
        entity
    }

    /// Entity read back from the store.
    pub(crate) fn from_store(labels: Vec<String>, attributes: Attributes) -> Self {
        let mut entity = Self::new(labels, attributes);
        entity.persisted = true;
        entity
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn set_identity(&mut self, identity: impl Into<String>) -> &mut Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Append a label unless already present.
    pub fn add_label(&mut self, label: impl Into<String>) -> &mut Self {
        let label = label.into();
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Set an attribute. Setting `id` to a string sets the identity instead;
    /// `id` is never stored as an attribute.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if key == IDENTITY_KEY {
            match value {
                Value::String(id) => self.identity = Some(id),
                Value::Integer(id) => self.identity = Some(id.to_string()),
                _ => {}
            }
        } else {
            self.attributes.insert(key, value);
        }
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.shift_remove(key)
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(crate) fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }

    /// Attributes plus `id` (when known) and `labels`, as one map.
    pub fn to_value(&self) -> Value {
        let mut map = self.attributes.clone();
        if let Some(id) = &self.identity {
            map.insert(IDENTITY_KEY.to_string(), Value::from(id));
        }
        map.insert("labels".to_string(), Value::from(self.labels.clone()));
        Value::Map(map)
    }
}
