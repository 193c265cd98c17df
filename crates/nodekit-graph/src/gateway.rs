//! The seam through which every compiled statement reaches the store.

use async_trait::async_trait;
use nodekit_core::{Attributes, Value};
use serde::Serialize;

use crate::error::Result;
use crate::record::RecordSet;

/// How a returned column should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Node,
    Relationship,
    Integer,
    Value,
}

/// Statement text plus its bound parameters and expected result columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statement {
    pub text: String,
    pub parameters: Attributes,
    pub columns: Vec<(String, ColumnKind)>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_parameters(mut self, parameters: Attributes) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn returning(mut self, column: impl Into<String>, kind: ColumnKind) -> Self {
        self.columns.push((column.into(), kind));
        self
    }
}

/// Executes statements against a graph engine.
///
/// Implemented by the Neo4j client, by its transaction handle, and by test
/// doubles. Every compiler operation takes one explicitly.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Run one statement and collect its records.
    async fn run(&self, statement: Statement) -> Result<RecordSet>;

    /// A globally unique identity for a new entity.
    fn generate_identity(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Whether unsaved entities without an identity get one on insert.
    fn auto_identity(&self) -> bool {
        true
    }
}

