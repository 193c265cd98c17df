//! nodekit-graph: schema-less node entities and a fluent Cypher builder
//! over Neo4j.
//!
//! Every statement is compiled to parameterized Cypher: values travel as
//! `$p1, $p2, ...` parameters, and only validated identifiers (labels,
//! relationship types, property keys) are interpolated into the text.
//! Execution goes through a [`StoreGateway`], which is [`GraphClient`] in
//! production and a recording double in tests.

pub mod builder;
pub mod client;
pub mod cypher;
pub mod edge;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod hydrate;
pub mod model;
pub mod params;
pub mod persist;
pub mod record;
pub mod traversal;

#[cfg(test)]
mod testing;

pub use builder::NodeQuery;
pub use client::{BoxFuture, GraphClient, GraphConfig, TxnGateway};
pub use cypher::{validate_identifier, Operator, SortDirection};
pub use edge::EdgeWriter;
pub use entity::Entity;
pub use error::{GraphError, Result};
pub use gateway::{ColumnKind, Statement, StoreGateway};
pub use hydrate::hydrate;
pub use model::ModelSchema;
pub use params::{Bindings, ParameterAllocator};
pub use record::{Field, RawNode, RawRelationship, Record, RecordSet};
pub use traversal::{Direction, Traversal};
