//! Error types for the nodekit-graph crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    /// Anything the store rejected. Propagated unchanged, never retried.
    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Refusing to {operation} without a where condition")]
    UnsafeMutation { operation: &'static str },

    #[error("Entity has no identity")]
    MissingIdentity,

    #[error("Relationship {side} endpoint is missing or has no identity")]
    MissingEndpoint { side: &'static str },

    #[error("Invalid relationship direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Invalid operator: {0:?}")]
    InvalidOperator(String),

    #[error("Attribute {0:?} is reserved for the entity identity")]
    ReservedAttribute(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error(transparent)]
    Core(#[from] nodekit_core::CoreError),
}

pub type Result<T> = std::result::Result<T, GraphError>;
