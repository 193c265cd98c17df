//! Turning store records back into entities.

use crate::entity::Entity;
use crate::error::Result;
use crate::record::{RawNode, Record, RecordSet};

/// Build a persisted entity from a raw node. An `id` property becomes the
/// identity. The node itself is left untouched.
pub fn hydrate(node: &RawNode) -> Entity {
    Entity::from_store(node.labels.clone(), node.properties.clone())
}

/// Hydrate the node held in `column` of `record`.
pub fn hydrate_column(record: &Record, column: &str) -> Result<Entity> {
    Ok(hydrate(record.node(column)?))
}

/// Hydrate `column` of every record, in result order.
pub fn hydrate_all(records: &RecordSet, column: &str) -> Result<Vec<Entity>> {
    records
        .iter()
        .map(|record| hydrate_column(record, column))
        .collect()
}
