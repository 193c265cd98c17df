//! Creating a relationship between two persisted entities.

use nodekit_core::{Attributes, Value};

use crate::cypher::validate_identifier;
use crate::entity::{Entity, IDENTITY_KEY};
use crate::error::{GraphError, Result};
use crate::gateway::{ColumnKind, Statement, StoreGateway};
use crate::params::Bindings;

/// Builds `(from)-[:TYPE {props}]->(to)`.
#[derive(Debug, Clone)]
pub struct EdgeWriter<'a> {
    from: &'a Entity,
    to: Option<&'a Entity>,
    rel_type: String,
    properties: Attributes,
}

impl<'a> EdgeWriter<'a> {
    pub fn new(from: &'a Entity, rel_type: impl Into<String>) -> Self {
        Self {
            from,
            to: None,
            rel_type: rel_type.into(),
            properties: Attributes::new(),
        }
    }

    pub fn to(mut self, target: &'a Entity) -> Self {
        self.to = Some(target);
        self
    }

    /// Replaces any earlier properties.
    pub fn with_properties(mut self, properties: Attributes) -> Self {
        self.properties = properties;
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// `MATCH (a), (b) WHERE a.id = $fromId AND b.id = $toId
    ///  CREATE (a)-[r:TYPE {k: $p1}]->(b) RETURN r`
    pub fn compile(&self) -> Result<Statement> {
        let from_id = self
            .from
            .identity()
            .ok_or(GraphError::MissingEndpoint { side: "source" })?;
        let to_id = self
            .to
            .and_then(Entity::identity)
            .ok_or(GraphError::MissingEndpoint { side: "target" })?;
        let rel_type = validate_identifier(&self.rel_type)?;

        let mut bindings = Bindings::new();
        bindings.bind_named("fromId", from_id);
        bindings.bind_named("toId", to_id);

        let mut properties = Vec::with_capacity(self.properties.len());
        for (key, value) in &self.properties {
            let key = validate_identifier(key)?;
            let param = bindings.bind(value.clone());
            properties.push(format!("{key}: ${param}"));
        }
        let properties = if properties.is_empty() {
            String::new()
        } else {
            format!(" {{{}}}", properties.join(", "))
        };

        Ok(Statement::new(format!(
            "MATCH (a), (b) WHERE a.{IDENTITY_KEY} = $fromId AND b.{IDENTITY_KEY} = $toId \
             CREATE (a)-[r:{rel_type}{properties}]->(b) RETURN r"
        ))
        .with_parameters(bindings.into_values())
        .returning("r", ColumnKind::Relationship))
    }

    /// Create the relationship. Returns whether the store echoed it back
    /// (`false` when either endpoint no longer exists).
    pub async fn save<G>(self, gateway: &G) -> Result<bool>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile()?).await?;
        Ok(!records.is_empty())
    }
}
