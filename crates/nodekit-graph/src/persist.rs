//! Save and delete for a single entity.
//!
//! An unsaved entity is inserted with `CREATE`; a persisted one is updated
//! in place, matched by identity.

use crate::cypher::{label_pattern, validate_identifier};
use crate::edge::EdgeWriter;
use crate::entity::{Entity, IDENTITY_KEY};
use crate::error::{GraphError, Result};
use crate::gateway::{ColumnKind, Statement, StoreGateway};
use crate::params::Bindings;

impl Entity {
    /// Insert or update this entity. Returns whether the store echoed the
    /// node back.
    ///
    /// On first insert an identity is generated through the gateway when none
    /// was supplied and the gateway has auto-identity enabled.
    pub async fn save<G>(&mut self, gateway: &G) -> Result<bool>
    where
        G: StoreGateway + ?Sized,
    {
        if self.is_persisted() {
            let records = gateway.run(compile_update(self)?).await?;
            return Ok(!records.is_empty());
        }

        if self.identity().is_none() && gateway.auto_identity() {
            self.set_identity(gateway.generate_identity());
        }

        let records = gateway.run(compile_insert(self)?).await?;
        if records.is_empty() {
            return Ok(false);
        }
        self.set_persisted(true);
        Ok(true)
    }

    /// Delete this entity's node. Returns `false` without touching the store
    /// when the entity was never persisted or has no identity.
    ///
    /// After the statement succeeds the entity is marked unsaved, whether or
    /// not a node actually matched. A store error leaves it as it was.
    pub async fn delete<G>(&mut self, gateway: &G) -> Result<bool>
    where
        G: StoreGateway + ?Sized,
    {
        let Some(identity) = self.identity().filter(|_| self.is_persisted()) else {
            return Ok(false);
        };

        let statement = Statement::new(format!(
            "MATCH (n) WHERE n.{IDENTITY_KEY} = ${IDENTITY_KEY} DELETE n"
        ))
        .param(IDENTITY_KEY, identity);

        gateway.run(statement).await?;
        self.set_persisted(false);
        Ok(true)
    }

    /// Start a relationship of `rel_type` from this entity.
    pub fn relate(&self, rel_type: impl Into<String>) -> EdgeWriter<'_> {
        EdgeWriter::new(self, rel_type)
    }
}

/// `CREATE (n:Labels {k: $p1, ..., id: $id}) RETURN n`
pub fn compile_insert(entity: &Entity) -> Result<Statement> {
    let labels = label_pattern(entity.labels())?;
    let mut bindings = Bindings::new();
    let mut properties = Vec::with_capacity(entity.attributes().len() + 1);

    for (key, value) in entity.attributes() {
        let key = validate_identifier(key)?;
        let param = bindings.bind(value.clone());
        properties.push(format!("{key}: ${param}"));
    }
    if let Some(identity) = entity.identity() {
        bindings.bind_named(IDENTITY_KEY, identity);
        properties.push(format!("{IDENTITY_KEY}: ${IDENTITY_KEY}"));
    }

    let properties = if properties.is_empty() {
        String::new()
    } else {
        format!(" {{{}}}", properties.join(", "))
    };

    Ok(Statement::new(format!("CREATE (n{labels}{properties}) RETURN n"))
        .with_parameters(bindings.into_values())
        .returning("n", ColumnKind::Node))
}

/// `MATCH (n) WHERE n.id = $id SET n.k = $p1, ... RETURN n`
pub fn compile_update(entity: &Entity) -> Result<Statement> {
    let identity = entity.identity().ok_or(GraphError::MissingIdentity)?;
    let mut bindings = Bindings::new();
    bindings.bind_named(IDENTITY_KEY, identity);

    let mut assignments = Vec::with_capacity(entity.attributes().len());
    for (key, value) in entity.attributes() {
        let key = validate_identifier(key)?;
        let param = bindings.bind(value.clone());
        assignments.push(format!("n.{key} = ${param}"));
    }

    let set = if assignments.is_empty() {
        String::new()
    } else {
        format!(" SET {}", assignments.join(", "))
    };

    Ok(Statement::new(format!(
        "MATCH (n) WHERE n.{IDENTITY_KEY} = ${IDENTITY_KEY}{set} RETURN n"
    ))
    .with_parameters(bindings.into_values())
    .returning("n", ColumnKind::Node))
}
