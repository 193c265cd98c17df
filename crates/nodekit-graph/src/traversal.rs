//! Two-hop traversals: a source node query, one relationship, a target node.

use std::fmt;
use std::str::FromStr;

use nodekit_core::Value;

use crate::builder::NodeQuery;
use crate::cypher::{
    label_pattern, render_predicates, validate_identifier, where_clause, Connective, Operator,
    Predicate, Test,
};
use crate::entity::Entity;
use crate::error::{GraphError, Result};
use crate::gateway::{ColumnKind, Statement, StoreGateway};
use crate::hydrate::{hydrate_all, hydrate_column};
use crate::params::Bindings;

const SOURCE: &str = "source";
const TARGET: &str = "target";
const REL: &str = "r";

/// Which way the relationship points, seen from the source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

impl Direction {
    /// `-[r:TYPE]->`, `<-[r:TYPE]-`, or `-[r:TYPE]-`.
    pub fn pattern(self, rel_type: &str) -> Result<String> {
        let rel_type = validate_identifier(rel_type)?;
        Ok(match self {
            Self::Outgoing => format!("-[{REL}:{rel_type}]->"),
            Self::Incoming => format!("<-[{REL}:{rel_type}]-"),
            Self::Both => format!("-[{REL}:{rel_type}]-"),
        })
    }
}

impl FromStr for Direction {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "outgoing" => Ok(Self::Outgoing),
            "incoming" => Ok(Self::Incoming),
            "both" => Ok(Self::Both),
            _ => Err(GraphError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
            Self::Both => "both",
        })
    }
}

/// A traversal from the nodes matched by a [`NodeQuery`] to their
/// neighbours over one relationship type.
///
/// Relationship and target predicates are bound through the source query's
/// allocator, so their placeholders never collide with the source's.
#[derive(Debug, Clone)]
pub struct Traversal {
    source_labels: Vec<String>,
    source_predicates: Vec<Predicate>,
    bindings: Bindings,
    direction: Direction,
    rel_type: String,
    target_labels: Vec<String>,
    relationship_predicates: Vec<Predicate>,
    target_predicates: Vec<Predicate>,
}

impl Traversal {
    pub fn new(source: NodeQuery, direction: Direction, rel_type: &str) -> Self {
        let (source_labels, source_predicates, bindings) = source.into_parts();
        Self {
            source_labels,
            source_predicates,
            bindings,
            direction,
            rel_type: rel_type.to_string(),
            target_labels: Vec::new(),
            relationship_predicates: Vec::new(),
            target_predicates: Vec::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Restrict targets to nodes carrying all of `labels`. Replaces any
    /// earlier target labels.
    pub fn label<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// `r.field = value`.
    pub fn where_relationship(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_relationship_op(field, Operator::Eq, value)
    }

    /// `r.field <op> value`.
    pub fn where_relationship_op(mut self, field: &str, op: Operator, value: impl Into<Value>) -> Self {
        let predicate = self.predicate(field, op, value.into());
        self.relationship_predicates.push(predicate);
        self
    }

    /// `target.field = value`.
    pub fn where_target(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_target_op(field, Operator::Eq, value)
    }

    /// `target.field <op> value`.
    pub fn where_target_op(mut self, field: &str, op: Operator, value: impl Into<Value>) -> Self {
        let predicate = self.predicate(field, op, value.into());
        self.target_predicates.push(predicate);
        self
    }

    fn predicate(&mut self, field: &str, op: Operator, value: Value) -> Predicate {
        Predicate {
            connective: Connective::And,
            field: field.to_string(),
            test: Test::Compare(op),
            param: self.bindings.bind(value),
        }
    }

    fn pattern(&self) -> Result<String> {
        let mut text = format!(
            "MATCH ({SOURCE}{}){}",
            label_pattern(&self.source_labels)?,
            where_clause(SOURCE, &self.source_predicates)?
        );
        text.push_str(&format!(
            " MATCH ({SOURCE}){}({TARGET}{})",
            self.direction.pattern(&self.rel_type)?,
            label_pattern(&self.target_labels)?
        ));

        let mut conditions = Vec::new();
        if !self.relationship_predicates.is_empty() {
            conditions.push(render_predicates(REL, &self.relationship_predicates)?);
        }
        if !self.target_predicates.is_empty() {
            conditions.push(render_predicates(TARGET, &self.target_predicates)?);
        }
        if !conditions.is_empty() {
            text.push_str(&format!(" WHERE {}", conditions.join(" AND ")));
        }
        Ok(text)
    }

    /// `MATCH (source...) MATCH (source)-[r:T]->(target...) RETURN target [LIMIT 1]`
    pub fn compile_select(&self, limit_one: bool) -> Result<Statement> {
        let mut text = self.pattern()?;
        text.push_str(&format!(" RETURN {TARGET}"));
        if limit_one {
            text.push_str(" LIMIT 1");
        }
        Ok(Statement::new(text)
            .with_parameters(self.bindings.values().clone())
            .returning(TARGET, ColumnKind::Node))
    }

    pub fn compile_count(&self) -> Result<Statement> {
        Ok(
            Statement::new(format!("{} RETURN count({TARGET}) AS total", self.pattern()?))
                .with_parameters(self.bindings.values().clone())
                .returning("total", ColumnKind::Integer),
        )
    }

    /// Every target node, hydrated from the `target` column.
    pub async fn get<G>(self, gateway: &G) -> Result<Vec<Entity>>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile_select(false)?).await?;
        hydrate_all(&records, TARGET)
    }

    pub async fn first<G>(self, gateway: &G) -> Result<Option<Entity>>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile_select(true)?).await?;
        records
            .first()
            .map(|record| hydrate_column(record, TARGET))
            .transpose()
    }

    pub async fn count<G>(self, gateway: &G) -> Result<i64>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile_count()?).await?;
        records.count_column("total")
    }
}
