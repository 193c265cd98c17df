//! Entity query compiler: label filter, predicates, ordering, and limit for a
//! single node pattern.
//!
//! Statement clauses are always assembled in the order MATCH, WHERE,
//! SET/DELETE/RETURN, ORDER BY, LIMIT.

use nodekit_core::{Attributes, Value};

use crate::cypher::{
    label_pattern, validate_identifier, where_clause, Connective, Operator, Predicate,
    SortDirection, Test,
};
use crate::entity::{Entity, IDENTITY_KEY};
use crate::error::{GraphError, Result};
use crate::gateway::{ColumnKind, Statement, StoreGateway};
use crate::hydrate::{hydrate_all, hydrate_column};
use crate::params::Bindings;
use crate::traversal::{Direction, Traversal};

const NODE: &str = "n";

/// A query over nodes carrying a set of labels.
///
/// Built fluently, then consumed by exactly one terminal operation.
///
/// ```
/// use nodekit_graph::{NodeQuery, Operator, SortDirection};
///
/// let stmt = NodeQuery::label(["Person"])
///     .where_eq("city", "San Francisco")
///     .where_op("age", Operator::Gt, 25)
///     .order_by("name", SortDirection::Asc)
///     .limit(5)
///     .compile_select()
///     .unwrap();
///
/// assert_eq!(
///     stmt.text,
///     "MATCH (n:Person) WHERE n.city = $p1 AND n.age > $p2 RETURN n ORDER BY n.name ASC LIMIT 5"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeQuery {
    labels: Vec<String>,
    predicates: Vec<Predicate>,
    bindings: Bindings,
    order: Option<(String, SortDirection)>,
    limit: Option<u64>,
}

impl NodeQuery {
    /// Start a query over nodes carrying all of `labels`.
    pub fn label<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Self::default();
        for label in labels {
            let label = label.into();
            if !query.labels.contains(&label) {
                query.labels.push(label);
            }
        }
        query
    }

    fn push(mut self, connective: Connective, field: &str, test: Test, value: Value) -> Self {
        let param = self.bindings.bind(value);
        self.predicates.push(Predicate {
            connective,
            field: field.to_string(),
            test,
            param,
        });
        self
    }

    /// `n.field = value`, joined with `AND`.
    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, Operator::Eq, value)
    }

    /// `n.field <op> value`, joined with `AND`.
    pub fn where_op(self, field: &str, op: Operator, value: impl Into<Value>) -> Self {
        self.push(Connective::And, field, Test::Compare(op), value.into())
    }

    /// `n.field = value`, joined with a bare `OR`.
    ///
    /// The chain stays flat: `where_eq(a).where_eq(b).or_where(c)` renders
    /// `a AND b OR c`, which Cypher reads as `(a AND b) OR c`.
    pub fn or_where(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_op(field, Operator::Eq, value)
    }

    /// `n.field <op> value`, joined with a bare `OR`.
    pub fn or_where_op(self, field: &str, op: Operator, value: impl Into<Value>) -> Self {
        self.push(Connective::Or, field, Test::Compare(op), value.into())
    }

    /// `n.field IN values`, with the whole list bound to one placeholder.
    pub fn where_in<T: Into<Value>>(self, field: &str, values: Vec<T>) -> Self {
        self.push(Connective::And, field, Test::In, Value::from(values))
    }

    /// Replaces any earlier ordering.
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    /// Replaces any earlier limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn parameters(&self) -> &Attributes {
        self.bindings.values()
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    // ── Traversals ───────────────────────────────────────────────

    /// Follow outgoing `rel_type` relationships from matching nodes.
    pub fn outgoing(self, rel_type: &str) -> Traversal {
        self.traverse(Direction::Outgoing, rel_type)
    }

    /// Follow incoming `rel_type` relationships into matching nodes.
    pub fn incoming(self, rel_type: &str) -> Traversal {
        self.traverse(Direction::Incoming, rel_type)
    }

    /// Follow `rel_type` relationships in either direction.
    pub fn related(self, rel_type: &str) -> Traversal {
        self.traverse(Direction::Both, rel_type)
    }

    pub fn traverse(self, direction: Direction, rel_type: &str) -> Traversal {
        Traversal::new(self, direction, rel_type)
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Predicate>, Bindings) {
        (self.labels, self.predicates, self.bindings)
    }

    // ── Compilation ──────────────────────────────────────────────

    fn match_where(&self) -> Result<String> {
        Ok(format!(
            "MATCH ({NODE}{}){}",
            label_pattern(&self.labels)?,
            where_clause(NODE, &self.predicates)?
        ))
    }

    fn guard(&self, operation: &'static str) -> Result<()> {
        if self.predicates.is_empty() {
            return Err(GraphError::UnsafeMutation { operation });
        }
        Ok(())
    }

    /// `MATCH ... [WHERE ...] RETURN n [ORDER BY ...] [LIMIT ...]`
    pub fn compile_select(&self) -> Result<Statement> {
        let mut text = self.match_where()?;
        text.push_str(" RETURN n");
        if let Some((field, direction)) = &self.order {
            let field = validate_identifier(field)?;
            text.push_str(&format!(" ORDER BY {NODE}.{field} {}", direction.as_cypher()));
        }
        if let Some(limit) = self.limit {
            text.push_str(&format!(" LIMIT {limit}"));
        }

        Ok(Statement::new(text)
            .with_parameters(self.bindings.values().clone())
            .returning(NODE, ColumnKind::Node))
    }

    /// `MATCH ... [WHERE ...] RETURN count(n) AS total`
    pub fn compile_count(&self) -> Result<Statement> {
        Ok(
            Statement::new(format!("{} RETURN count({NODE}) AS total", self.match_where()?))
                .with_parameters(self.bindings.values().clone())
                .returning("total", ColumnKind::Integer),
        )
    }

    /// `MATCH ... WHERE ... SET n.f = $p, ... RETURN count(n) AS updated`
    ///
    /// Fails with `UnsafeMutation` when no predicate has been added.
    pub fn compile_update(mut self, attributes: &Attributes) -> Result<Statement> {
        self.guard("update")?;
        let head = self.match_where()?;

        let mut assignments = Vec::with_capacity(attributes.len());
        for (field, value) in attributes {
            if field == IDENTITY_KEY {
                return Err(GraphError::ReservedAttribute(field.clone()));
            }
            let field = validate_identifier(field)?;
            let param = self.bindings.bind(value.clone());
            assignments.push(format!("{NODE}.{field} = ${param}"));
        }
        let set = if assignments.is_empty() {
            String::new()
        } else {
            format!(" SET {}", assignments.join(", "))
        };

        Ok(
            Statement::new(format!("{head}{set} RETURN count({NODE}) AS updated"))
                .with_parameters(self.bindings.into_values())
                .returning("updated", ColumnKind::Integer),
        )
    }

    /// `MATCH ... WHERE ... DELETE n RETURN count(n) AS deleted`
    ///
    /// Fails with `UnsafeMutation` when no predicate has been added.
    pub fn compile_delete(&self) -> Result<Statement> {
        self.guard("delete")?;
        Ok(Statement::new(format!(
            "{} DELETE {NODE} RETURN count({NODE}) AS deleted",
            self.match_where()?
        ))
        .with_parameters(self.bindings.values().clone())
        .returning("deleted", ColumnKind::Integer))
    }

    // ── Terminal operations ──────────────────────────────────────

    /// Run the query and hydrate every matching node in result order.
    pub async fn get<G>(self, gateway: &G) -> Result<Vec<Entity>>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile_select()?).await?;
        hydrate_all(&records, NODE)
    }

    /// The first match, if any. Overrides any limit with 1.
    pub async fn first<G>(self, gateway: &G) -> Result<Option<Entity>>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.limit(1).compile_select()?).await?;
        records
            .first()
            .map(|record| hydrate_column(record, NODE))
            .transpose()
    }

    /// The node whose identity is `identity`, if any.
    pub async fn find<G>(self, identity: &str, gateway: &G) -> Result<Option<Entity>>
    where
        G: StoreGateway + ?Sized,
    {
        self.where_eq(IDENTITY_KEY, identity).first(gateway).await
    }

    pub async fn count<G>(self, gateway: &G) -> Result<i64>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile_count()?).await?;
        records.count_column("total")
    }

    /// Build an entity with this query's labels and save it.
    ///
    /// The entity is returned even when the store echoed nothing back;
    /// check [`Entity::is_persisted`] in that case.
    pub async fn create<G>(self, attributes: Attributes, gateway: &G) -> Result<Entity>
    where
        G: StoreGateway + ?Sized,
    {
        let mut entity = Entity::new(self.labels, attributes);
        entity.save(gateway).await?;
        Ok(entity)
    }

    /// Set `attributes` on every matching node; returns how many matched.
    pub async fn update<G>(self, attributes: Attributes, gateway: &G) -> Result<i64>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile_update(&attributes)?).await?;
        records.count_column("updated")
    }

    /// Delete every matching node; returns how many matched.
    pub async fn delete<G>(self, gateway: &G) -> Result<i64>
    where
        G: StoreGateway + ?Sized,
    {
        let records = gateway.run(self.compile_delete()?).await?;
        records.count_column("deleted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{count_record, node_record, RecordingGateway};
    use nodekit_core::attrs;

    #[test]
    fn test_compile_select_full_chain() {
        let stmt = NodeQuery::label(["Person"])
            .where_eq("city", "San Francisco")
            .where_op("age", Operator::Gt, 25)
            .order_by("name", SortDirection::Asc)
            .limit(5)
            .compile_select()
            .unwrap();

        assert_eq!(
            stmt.text,
            "MATCH (n:Person) WHERE n.city = $p1 AND n.age > $p2 RETURN n ORDER BY n.name ASC LIMIT 5"
        );
        assert_eq!(stmt.parameters, attrs! { "p1" => "San Francisco", "p2" => 25 });
    }

    #[test]
    fn test_compile_select_without_labels_or_predicates() {
        let stmt = NodeQuery::label(Vec::<String>::new()).compile_select().unwrap();
        assert_eq!(stmt.text, "MATCH (n) RETURN n");
        assert!(stmt.parameters.is_empty());
    }

    #[test]
    fn test_multi_label_match() {
        let stmt = NodeQuery::label(["Company", "Organization", "Company"])
            .compile_count()
            .unwrap();
        assert_eq!(
            stmt.text,
            "MATCH (n:Company:Organization) RETURN count(n) AS total"
        );
    }

    #[test]
    fn test_last_order_and_limit_win() {
        let stmt = NodeQuery::label(["Person"])
            .order_by("name", SortDirection::Asc)
            .order_by("age", SortDirection::Desc)
            .limit(10)
            .limit(2)
            .compile_select()
            .unwrap();
        assert_eq!(stmt.text, "MATCH (n:Person) RETURN n ORDER BY n.age DESC LIMIT 2");
    }

    #[test]
    fn test_or_where_and_where_in() {
        let stmt = NodeQuery::label(["Person"])
            .where_eq("city", "Paris")
            .or_where_op("age", Operator::Lt, 18)
            .where_in("role", vec!["admin", "owner"])
            .compile_select()
            .unwrap();

        assert_eq!(
            stmt.text,
            "MATCH (n:Person) WHERE n.city = $p1 OR n.age < $p2 AND n.role IN $p3 RETURN n"
        );
        assert_eq!(stmt.parameters["p3"], Value::from(vec!["admin", "owner"]));
    }

    #[test]
    fn test_every_bound_value_gets_its_own_placeholder() {
        let query = NodeQuery::label(["Person"])
            .where_eq("name", "a")
            .where_eq("name", "a")
            .or_where("name", "b")
            .where_in("name", vec!["c"]);
        assert_eq!(query.parameters().len(), 4);

        let stmt = query
            .compile_update(&attrs! { "name" => "z", "age" => 3 })
            .unwrap();
        assert_eq!(stmt.parameters.len(), 6);
        assert!(stmt
            .text
            .ends_with("SET n.name = $p5, n.age = $p6 RETURN count(n) AS updated"));
    }

    #[test]
    fn test_unsafe_identifiers_are_rejected() {
        let injected = NodeQuery::label(["Person"])
            .where_eq("name = 'x' DETACH DELETE n //", 1)
            .compile_select();
        assert!(matches!(injected, Err(GraphError::InvalidIdentifier(_))));

        let bad_label = NodeQuery::label(["Person) DETACH DELETE (m"]).compile_select();
        assert!(matches!(bad_label, Err(GraphError::InvalidIdentifier(_))));

        let bad_order = NodeQuery::label(["Person"])
            .order_by("name DESC, n.secret", SortDirection::Asc)
            .compile_select();
        assert!(matches!(bad_order, Err(GraphError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_update_rejects_identity_key() {
        let result = NodeQuery::label(["Person"])
            .where_eq("name", "x")
            .compile_update(&attrs! { "id" => "other" });
        assert!(matches!(result, Err(GraphError::ReservedAttribute(_))));
    }

    #[tokio::test]
    async fn test_unfiltered_mutations_never_reach_the_store() {
        let gateway = RecordingGateway::new();

        let update = NodeQuery::label(["Person"])
            .update(attrs! { "active" => false }, &gateway)
            .await;
        assert!(matches!(
            update,
            Err(GraphError::UnsafeMutation { operation: "update" })
        ));

        let delete = NodeQuery::label(["Person"]).delete(&gateway).await;
        assert!(matches!(
            delete,
            Err(GraphError::UnsafeMutation { operation: "delete" })
        ));

        assert!(gateway.statements().is_empty());
    }

    #[tokio::test]
    async fn test_get_hydrates_in_result_order() {
        let gateway = RecordingGateway::new();
        gateway.push(vec![
            node_record("n", &["Person"], attrs! { "id" => "a", "name" => "Ann" }),
            node_record("n", &["Person"], attrs! { "id" => "b", "name" => "Ben" }),
        ]);

        let people = NodeQuery::label(["Person"]).get(&gateway).await.unwrap();
        let ids: Vec<_> = people.iter().filter_map(Entity::identity).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(people.iter().all(Entity::is_persisted));
    }

    #[tokio::test]
    async fn test_first_and_find() {
        let gateway = RecordingGateway::new();
        assert!(NodeQuery::label(["Person"])
            .limit(20)
            .first(&gateway)
            .await
            .unwrap()
            .is_none());

        gateway.push(vec![node_record("n", &["Person"], attrs! { "id" => "u-7" })]);
        let found = NodeQuery::label(["Person"])
            .find("u-7", &gateway)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.identity(), Some("u-7"));

        let statements = gateway.statements();
        assert_eq!(statements[0].text, "MATCH (n:Person) RETURN n LIMIT 1");
        assert_eq!(
            statements[1].text,
            "MATCH (n:Person) WHERE n.id = $p1 RETURN n LIMIT 1"
        );
        assert_eq!(statements[1].parameters["p1"], Value::from("u-7"));
    }

    #[tokio::test]
    async fn test_count_update_delete_report_store_counts() {
        let gateway = RecordingGateway::new();
        gateway.push(vec![count_record("total", 12)]);
        gateway.push(vec![count_record("updated", 3)]);
        gateway.push(vec![count_record("deleted", 0)]);

        let total = NodeQuery::label(["Person"]).count(&gateway).await.unwrap();
        let updated = NodeQuery::label(["Person"])
            .where_eq("city", "Paris")
            .update(attrs! { "country" => "FR" }, &gateway)
            .await
            .unwrap();
        let deleted = NodeQuery::label(["Person"])
            .where_op("age", Operator::Lt, 0)
            .delete(&gateway)
            .await
            .unwrap();

        assert_eq!((total, updated, deleted), (12, 3, 0));
        assert_eq!(
            gateway.statements()[2].text,
            "MATCH (n:Person) WHERE n.age < $p1 DELETE n RETURN count(n) AS deleted"
        );
    }

    #[tokio::test]
    async fn test_create_uses_query_labels() {
        let gateway = RecordingGateway::new();
        gateway.push(vec![node_record("n", &["Company", "Organization"], attrs! {})]);

        let company = NodeQuery::label(["Company", "Organization"])
            .create(attrs! { "name" => "Acme", "founded" => 2015 }, &gateway)
            .await
            .unwrap();

        assert!(company.is_persisted());
        assert_eq!(company.identity(), Some("generated-1"));
        assert_eq!(
            gateway.statements()[0].text,
            "CREATE (n:Company:Organization {name: $p1, founded: $p2, id: $id}) RETURN n"
        );
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let gateway = RecordingGateway::new();
        gateway.fail_next("connection reset");
        let result = NodeQuery::label(["Person"]).get(&gateway).await;
        assert!(matches!(result, Err(GraphError::Connection(msg)) if msg == "connection reset"));
    }
}
