//! Maintenance commands run against any [`StoreGateway`].

use anyhow::Context;
use nodekit_core::Value;
use nodekit_graph::{validate_identifier, ColumnKind, RecordSet, Statement, StoreGateway};
use serde_json::json;

const TOTAL: &str = "total";

fn count_nodes(label: Option<&str>) -> anyhow::Result<Statement> {
    let pattern = match label {
        Some(label) => format!("(n:{})", validate_identifier(label)?),
        None => "(n)".to_string(),
    };
    Ok(Statement::new(format!("MATCH {pattern} RETURN count(n) AS {TOTAL}"))
        .returning(TOTAL, ColumnKind::Integer))
}

fn count_relationships(rel_type: Option<&str>) -> anyhow::Result<Statement> {
    let pattern = match rel_type {
        Some(rel_type) => format!("[r:{}]", validate_identifier(rel_type)?),
        None => "[r]".to_string(),
    };
    Ok(Statement::new(format!("MATCH ()-{pattern}->() RETURN count(r) AS {TOTAL}"))
        .returning(TOTAL, ColumnKind::Integer))
}

fn names(records: &RecordSet, column: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.value(column).and_then(Value::as_str).map(str::to_string))
        .collect()
}

async fn total<G: StoreGateway + ?Sized>(gateway: &G, statement: Statement) -> anyhow::Result<i64> {
    Ok(gateway.run(statement).await?.count_column(TOTAL)?)
}

/// Round-trip a trivial statement.
pub async fn ping<G: StoreGateway + ?Sized>(gateway: &G) -> anyhow::Result<()> {
    let records = gateway
        .run(Statement::new("RETURN 1 AS ok").returning("ok", ColumnKind::Integer))
        .await
        .context("graph did not answer")?;
    match records.first().map(|r| r.integer("ok")).transpose()? {
        Some(1) => Ok(()),
        other => anyhow::bail!("unexpected ping reply: {other:?}"),
    }
}

/// Node and relationship totals, plus per-label and per-type counts when
/// `detailed` is set.
pub async fn stats<G: StoreGateway + ?Sized>(
    gateway: &G,
    detailed: bool,
) -> anyhow::Result<serde_json::Value> {
    let nodes = total(gateway, count_nodes(None)?).await?;
    let relationships = total(gateway, count_relationships(None)?).await?;

    let labels = names(
        &gateway
            .run(
                Statement::new("CALL db.labels() YIELD label RETURN label")
                    .returning("label", ColumnKind::Value),
            )
            .await?,
        "label",
    );
    let rel_types = names(
        &gateway
            .run(
                Statement::new(
                    "CALL db.relationshipTypes() YIELD relationshipType RETURN relationshipType",
                )
                .returning("relationshipType", ColumnKind::Value),
            )
            .await?,
        "relationshipType",
    );

    let mut report = json!({
        "nodes": nodes,
        "relationships": relationships,
        "label_count": labels.len(),
        "relationship_type_count": rel_types.len(),
    });

    if detailed {
        let mut per_label = serde_json::Map::new();
        for label in &labels {
            if validate_identifier(label).is_err() {
                tracing::warn!(%label, "Skipping label that cannot be queried safely");
                continue;
            }
            let count = total(gateway, count_nodes(Some(label))?).await?;
            per_label.insert(label.clone(), count.into());
        }

        let mut per_type = serde_json::Map::new();
        for rel_type in &rel_types {
            if validate_identifier(rel_type).is_err() {
                tracing::warn!(%rel_type, "Skipping relationship type that cannot be queried safely");
                continue;
            }
            let count = total(gateway, count_relationships(Some(rel_type))?).await?;
            per_type.insert(rel_type.clone(), count.into());
        }

        report["labels"] = serde_json::Value::Object(per_label);
        report["relationship_types"] = serde_json::Value::Object(per_type);
    }

    Ok(report)
}

/// Detach-delete nodes with any of `labels`, or every node when `labels` is
/// empty. Returns the number of nodes left in the graph.
pub async fn clear<G: StoreGateway + ?Sized>(
    gateway: &G,
    labels: &[String],
    force: bool,
) -> anyhow::Result<i64> {
    if !force {
        anyhow::bail!("refusing to clear the graph without --force");
    }

    // Validate everything up front so a bad label deletes nothing.
    let statements = if labels.is_empty() {
        vec![Statement::new("MATCH (n) DETACH DELETE n")]
    } else {
        labels
            .iter()
            .map(|label| {
                Ok(Statement::new(format!(
                    "MATCH (n:{}) DETACH DELETE n",
                    validate_identifier(label)?
                )))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    for statement in statements {
        tracing::info!(cypher = %statement.text, "Clearing");
        gateway.run(statement).await?;
    }

    total(gateway, count_nodes(None)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nodekit_graph::{Field, Record};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers statements from a script and remembers what it was sent.
    #[derive(Default)]
    struct ScriptedGateway {
        replies: Mutex<VecDeque<Vec<Record>>>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn reply(self, records: Vec<Record>) -> Self {
            self.replies.lock().unwrap().push_back(records);
            self
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoreGateway for ScriptedGateway {
        async fn run(&self, statement: Statement) -> nodekit_graph::Result<RecordSet> {
            self.sent.lock().unwrap().push(statement.text);
            let records = self.replies.lock().unwrap().pop_front().unwrap_or_default();
            Ok(RecordSet::new(records))
        }
    }

    fn int(column: &str, n: i64) -> Record {
        Record::new().with(column, Field::Value(Value::Integer(n)))
    }

    fn name(column: &str, s: &str) -> Record {
        Record::new().with(column, Field::Value(Value::from(s)))
    }

    #[tokio::test]
    async fn test_ping_expects_one() {
        let ok = ScriptedGateway::default().reply(vec![int("ok", 1)]);
        ping(&ok).await.unwrap();

        let silent = ScriptedGateway::default();
        assert!(ping(&silent).await.is_err());
    }

    #[tokio::test]
    async fn test_stats_summary() {
        let gateway = ScriptedGateway::default()
            .reply(vec![int(TOTAL, 12)])
            .reply(vec![int(TOTAL, 5)])
            .reply(vec![name("label", "Person"), name("label", "Company")])
            .reply(vec![name("relationshipType", "WORKS_FOR")]);

        let report = stats(&gateway, false).await.unwrap();
        assert_eq!(
            report,
            json!({
                "nodes": 12,
                "relationships": 5,
                "label_count": 2,
                "relationship_type_count": 1,
            })
        );
    }

    #[tokio::test]
    async fn test_detailed_stats_skip_unsafe_labels() {
        let gateway = ScriptedGateway::default()
            .reply(vec![int(TOTAL, 3)])
            .reply(vec![int(TOTAL, 0)])
            .reply(vec![name("label", "Person"), name("label", "Bad Label")])
            .reply(vec![])
            .reply(vec![int(TOTAL, 3)]);

        let report = stats(&gateway, true).await.unwrap();
        assert_eq!(report["labels"], json!({ "Person": 3 }));
        assert_eq!(report["relationship_types"], json!({}));

        let sent = gateway.sent();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[4], "MATCH (n:Person) RETURN count(n) AS total");
    }

    #[tokio::test]
    async fn test_clear_requires_force() {
        let gateway = ScriptedGateway::default();
        assert!(clear(&gateway, &[], false).await.is_err());
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_clear_by_label_then_counts_remaining() {
        let gateway = ScriptedGateway::default()
            .reply(vec![])
            .reply(vec![])
            .reply(vec![int(TOTAL, 7)]);

        let labels = vec!["Person".to_string(), "Company".to_string()];
        let remaining = clear(&gateway, &labels, true).await.unwrap();
        assert_eq!(remaining, 7);
        assert_eq!(
            gateway.sent(),
            [
                "MATCH (n:Person) DETACH DELETE n",
                "MATCH (n:Company) DETACH DELETE n",
                "MATCH (n) RETURN count(n) AS total",
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_rejects_bad_label_before_deleting() {
        let gateway = ScriptedGateway::default();
        let labels = vec!["Person".to_string(), "x) DETACH DELETE (m".to_string()];
        assert!(clear(&gateway, &labels, true).await.is_err());
        assert!(gateway.sent().is_empty());
    }
}
