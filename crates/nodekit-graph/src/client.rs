//! Neo4j connection management and the production [`StoreGateway`].

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use neo4rs::{BoltList, BoltMap, BoltNull, BoltString, BoltType, ConfigBuilder, Graph, Query};
use nodekit_core::{Attributes, Settings, Value};
use tokio::sync::Mutex;

use crate::error::{GraphError, Result};
use crate::gateway::{ColumnKind, Statement, StoreGateway};
use crate::record::{Field, RawNode, RawRelationship, Record, RecordSet};

/// Boxed future handed back by transaction callbacks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    pub log_queries: bool,
    pub auto_identity: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig::from(&Settings::default())
    }
}

impl From<&Settings> for GraphConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            uri: settings.neo4j.uri.clone(),
            user: settings.neo4j.user.clone(),
            password: settings.neo4j.password.clone(),
            database: settings.neo4j.database.clone(),
            max_connections: settings.neo4j.max_connections,
            fetch_size: settings.neo4j.fetch_size,
            log_queries: settings.logging.log_queries,
            auto_identity: settings.auto_identity,
        }
    }
}

/// Thread-safe Neo4j client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    log_queries: bool,
    auto_identity: bool,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self {
            graph,
            log_queries: config.log_queries,
            auto_identity: config.auto_identity,
        })
    }

    /// Get a reference to the underlying neo4rs Graph for direct operations.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Run `callback` inside one write transaction.
    ///
    /// Commits when the callback returns `Ok`, rolls back when it returns
    /// `Err`. The callback's error is what the caller sees; a failed rollback
    /// is only logged.
    ///
    /// ```no_run
    /// # async fn demo(client: nodekit_graph::GraphClient) -> nodekit_graph::Result<()> {
    /// use nodekit_core::attrs;
    /// use nodekit_graph::NodeQuery;
    ///
    /// let moved = client
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             NodeQuery::label(["Person"])
    ///                 .where_eq("city", "Paris")
    ///                 .update(attrs! { "country" => "FR" }, tx)
    ///                 .await
    ///         })
    ///     })
    ///     .await?;
    /// # let _ = moved;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn transaction<T, F>(&self, callback: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t TxnGateway) -> BoxFuture<'t, Result<T>>,
    {
        let txn = self.graph.start_txn().await?;
        let gateway = TxnGateway {
            txn: Mutex::new(txn),
            log_queries: self.log_queries,
            auto_identity: self.auto_identity,
        };

        let outcome = callback(&gateway).await;
        let txn = gateway.txn.into_inner();

        match outcome {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(error = %rollback, "Transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl StoreGateway for GraphClient {
    async fn run(&self, statement: Statement) -> Result<RecordSet> {
        log_statement(self.log_queries, &statement);
        let mut stream = self.graph.execute(to_query(&statement)).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            records.push(decode_row(&row, &statement.columns)?);
        }
        Ok(RecordSet::new(records))
    }

    fn auto_identity(&self) -> bool {
        self.auto_identity
    }
}

/// Gateway handed to [`GraphClient::transaction`] callbacks. Every statement
/// run through it joins the open transaction.
pub struct TxnGateway {
    txn: Mutex<neo4rs::Txn>,
    log_queries: bool,
    auto_identity: bool,
}

#[async_trait]
impl StoreGateway for TxnGateway {
    async fn run(&self, statement: Statement) -> Result<RecordSet> {
        log_statement(self.log_queries, &statement);
        let mut txn = self.txn.lock().await;
        let mut stream = txn.execute(to_query(&statement)).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await? {
            records.push(decode_row(&row, &statement.columns)?);
        }
        Ok(RecordSet::new(records))
    }

    fn auto_identity(&self) -> bool {
        self.auto_identity
    }
}

fn log_statement(enabled: bool, statement: &Statement) {
    if enabled {
        let params: Vec<&str> = statement.parameters.keys().map(String::as_str).collect();
        tracing::debug!(cypher = %statement.text, ?params, "Running statement");
    }
}

// ── Driver conversions ───────────────────────────────────────────

fn to_query(statement: &Statement) -> Query {
    statement
        .parameters
        .iter()
        .fold(neo4rs::query(&statement.text), |q, (name, value)| {
            q.param(name, to_bolt(value))
        })
}

fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Integer(i) => BoltType::from(*i),
        Value::Float(f) => BoltType::from(*f),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::List(items) => {
            BoltType::List(BoltList::from(items.iter().map(to_bolt).collect::<Vec<_>>()))
        }
        Value::Map(map) => {
            let mut bolt = BoltMap::new();
            for (key, value) in map {
                bolt.put(BoltString::from(key.as_str()), to_bolt(value));
            }
            BoltType::Map(bolt)
        }
    }
}

fn malformed(column: &str, e: impl std::fmt::Display) -> GraphError {
    GraphError::MalformedRecord(format!("column {column:?}: {e}"))
}

fn decode_row(row: &neo4rs::Row, columns: &[(String, ColumnKind)]) -> Result<Record> {
    let mut record = Record::new();
    for (column, kind) in columns {
        let field = match kind {
            ColumnKind::Node => {
                let node: neo4rs::Node = row.get(column).map_err(|e| malformed(column, e))?;
                Field::Node(decode_node(&node)?)
            }
            ColumnKind::Relationship => {
                let rel: neo4rs::Relation = row.get(column).map_err(|e| malformed(column, e))?;
                Field::Relationship(decode_relation(&rel)?)
            }
            ColumnKind::Integer => {
                Field::Value(Value::Integer(row.get::<i64>(column).map_err(|e| malformed(column, e))?))
            }
            ColumnKind::Value => {
                Field::Value(row.get::<Value>(column).map_err(|e| malformed(column, e))?)
            }
        };
        record.insert(column.clone(), field);
    }
    Ok(record)
}

fn decode_node(node: &neo4rs::Node) -> Result<RawNode> {
    let mut properties = Attributes::new();
    for key in node.keys() {
        let value: Value = node.get(key).map_err(|e| malformed(key, e))?;
        properties.insert(key.to_string(), value);
    }
    Ok(RawNode {
        labels: node.labels().into_iter().map(str::to_string).collect(),
        properties,
    })
}

fn decode_relation(rel: &neo4rs::Relation) -> Result<RawRelationship> {
    let mut properties = Attributes::new();
    for key in rel.keys() {
        let value: Value = rel.get(key).map_err(|e| malformed(key, e))?;
        properties.insert(key.to_string(), value);
    }
    Ok(RawRelationship {
        rel_type: rel.typ().to_string(),
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodekit_core::attrs;

    #[test]
    fn test_config_from_settings() {
        let mut settings = Settings::default();
        settings.neo4j.uri = "bolt://graph:7687".to_string();
        settings.logging.log_queries = true;
        settings.auto_identity = false;

        let config = GraphConfig::from(&settings);
        assert_eq!(config.uri, "bolt://graph:7687");
        assert_eq!(config.database, "neo4j");
        assert!(config.log_queries);
        assert!(!config.auto_identity);
    }

    #[test]
    fn test_to_bolt_nests_collections() {
        let value = Value::Map(attrs! { "tags" => vec!["a", "b"], "n" => Value::Null });
        match to_bolt(&value) {
            BoltType::Map(map) => {
                assert!(matches!(
                    map.value.get(&BoltString::from("tags")),
                    Some(BoltType::List(_))
                ));
                assert!(matches!(
                    map.value.get(&BoltString::from("n")),
                    Some(BoltType::Null(_))
                ));
            }
            other => panic!("expected a map, got {other:?}"),
        }
    }
}
