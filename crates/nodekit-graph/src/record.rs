//! Result rows as the compilers see them, independent of the driver.

use indexmap::IndexMap;
use nodekit_core::{Attributes, Value};

use crate::error::{GraphError, Result};

/// A node as returned by the store: its labels and property map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawNode {
    pub labels: Vec<String>,
    pub properties: Attributes,
}

impl RawNode {
    pub fn properties(&self) -> &Attributes {
        &self.properties
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// A relationship as returned by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRelationship {
    pub rel_type: String,
    pub properties: Attributes,
}

/// One column of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Node(RawNode),
    Relationship(RawRelationship),
    Value(Value),
}

/// One result row, keyed by column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: IndexMap<String, Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, field: Field) -> Self {
        self.fields.insert(column.into(), field);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, field: Field) {
        self.fields.insert(column.into(), field);
    }

    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields.get(column)
    }

    pub fn node(&self, column: &str) -> Result<&RawNode> {
        match self.fields.get(column) {
            Some(Field::Node(node)) => Ok(node),
            Some(_) => Err(GraphError::MalformedRecord(format!(
                "column {column:?} is not a node"
            ))),
            None => Err(GraphError::MalformedRecord(format!(
                "missing column {column:?}"
            ))),
        }
    }

    pub fn integer(&self, column: &str) -> Result<i64> {
        match self.fields.get(column) {
            Some(Field::Value(Value::Integer(i))) => Ok(*i),
            Some(_) => Err(GraphError::MalformedRecord(format!(
                "column {column:?} is not an integer"
            ))),
            None => Err(GraphError::MalformedRecord(format!(
                "missing column {column:?}"
            ))),
        }
    }

    pub fn value(&self, column: &str) -> Option<&Value> {
        match self.fields.get(column) {
            Some(Field::Value(v)) => Some(v),
            _ => None,
        }
    }
}

/// All records returned by one statement, in result order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Read a count column from the first record; an empty result counts as zero.
    pub fn count_column(&self, column: &str) -> Result<i64> {
        match self.first() {
            Some(record) => record.integer(column),
            None => Ok(0),
        }
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
