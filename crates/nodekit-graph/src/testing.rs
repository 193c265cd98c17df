//! In-memory gateway for unit tests: records every statement and replays
//! queued results.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use nodekit_core::{Attributes, Value};

use crate::error::{GraphError, Result};
use crate::gateway::{Statement, StoreGateway};
use crate::record::{Field, RawNode, Record, RecordSet};

pub(crate) struct RecordingGateway {
    statements: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<std::result::Result<RecordSet, String>>>,
    issued: AtomicU32,
    auto_identity: bool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            issued: AtomicU32::new(0),
            auto_identity: true,
        }
    }

    pub fn without_auto_identity(mut self) -> Self {
        self.auto_identity = false;
        self
    }

    /// Queue the records returned by the next `run`. With nothing queued,
    /// `run` returns an empty set.
    pub fn push(&self, records: Vec<Record>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RecordSet::new(records)));
    }

    pub fn fail_next(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreGateway for RecordingGateway {
    async fn run(&self, statement: Statement) -> Result<RecordSet> {
        self.statements.lock().unwrap().push(statement);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(records)) => Ok(records),
            Some(Err(message)) => Err(GraphError::Connection(message)),
            None => Ok(RecordSet::default()),
        }
    }

    fn generate_identity(&self) -> String {
        format!("generated-{}", self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn auto_identity(&self) -> bool {
        self.auto_identity
    }
}

pub(crate) fn node_record(column: &str, labels: &[&str], properties: Attributes) -> Record {
    Record::new().with(
        column,
        Field::Node(RawNode {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties,
        }),
    )
}

pub(crate) fn count_record(column: &str, count: i64) -> Record {
    Record::new().with(column, Field::Value(Value::Integer(count)))
}
