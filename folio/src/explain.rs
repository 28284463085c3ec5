//! Query plan reports.
//!
//! `cursor.explain(ExplainMode::QueryPlanner)` describes the chosen plan with
//! estimated counters and returns nothing. `ExplainMode::ExecutionStats` runs
//! the query on a snapshot and reports what it actually touched.

use crate::collection::{FindPlan, ScanPath};
use crate::collection::Document;
use crate::common::Value;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplainMode {
    QueryPlanner,
    ExecutionStats,
}

impl ExplainMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplainMode::QueryPlanner => "queryPlanner",
            ExplainMode::ExecutionStats => "executionStats",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplainReport {
    mode: ExplainMode,
    path: ScanPath,
    index_name: Option<String>,
    documents_examined: u64,
    keys_examined: u64,
    returned: u64,
    blocking_sort: bool,
}

impl ExplainReport {
    pub(crate) fn new(mode: ExplainMode, plan: &FindPlan, counters: &ExecutionCounters) -> Self {
        ExplainReport {
            mode,
            path: plan.path(),
            index_name: plan.index_descriptor().map(|d| d.name().to_string()),
            documents_examined: counters.documents_examined(),
            keys_examined: counters.keys_examined(),
            returned: counters.returned(),
            blocking_sort: plan.blocking_sort_order().is_some(),
        }
    }

    pub fn mode(&self) -> ExplainMode {
        self.mode
    }

    /// `"index"` or `"scan"`.
    pub fn path(&self) -> &'static str {
        self.path.as_str()
    }

    pub fn scan_path(&self) -> ScanPath {
        self.path
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn documents_examined(&self) -> u64 {
        self.documents_examined
    }

    pub fn keys_examined(&self) -> u64 {
        self.keys_examined
    }

    pub fn returned(&self) -> u64 {
        self.returned
    }

    pub fn blocking_sort(&self) -> bool {
        self.blocking_sort
    }

    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert_raw("mode", Value::from(self.mode.as_str()));
        document.insert_raw("path", Value::from(self.path()));
        document.insert_raw("indexName", Value::from(self.index_name.clone()));
        document.insert_raw("documentsExamined", Value::from(self.documents_examined));
        document.insert_raw("keysExamined", Value::from(self.keys_examined));
        document.insert_raw("returned", Value::from(self.returned));
        document.insert_raw("blockingSort", Value::from(self.blocking_sort));
        document
    }
}

impl Display for ExplainReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

/// Work counters shared by the stages of one query run.
#[derive(Debug, Default)]
pub(crate) struct ExecutionCounters {
    documents_examined: Arc<AtomicU64>,
    keys_examined: Arc<AtomicU64>,
    returned: Arc<AtomicU64>,
}

impl ExecutionCounters {
    pub(crate) fn documents_examined_counter(&self) -> Arc<AtomicU64> {
        self.documents_examined.clone()
    }

    pub(crate) fn returned_counter(&self) -> Arc<AtomicU64> {
        self.returned.clone()
    }

    pub(crate) fn add_documents_examined(&self, count: u64) {
        self.documents_examined.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_keys_examined(&self, count: u64) {
        self.keys_examined.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn documents_examined(&self) -> u64 {
        self.documents_examined.load(Ordering::Relaxed)
    }

    pub(crate) fn keys_examined(&self) -> u64 {
        self.keys_examined.load(Ordering::Relaxed)
    }

    pub(crate) fn returned(&self) -> u64 {
        self.returned.load(Ordering::Relaxed)
    }
}
