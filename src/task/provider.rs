//! Cell provider: where a task's input column comes from.
//!
//! The orchestrator never reads spreadsheets itself; it asks a provider for
//! the cells matching a task identity. A provider failure fails the whole
//! task with a critical issue, since there is nothing to process.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use super::types::{TaskIdentity, TaskInput};

#[derive(Error, Debug, Clone)]
pub enum ProvideError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("provider failure: {0}")]
    Other(String),
}

/// Input seam for the orchestrator.
pub trait CellProvider: Send + Sync {
    fn fetch(&self, identity: &TaskIdentity) -> Result<TaskInput, ProvideError>;
}

/// Provider backed by pre-registered columns, keyed by identity.
///
/// Serves embedded callers that already hold the parsed spreadsheet, and
/// doubles as the test double for orchestrator scenarios.
#[derive(Default)]
pub struct InMemoryCellProvider {
    columns: RwLock<HashMap<String, TaskInput>>,
}

impl InMemoryCellProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, identity: &TaskIdentity, input: TaskInput) {
        let mut map = match self.columns.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.insert(identity.key(), input);
    }
}

impl CellProvider for InMemoryCellProvider {
    fn fetch(&self, identity: &TaskIdentity) -> Result<TaskInput, ProvideError> {
        let map = match self.columns.read() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.get(&identity.key())
            .cloned()
            .ok_or_else(|| ProvideError::ColumnNotFound(identity.column_name.clone()))
    }
}
