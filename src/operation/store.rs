//! Operation Store: proposed operations and their execution outcome.

use super::types::{ExecutionOutcome, Operation};
use crate::error::PayrailError;
use crate::storage::Storage;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Default)]
pub struct OperationStore {
    operations: HashMap<String, Operation>,

    #[serde(skip)]
    storage: Option<Arc<Storage>>,
}

impl OperationStore {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
            storage: None,
        }
    }

    /// Create with storage backend, hydrating existing rows.
    pub fn with_storage(storage: Arc<Storage>) -> Self {
        let mut store = Self::new();
        for operation in storage.load_operations() {
            store.operations.insert(operation.id.clone(), operation);
        }
        store.storage = Some(storage);
        store
    }

    pub fn insert(&mut self, operation: Operation) -> Result<Operation, PayrailError> {
        if let Some(db) = &self.storage {
            db.save_operation(&operation)?;
        }
        self.operations
            .insert(operation.id.clone(), operation.clone());
        Ok(operation)
    }

    pub fn get(&self, id: &str) -> Option<Operation> {
        self.operations.get(id).cloned()
    }

    /// Conditional terminal write: set `executed = true` and record the
    /// outcome only where `executed == false`. An already-executed row is
    /// never overwritten; callers racing here lose with
    /// `PreconditionFailed("already executed")`.
    pub fn complete_execution(
        &mut self,
        id: &str,
        outcome: ExecutionOutcome,
    ) -> Result<Operation, PayrailError> {
        let operation = self
            .operations
            .get_mut(id)
            .ok_or_else(|| PayrailError::NotFound(format!("Operation {} not found", id)))?;

        if operation.executed {
            return Err(PayrailError::PreconditionFailed(
                "already executed".to_string(),
            ));
        }

        let mut snapshot = operation.clone();
        snapshot.executed = true;
        snapshot.user_confirmed = true;
        snapshot.execution_result = Some(outcome);
        snapshot.executed_at = Some(Utc::now());

        // Persist before committing to memory: a failed save must leave
        // the in-memory row matching what a restart would hydrate.
        if let Some(db) = &self.storage {
            db.save_operation(&snapshot)?;
        }
        *operation = snapshot.clone();
        Ok(snapshot)
    }
}
