use crate::error::PayrailError;
use rocksdb::{Options, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// RocksDB-backed persistence. Entity stores hold an `Option<Arc<Storage>>`
/// and write through on every mutation; on startup they hydrate from the
/// matching key prefix. Rows are stored as JSON: execution results embed
/// free-form `serde_json::Value` payloads, which do not survive a
/// non-self-describing encoding.
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    pub fn new(path: &str) -> Self {
        let path = Path::new(path);
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path).unwrap();
        Storage { db: Arc::new(db) }
    }

    // Generic Helper: Put
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PayrailError> {
        let serialized =
            serde_json::to_vec(value).map_err(|e| PayrailError::Datastore(e.to_string()))?;
        self.db
            .put(key.as_bytes(), serialized)
            .map_err(|e| PayrailError::Datastore(e.to_string()))
    }

    // Generic Helper: Get
    pub fn get<T: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<T>, PayrailError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(data)) => {
                let deserialized = serde_json::from_slice(&data)
                    .map_err(|e| PayrailError::Datastore(e.to_string()))?;
                Ok(Some(deserialized))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(PayrailError::Datastore(e.to_string())),
        }
    }

    /// Scan all values under a key prefix. Undecodable rows are skipped
    /// with a warning rather than failing the whole load.
    pub fn get_by_prefix<T: for<'a> Deserialize<'a>>(&self, prefix: &str) -> Vec<T> {
        let mut out = Vec::new();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = match item {
                Ok(kv) => kv,
                Err(e) => {
                    tracing::warn!("Prefix scan error under {}: {}", prefix, e);
                    continue;
                }
            };
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            match serde_json::from_slice(&value) {
                Ok(v) => out.push(v),
                Err(e) => tracing::warn!("Skipping undecodable row under {}: {}", prefix, e),
            }
        }
        out
    }

    // --- Specific Accessors ---

    pub fn save_profile(&self, profile: &crate::profile::Profile) -> Result<(), PayrailError> {
        self.put(&format!("profile:{}", profile.id), profile)
    }

    pub fn load_profiles(&self) -> Vec<crate::profile::Profile> {
        self.get_by_prefix("profile:")
    }

    pub fn save_recipient(
        &self,
        recipient: &crate::recipient::Recipient,
    ) -> Result<(), PayrailError> {
        self.put(&format!("recipient:{}", recipient.id), recipient)
    }

    pub fn load_recipients(&self) -> Vec<crate::recipient::Recipient> {
        self.get_by_prefix("recipient:")
    }

    pub fn save_transfer(&self, transfer: &crate::transfer::Transfer) -> Result<(), PayrailError> {
        self.put(&format!("transfer:{}", transfer.id), transfer)
    }

    pub fn load_transfers(&self) -> Vec<crate::transfer::Transfer> {
        let mut transfers: Vec<crate::transfer::Transfer> = self.get_by_prefix("transfer:");
        // Prefix order is lexicographic on id; the ledger wants creation order.
        transfers.sort_by_key(|t| t.created_at);
        transfers
    }

    pub fn save_operation(
        &self,
        operation: &crate::operation::Operation,
    ) -> Result<(), PayrailError> {
        self.put(&format!("operation:{}", operation.id), operation)
    }

    pub fn load_operations(&self) -> Vec<crate::operation::Operation> {
        self.get_by_prefix("operation:")
    }
}
