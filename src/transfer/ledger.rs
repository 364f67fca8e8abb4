//! Transfer Ledger: creation and lifecycle of transfer records.

use super::types::{Transfer, TransferStatus};
use crate::error::PayrailError;
use crate::recipient::RecipientDirectory;
use crate::storage::Storage;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Default)]
pub struct TransferLedger {
    /// Creation order, oldest first.
    transfers: VecDeque<Transfer>,

    #[serde(skip)]
    storage: Option<Arc<Storage>>,
}

impl TransferLedger {
    pub fn new() -> Self {
        Self {
            transfers: VecDeque::new(),
            storage: None,
        }
    }

    /// Create with storage backend, hydrating existing rows in creation order.
    pub fn with_storage(storage: Arc<Storage>) -> Self {
        let mut ledger = Self::new();
        for transfer in storage.load_transfers() {
            ledger.transfers.push_back(transfer);
        }
        ledger.storage = Some(storage);
        ledger
    }

    /// Record a pending transfer. The recipient must exist and belong to
    /// the sender; a recipient owned by a different profile is rejected
    /// with the same message as a missing one, so the check never leaks
    /// cross-profile existence.
    pub fn create(
        &mut self,
        directory: &RecipientDirectory,
        sender_profile_id: &str,
        recipient_id: &str,
        chain: &str,
        amount: &str,
        token: &str,
    ) -> Result<Transfer, PayrailError> {
        let owned = directory
            .get(recipient_id)
            .map(|r| r.profile_id == sender_profile_id)
            .unwrap_or(false);
        if !owned {
            return Err(PayrailError::InvalidRecipient(format!(
                "Recipient {} not found for sender",
                recipient_id
            )));
        }

        let amount = amount.trim();
        match Decimal::from_str(amount) {
            Ok(d) if d > Decimal::ZERO => {}
            _ => {
                return Err(PayrailError::InvalidAmount(
                    "Transfer amount must be a positive decimal".to_string(),
                ));
            }
        }

        let transfer = Transfer {
            id: uuid::Uuid::new_v4().to_string(),
            sender_profile_id: sender_profile_id.to_string(),
            recipient_id: recipient_id.to_string(),
            chain: chain.to_string(),
            amount: amount.to_string(),
            token: token.to_string(),
            status: TransferStatus::Pending,
            created_at: Utc::now(),
        };

        if let Some(db) = &self.storage {
            db.save_transfer(&transfer)?;
        }
        self.transfers.push_back(transfer.clone());

        tracing::info!(
            "Transfer {} recorded: {} {} on {} from {} to recipient {}",
            transfer.id,
            transfer.amount,
            transfer.token,
            transfer.chain,
            sender_profile_id,
            recipient_id
        );
        Ok(transfer)
    }

    pub fn get(&self, id: &str) -> Option<Transfer> {
        self.transfers.iter().find(|t| t.id == id).cloned()
    }

    /// Up to `limit` most recent transfers sent by a profile, newest first.
    pub fn recent_for_sender(&self, profile_id: &str, limit: usize) -> Vec<Transfer> {
        self.transfers
            .iter()
            .rev()
            .filter(|t| t.sender_profile_id == profile_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Settlement report-back path. Transitions are one-directional:
    /// `pending -> confirmed` or `pending -> failed`, exactly once.
    pub fn update_status(
        &mut self,
        id: &str,
        new_status: TransferStatus,
    ) -> Result<Transfer, PayrailError> {
        let transfer = self
            .transfers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PayrailError::NotFound(format!("Transfer {} not found", id)))?;

        if new_status == TransferStatus::Pending {
            return Err(PayrailError::InvalidStateTransition(
                "Transfers cannot return to pending".to_string(),
            ));
        }
        if transfer.status != TransferStatus::Pending {
            return Err(PayrailError::InvalidStateTransition(format!(
                "Transfer {} has already left pending",
                id
            )));
        }

        // Persist first, then commit to memory.
        let mut snapshot = transfer.clone();
        snapshot.status = new_status;
        if let Some(db) = &self.storage {
            db.save_transfer(&snapshot)?;
        }
        *transfer = snapshot.clone();
        Ok(snapshot)
    }
}
