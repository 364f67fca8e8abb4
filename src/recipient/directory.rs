//! Recipient Directory: profile-scoped counterparty records and resolution.

use super::address;
use super::types::{NewRecipient, Recipient, RecipientClass, RecipientStatus};
use crate::error::PayrailError;
use crate::storage::Storage;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct RecipientDirectory {
    recipients: HashMap<String, Recipient>,

    #[serde(skip)]
    storage: Option<Arc<Storage>>,
}

impl RecipientDirectory {
    pub fn new() -> Self {
        Self {
            recipients: HashMap::new(),
            storage: None,
        }
    }

    /// Create with storage backend, hydrating existing rows.
    pub fn with_storage(storage: Arc<Storage>) -> Self {
        let mut directory = Self::new();
        for recipient in storage.load_recipients() {
            directory.recipients.insert(recipient.id.clone(), recipient);
        }
        directory.storage = Some(storage);
        directory
    }

    /// Add a recipient for a profile. Crypto recipients must carry a
    /// syntactically valid settlement address; bank details are stored
    /// verbatim.
    pub fn create(
        &mut self,
        profile_id: &str,
        attrs: NewRecipient,
    ) -> Result<Recipient, PayrailError> {
        let name = attrs.name.trim();
        if name.is_empty() {
            return Err(PayrailError::Validation(
                "Recipient name is required".to_string(),
            ));
        }

        let stored_address = match attrs.class {
            RecipientClass::Crypto => {
                let raw = attrs.address.as_deref().unwrap_or("");
                if !address::is_valid_address(raw.trim()) {
                    return Err(PayrailError::Validation(
                        "Invalid recipient address".to_string(),
                    ));
                }
                Some(address::normalize(raw))
            }
            RecipientClass::Bank => attrs.address.map(|a| address::normalize(&a)),
        };

        let recipient = Recipient {
            id: uuid::Uuid::new_v4().to_string(),
            profile_id: profile_id.to_string(),
            name: name.to_string(),
            address: stored_address,
            class: attrs.class,
            bank_details: attrs.bank_details,
            status: RecipientStatus::Active,
            created_at: Utc::now(),
        };

        if let Some(db) = &self.storage {
            db.save_recipient(&recipient)?;
        }
        self.recipients
            .insert(recipient.id.clone(), recipient.clone());

        tracing::info!(
            "Recipient {} added for profile {}",
            recipient.id,
            profile_id
        );
        Ok(recipient)
    }

    pub fn get(&self, id: &str) -> Option<&Recipient> {
        self.recipients.get(id)
    }

    /// Case-insensitive name resolution over the profile's active
    /// recipients. Exact matches win; substring matches are the fallback.
    /// Returns every match so the caller can distinguish none/one/many.
    pub fn resolve_by_name(&self, profile_id: &str, name: &str) -> Vec<Recipient> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<&Recipient> = self
            .recipients
            .values()
            .filter(|r| r.profile_id == profile_id && r.is_active())
            .collect();

        let exact: Vec<Recipient> = candidates
            .iter()
            .filter(|r| r.name.to_lowercase() == needle)
            .map(|r| (*r).clone())
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        candidates
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .map(|r| (*r).clone())
            .collect()
    }

    /// Recognition check: does this address belong to a known recipient of
    /// the profile? `None` means "unrecognized counterparty", which is a
    /// warning for the caller, not an error.
    pub fn resolve_by_address(&self, profile_id: &str, addr: &str) -> Option<Recipient> {
        let needle = address::normalize(addr);
        self.recipients
            .values()
            .find(|r| {
                r.profile_id == profile_id
                    && r.address.as_deref() == Some(needle.as_str())
            })
            .cloned()
    }

    /// Flip status to inactive. Recipients are never hard-deleted.
    pub fn deactivate(&mut self, profile_id: &str, id: &str) -> Result<Recipient, PayrailError> {
        let recipient = self
            .recipients
            .get_mut(id)
            .filter(|r| r.profile_id == profile_id)
            .ok_or_else(|| PayrailError::NotFound(format!("Recipient {} not found", id)))?;

        // Persist first, then commit to memory.
        let mut snapshot = recipient.clone();
        snapshot.status = RecipientStatus::Inactive;
        if let Some(db) = &self.storage {
            db.save_recipient(&snapshot)?;
        }
        *recipient = snapshot.clone();
        Ok(snapshot)
    }

    pub fn list_for_profile(&self, profile_id: &str) -> Vec<Recipient> {
        let mut list: Vec<Recipient> = self
            .recipients
            .values()
            .filter(|r| r.profile_id == profile_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipient::types::BankDetails;

    const ADDR_A: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
    const ADDR_B: &str = "0xde709f2102306220921060314715629080e2fb77";

    fn crypto(name: &str, addr: &str) -> NewRecipient {
        NewRecipient {
            name: name.to_string(),
            address: Some(addr.to_string()),
            class: RecipientClass::Crypto,
            bank_details: None,
        }
    }

    #[test]
    fn test_create_validates_crypto_address() {
        let mut dir = RecipientDirectory::new();
        assert!(dir.create("p1", crypto("Nik", "not-an-address")).is_err());
        let r = dir.create("p1", crypto("Nik", ADDR_A)).unwrap();
        // Stored lowercase
        assert_eq!(
            r.address.as_deref(),
            Some("0x52908400098527886e0f7030069857d2e4169ee7")
        );
    }

    #[test]
    fn test_bank_details_stored_verbatim() {
        let mut dir = RecipientDirectory::new();
        let r = dir
            .create(
                "p1",
                NewRecipient {
                    name: "Acme GmbH".to_string(),
                    address: None,
                    class: RecipientClass::Bank,
                    bank_details: Some(BankDetails {
                        country: "DE".to_string(),
                        currency: "EUR".to_string(),
                        account_number: "DE89370400440532013000".to_string(),
                    }),
                },
            )
            .unwrap();
        assert_eq!(r.bank_details.unwrap().country, "DE");
        assert!(r.address.is_none());
    }

    #[test]
    fn test_resolve_by_name_case_insensitive_and_scoped() {
        let mut dir = RecipientDirectory::new();
        dir.create("p1", crypto("Nik", ADDR_A)).unwrap();
        dir.create("p2", crypto("Nik", ADDR_B)).unwrap();

        let matches = dir.resolve_by_name("p1", "nIk");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].profile_id, "p1");

        assert!(dir.resolve_by_name("p3", "Nik").is_empty());
    }

    #[test]
    fn test_exact_match_beats_substring() {
        let mut dir = RecipientDirectory::new();
        dir.create("p1", crypto("Nik", ADDR_A)).unwrap();
        dir.create("p1", crypto("Nikita", ADDR_B)).unwrap();

        let matches = dir.resolve_by_name("p1", "Nik");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Nik");

        // Substring fallback still finds both for a partial needle
        let matches = dir.resolve_by_name("p1", "ni");
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_inactive_recipients_excluded_from_resolution() {
        let mut dir = RecipientDirectory::new();
        let r = dir.create("p1", crypto("Nik", ADDR_A)).unwrap();
        dir.deactivate("p1", &r.id).unwrap();
        assert!(dir.resolve_by_name("p1", "Nik").is_empty());
        // Record still exists
        assert!(dir.get(&r.id).is_some());
    }

    #[test]
    fn test_deactivate_is_profile_scoped() {
        let mut dir = RecipientDirectory::new();
        let r = dir.create("p1", crypto("Nik", ADDR_A)).unwrap();
        assert!(dir.deactivate("p2", &r.id).is_err());
    }

    #[test]
    fn test_list_for_profile_scoped_and_ordered() {
        let mut dir = RecipientDirectory::new();
        let first = dir.create("p1", crypto("Ana", ADDR_A)).unwrap();
        let second = dir.create("p1", crypto("Nik", ADDR_B)).unwrap();
        dir.create("p2", crypto("Ola", ADDR_A)).unwrap();
        dir.deactivate("p1", &second.id).unwrap();

        let list = dir.list_for_profile("p1");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, first.id);
        // Inactive records stay listed
        assert_eq!(list[1].id, second.id);
        assert!(!list[1].is_active());
    }

    #[test]
    fn test_deactivation_survives_restart() {
        let dir = std::env::temp_dir().join(format!("payrail-dir-{}", uuid::Uuid::new_v4()));
        let path = dir.to_str().unwrap().to_string();

        let recipient_id = {
            let storage = Arc::new(crate::storage::Storage::new(&path));
            let mut directory = RecipientDirectory::with_storage(storage);
            let r = directory.create("p1", crypto("Nik", ADDR_A)).unwrap();
            directory.deactivate("p1", &r.id).unwrap();
            r.id
        };

        // Rehydrate as a restarted process would
        let storage = Arc::new(crate::storage::Storage::new(&path));
        let directory = RecipientDirectory::with_storage(storage);
        assert!(!directory.get(&recipient_id).unwrap().is_active());
        assert!(directory.resolve_by_name("p1", "Nik").is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_resolve_by_address_case_insensitive() {
        let mut dir = RecipientDirectory::new();
        dir.create("p1", crypto("Nik", ADDR_A)).unwrap();

        assert!(dir.resolve_by_address("p1", &ADDR_A.to_uppercase().replace("0X", "0x")).is_some());
        assert!(dir.resolve_by_address("p1", ADDR_B).is_none());
        // Scoped to the owning profile
        assert!(dir.resolve_by_address("p2", ADDR_A).is_none());
    }
}
