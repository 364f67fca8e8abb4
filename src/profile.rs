//! Profile registry
//!
//! Minimal store of the profiles that own recipients, transfers and
//! operations. The manual transfer path rejects senders that are not
//! registered here.

use crate::error::PayrailError;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, Profile>,

    #[serde(skip)]
    storage: Option<Arc<Storage>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            storage: None,
        }
    }

    /// Create with storage backend, hydrating existing rows.
    pub fn with_storage(storage: Arc<Storage>) -> Self {
        let mut registry = Self::new();
        for profile in storage.load_profiles() {
            registry.profiles.insert(profile.id.clone(), profile);
        }
        registry.storage = Some(storage);
        registry
    }

    pub fn create(
        &mut self,
        display_name: &str,
        wallet_address: Option<String>,
    ) -> Result<Profile, PayrailError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(PayrailError::Validation(
                "Profile display name is required".to_string(),
            ));
        }

        let profile = Profile {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            wallet_address,
            created_at: Utc::now(),
        };

        if let Some(db) = &self.storage {
            db.save_profile(&profile)?;
        }
        self.profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.profiles.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let mut registry = ProfileRegistry::new();
        let profile = registry.create("Daniel", Some("0xabc".to_string())).unwrap();
        assert!(registry.exists(&profile.id));
        assert_eq!(registry.get(&profile.id).unwrap().display_name, "Daniel");
        assert!(!registry.exists("missing"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut registry = ProfileRegistry::new();
        assert!(registry.create("   ", None).is_err());
    }
}
