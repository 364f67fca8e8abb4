use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecipientClass {
    Crypto,
    Bank,
}

impl Default for RecipientClass {
    fn default() -> Self {
        RecipientClass::Crypto
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Active,
    Inactive,
}

/// Bank coordinates stored verbatim; no external validation is performed.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BankDetails {
    pub country: String,
    pub currency: String,
    pub account_number: String,
}

/// A counterparty known to a profile. Never shared across profiles and
/// never hard-deleted; removal flips `status` to inactive.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Recipient {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    /// External settlement address (chain address). Required for crypto
    /// recipients, absent for bank recipients.
    pub address: Option<String>,
    pub class: RecipientClass,
    pub bank_details: Option<BankDetails>,
    pub status: RecipientStatus,
    pub created_at: DateTime<Utc>,
}

impl Recipient {
    pub fn is_active(&self) -> bool {
        self.status == RecipientStatus::Active
    }
}

/// Attributes for creating a recipient.
#[derive(Deserialize, Clone, Debug)]
pub struct NewRecipient {
    pub name: String,
    pub address: Option<String>,
    #[serde(default)]
    pub class: RecipientClass,
    pub bank_details: Option<BankDetails>,
}
