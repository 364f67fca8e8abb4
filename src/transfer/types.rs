use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Confirmed,
    Failed,
}

impl std::str::FromStr for TransferStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TransferStatus::Pending),
            "confirmed" => Ok(TransferStatus::Confirmed),
            "failed" => Ok(TransferStatus::Failed),
            _ => Err(()),
        }
    }
}

/// A recorded intent to move funds. The pipeline only ever creates these
/// in `pending`; the external settlement environment reports the terminal
/// status back through the update path.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Transfer {
    pub id: String,
    pub sender_profile_id: String,
    pub recipient_id: String,
    pub chain: String,
    /// Decimal string, validated positive at creation.
    pub amount: String,
    pub token: String,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}
