// Request/response types for the REST interface.
use crate::recipient::{BankDetails, RecipientClass};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct CreateProfileRequest {
    pub display_name: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateRecipientRequest {
    pub profile_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub class: RecipientClass,
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
}

#[derive(Deserialize, Debug)]
pub struct ListRecipientsQuery {
    pub profile_id: String,
}

#[derive(Deserialize, Debug)]
pub struct DeactivateRecipientRequest {
    pub profile_id: String,
    pub recipient_id: String,
}

#[derive(Deserialize, Debug)]
pub struct CheckRecipientRequest {
    pub profile_id: String,
    /// Free-form: a chain address or a domain-style name.
    pub input: String,
}

#[derive(Serialize, Debug)]
pub struct CheckRecipientResponse {
    pub recognized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<crate::recipient::Recipient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateOperationRequest {
    pub profile_id: String,
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Deserialize, Debug)]
pub struct ConfirmOperationRequest {
    #[serde(default, alias = "operationId")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Deserialize, Debug)]
pub struct CreateTransferRequest {
    #[serde(default)]
    pub sender_profile_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateTransferStatusRequest {
    #[serde(alias = "transactionId")]
    pub transfer_id: String,
    /// "confirmed" or "failed"; transfers never return to pending.
    pub status: String,
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
