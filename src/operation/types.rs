use crate::error::PayrailError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Payment,
    Analysis,
    Query,
}

/// Kind-specific operation payload. Fields the proposing collaborator may
/// omit are optional here; presence and value checks live in the
/// validator so a malformed proposal can still be stored and later
/// rejected with a meaningful message.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: Option<String>,
    #[serde(default, alias = "recipient_name")]
    pub recipient_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AnalysisPayload {}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct QueryPayload {
    #[serde(default)]
    pub question: Option<String>,
}

/// Tagged union over operation kinds.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OperationPayload {
    Payment(PaymentPayload),
    Analysis(AnalysisPayload),
    Query(QueryPayload),
}

impl OperationPayload {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationPayload::Payment(_) => OperationKind::Payment,
            OperationPayload::Analysis(_) => OperationKind::Analysis,
            OperationPayload::Query(_) => OperationKind::Query,
        }
    }

    /// Build a payload from a kind string and loose JSON data, as
    /// submitted by the proposing collaborator.
    pub fn from_parts(kind: &str, data: serde_json::Value) -> Result<Self, PayrailError> {
        match kind.trim().to_lowercase().as_str() {
            "payment" => serde_json::from_value(data)
                .map(OperationPayload::Payment)
                .map_err(|e| PayrailError::Validation(format!("Invalid payment payload: {}", e))),
            "analysis" => serde_json::from_value(data)
                .map(OperationPayload::Analysis)
                .map_err(|e| PayrailError::Validation(format!("Invalid analysis payload: {}", e))),
            "query" => serde_json::from_value(data)
                .map(OperationPayload::Query)
                .map_err(|e| PayrailError::Validation(format!("Invalid query payload: {}", e))),
            _ => Err(PayrailError::Validation(
                "Unknown operation type".to_string(),
            )),
        }
    }
}

/// Accept `"50"` and `50` interchangeably for the amount field.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "amount must be a string or number, got {}",
                other
            )))
        }
    })
}

/// Terminal outcome of a single execution. Success or failure, this is
/// written into the operation record exactly once.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExecutionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// What the wallet-holding client needs to finalize a payment, plus a
/// user-facing message.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub recipient_address: String,
    pub amount: String,
    pub status: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RecipientActivity {
    pub recipient_id: String,
    pub name: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_transactions: usize,
    pub total_spent: String,
    pub average_transaction: String,
    pub top_recipients: Vec<RecipientActivity>,
}

/// A proposed action awaiting or having undergone execution.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Operation {
    pub id: String,
    pub profile_id: String,
    pub payload: OperationPayload,
    pub user_confirmed: bool,
    pub executed: bool,
    pub execution_result: Option<ExecutionOutcome>,
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Operation {
    pub fn new(profile_id: &str, payload: OperationPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            profile_id: profile_id.to_string(),
            payload,
            user_confirmed: false,
            executed: false,
            execution_result: None,
            executed_at: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_unknown_kind() {
        let err = OperationPayload::from_parts("swap", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation type");
    }

    #[test]
    fn test_payment_amount_accepts_string_or_number() {
        let p = OperationPayload::from_parts(
            "payment",
            json!({"amount": "50", "recipientName": "Nik"}),
        )
        .unwrap();
        let OperationPayload::Payment(p) = p else {
            panic!("expected payment")
        };
        assert_eq!(p.amount.as_deref(), Some("50"));
        assert_eq!(p.recipient_name.as_deref(), Some("Nik"));

        let p = OperationPayload::from_parts("payment", json!({"amount": 25.5})).unwrap();
        let OperationPayload::Payment(p) = p else {
            panic!("expected payment")
        };
        assert_eq!(p.amount.as_deref(), Some("25.5"));
        assert!(p.recipient_name.is_none());
    }

    #[test]
    fn test_analysis_and_query_take_empty_data() {
        assert!(OperationPayload::from_parts("analysis", json!({})).is_ok());
        assert!(OperationPayload::from_parts("query", json!({})).is_ok());
        assert!(
            OperationPayload::from_parts("query", json!({"question": "balance?"})).is_ok()
        );
    }
}
