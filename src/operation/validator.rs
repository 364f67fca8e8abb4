//! Operation Validator: pure, kind-specific payload checks.

use super::types::OperationPayload;
use crate::error::PayrailError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Pass/fail verdict on a payload. No side effects.
pub fn validate(payload: &OperationPayload) -> Result<(), PayrailError> {
    match payload {
        OperationPayload::Payment(p) => {
            let amount = p.amount.as_deref().map(str::trim).filter(|s| !s.is_empty());
            let recipient = p
                .recipient_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty());

            let amount = match (amount, recipient) {
                (Some(a), Some(_)) => a,
                _ => {
                    return Err(PayrailError::Validation(
                        "Payment requires amount and recipient".to_string(),
                    ))
                }
            };

            match Decimal::from_str(amount) {
                Ok(d) if d > Decimal::ZERO => Ok(()),
                _ => Err(PayrailError::Validation(
                    "Invalid payment amount".to_string(),
                )),
            }
        }
        OperationPayload::Analysis(_) | OperationPayload::Query(_) => Ok(()),
    }
}
