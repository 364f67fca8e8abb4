use super::types::*;
use crate::error::PayrailError;
use crate::operation::{Operation, OperationPayload};
use crate::recipient::{address, NewRecipient};
use crate::rpc::RpcState;
use crate::transfer::TransferStatus;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, warn};

type HandlerResult = Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)>;

//
// === Helper Functions ===
//

/// Safely acquire a mutex lock, recovering from poison
fn safe_lock<T>(mutex: &Arc<Mutex<T>>) -> Result<MutexGuard<'_, T>, (StatusCode, Json<ErrorBody>)> {
    mutex.lock().map_err(|e| {
        error!("Mutex poisoned: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: "Internal error: mutex poisoned".to_string(),
                code: Some("INTERNAL".to_string()),
            }),
        )
    })
}

/// Map a pipeline error to a status + body. Datastore detail is logged
/// and replaced with a generic message; everything else goes out verbatim.
fn reject(err: PayrailError) -> (StatusCode, Json<ErrorBody>) {
    let (status, body) = match &err {
        PayrailError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            ErrorBody {
                error: err.to_string(),
                code: None,
            },
        ),
        PayrailError::Datastore(detail) => {
            error!("Datastore failure: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal datastore error".to_string(),
                    code: Some("DATASTORE_FAILURE".to_string()),
                },
            )
        }
        PayrailError::Resolver(detail) => {
            warn!("Name resolution failed: {}", detail);
            (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: "Name resolution unavailable".to_string(),
                    code: Some("RESOLVER_UNAVAILABLE".to_string()),
                },
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            ErrorBody {
                error: err.to_string(),
                code: None,
            },
        ),
    };
    (status, Json(body))
}

fn to_json<T: serde::Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| reject(PayrailError::Datastore(e.to_string())))
}

//
// === Profiles ===
//

pub async fn create_profile(
    State(state): State<RpcState>,
    Json(req): Json<CreateProfileRequest>,
) -> HandlerResult {
    let mut profiles = safe_lock(&state.profiles)?;
    let profile = profiles
        .create(&req.display_name, req.wallet_address)
        .map_err(reject)?;
    to_json(&profile)
}

//
// === Recipients ===
//

pub async fn create_recipient(
    State(state): State<RpcState>,
    Json(req): Json<CreateRecipientRequest>,
) -> HandlerResult {
    let mut recipients = safe_lock(&state.recipients)?;
    let recipient = recipients
        .create(
            &req.profile_id,
            NewRecipient {
                name: req.name,
                address: req.address,
                class: req.class,
                bank_details: req.bank_details,
            },
        )
        .map_err(reject)?;
    to_json(&recipient)
}

/// All of a profile's recipients, active and inactive, oldest first.
pub async fn list_recipients(
    State(state): State<RpcState>,
    Query(query): Query<ListRecipientsQuery>,
) -> HandlerResult {
    let recipients = safe_lock(&state.recipients)?;
    to_json(&recipients.list_for_profile(&query.profile_id))
}

/// Recipients are never hard-deleted; this flips the status flag so the
/// record drops out of name resolution.
pub async fn deactivate_recipient(
    State(state): State<RpcState>,
    Json(req): Json<DeactivateRecipientRequest>,
) -> HandlerResult {
    let mut recipients = safe_lock(&state.recipients)?;
    let recipient = recipients
        .deactivate(&req.profile_id, &req.recipient_id)
        .map_err(reject)?;
    to_json(&recipient)
}

/// Recognition check for a free-form counterparty identifier. A valid
/// address (or a name that resolves to one) is looked up against the
/// profile's recipients; no match is a warning, not an error, and the
/// caller may proceed after explicit acknowledgement.
pub async fn check_recipient(
    State(state): State<RpcState>,
    Json(req): Json<CheckRecipientRequest>,
) -> HandlerResult {
    let input = req.input.trim().to_string();

    let (addr, resolved_address) = if address::is_valid_address(&input) {
        (address::normalize(&input), None)
    } else if crate::client::name_resolver::looks_like_domain_name(&input) {
        match state.name_resolver.resolve(&input).await {
            Ok(Some(resolved)) => (resolved.clone(), Some(resolved)),
            Ok(None) => {
                return to_json(&CheckRecipientResponse {
                    recognized: false,
                    recipient: None,
                    resolved_address: None,
                    warning: Some(format!("{} does not resolve to an address", input)),
                })
            }
            Err(e) => {
                warn!("Name resolution failed for {}: {}", input, e);
                return to_json(&CheckRecipientResponse {
                    recognized: false,
                    recipient: None,
                    resolved_address: None,
                    warning: Some("Name resolution unavailable".to_string()),
                });
            }
        }
    } else {
        return Err(reject(PayrailError::Validation(
            "Input is neither a valid address nor a resolvable name".to_string(),
        )));
    };

    let recipients = safe_lock(&state.recipients)?;
    let known = recipients.resolve_by_address(&req.profile_id, &addr);
    let recognized = known.is_some();
    to_json(&CheckRecipientResponse {
        recognized,
        recipient: known,
        resolved_address,
        warning: if recognized {
            None
        } else {
            Some("Unrecognized counterparty: you have not paid this address before".to_string())
        },
    })
}

//
// === Operations ===
//

pub async fn create_operation(
    State(state): State<RpcState>,
    Json(req): Json<CreateOperationRequest>,
) -> HandlerResult {
    let payload = OperationPayload::from_parts(&req.kind, req.data).map_err(reject)?;

    let mut operations = safe_lock(&state.operations)?;
    let operation = operations
        .insert(Operation::new(&req.profile_id, payload))
        .map_err(reject)?;
    to_json(&operation)
}

pub async fn get_operation(
    State(state): State<RpcState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let operations = safe_lock(&state.operations)?;
    match operations.get(&id) {
        Some(operation) => to_json(&operation),
        None => Err(reject(PayrailError::NotFound(format!(
            "Operation {} not found",
            id
        )))),
    }
}

/// Confirmation endpoint: the one path that executes operations. The
/// success flag in the 200 body reflects the handler outcome; the
/// 400/404 statuses cover the executor's precondition failures.
pub async fn confirm_operation(
    State(state): State<RpcState>,
    Json(req): Json<ConfirmOperationRequest>,
) -> HandlerResult {
    let operation_id = match req.operation_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(reject(PayrailError::Validation(
                "operation_id is required".to_string(),
            )))
        }
    };

    let outcome = state
        .executor
        .execute(&operation_id, req.confirmed)
        .map_err(reject)?;
    to_json(&outcome)
}

//
// === Transfers ===
//

/// Manual transfer creation, bypassing the operation pipeline.
pub async fn create_transfer(
    State(state): State<RpcState>,
    Json(req): Json<CreateTransferRequest>,
) -> HandlerResult {
    let (sender, recipient_id, chain, amount, token) = match (
        req.sender_profile_id.as_deref(),
        req.recipient_id.as_deref(),
        req.chain.as_deref(),
        req.amount.as_deref(),
        req.token.as_deref(),
    ) {
        (Some(s), Some(r), Some(c), Some(a), Some(t))
            if !s.is_empty() && !r.is_empty() && !c.is_empty() && !a.is_empty() && !t.is_empty() =>
        {
            (s, r, c, a, t)
        }
        _ => {
            return Err(reject(PayrailError::Validation(
                "Missing required fields".to_string(),
            )))
        }
    };

    {
        let profiles = safe_lock(&state.profiles)?;
        if !profiles.exists(sender) {
            // 400, not 404: the sender id comes from the request body,
            // not the path.
            return Err(reject(PayrailError::Validation(
                "Sender profile not found".to_string(),
            )));
        }
    }

    let recipients = safe_lock(&state.recipients)?;
    let mut ledger = safe_lock(&state.ledger)?;
    let transfer = ledger
        .create(&recipients, sender, recipient_id, chain, amount, token)
        .map_err(reject)?;
    to_json(&transfer)
}

pub async fn get_transfer(State(state): State<RpcState>, Path(id): Path<String>) -> HandlerResult {
    let ledger = safe_lock(&state.ledger)?;
    match ledger.get(&id) {
        Some(transfer) => to_json(&transfer),
        None => Err(reject(PayrailError::NotFound(format!(
            "Transfer {} not found",
            id
        )))),
    }
}

/// Settlement report-back: the external environment marks a pending
/// transfer confirmed or failed.
pub async fn update_transfer_status(
    State(state): State<RpcState>,
    Json(req): Json<UpdateTransferStatusRequest>,
) -> HandlerResult {
    let status: TransferStatus = req.status.parse().map_err(|_| {
        reject(PayrailError::Validation(format!(
            "Unknown transfer status: {}",
            req.status
        )))
    })?;

    let mut ledger = safe_lock(&state.ledger)?;
    let transfer = ledger.update_status(&req.transfer_id, status).map_err(reject)?;
    to_json(&transfer)
}
