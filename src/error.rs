use thiserror::Error;

/// Error taxonomy for the execution pipeline. Validation, NotFound and
/// PreconditionFailed messages are surfaced to the caller verbatim;
/// Datastore detail is logged server-side and replaced with a generic
/// message at the HTTP boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayrailError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
    #[error("Ambiguous recipient: {0}")]
    AmbiguousRecipient(String),
    #[error("Datastore error: {0}")]
    Datastore(String),
    #[error("Name resolution failed: {0}")]
    Resolver(String),
}
