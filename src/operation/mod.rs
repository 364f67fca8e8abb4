pub mod executor;
pub mod store;
pub mod types;
pub mod validator;

pub use executor::OperationExecutor;
pub use store::OperationStore;
pub use types::{
    AnalysisPayload, AnalysisSummary, ExecutionOutcome, Operation, OperationKind,
    OperationPayload, PaymentPayload, PaymentReceipt, QueryPayload, RecipientActivity,
};
