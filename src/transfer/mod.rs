pub mod ledger;
pub mod types;

pub use ledger::TransferLedger;
pub use types::{Transfer, TransferStatus};
