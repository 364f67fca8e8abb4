pub mod address;
pub mod directory;
pub mod types;

pub use directory::RecipientDirectory;
pub use types::{BankDetails, NewRecipient, Recipient, RecipientClass, RecipientStatus};
