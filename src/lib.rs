pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod profile;
pub mod recipient;
pub mod rpc;
pub mod storage;
pub mod transfer;
