use clap::Parser;
use payrail::client::{HttpNameResolver, NameResolver};
use payrail::config::PayrailConfig;
use payrail::operation::{OperationExecutor, OperationStore};
use payrail::profile::ProfileRegistry;
use payrail::recipient::RecipientDirectory;
use payrail::rpc::{RpcServer, RpcState};
use payrail::storage::Storage;
use payrail::transfer::TransferLedger;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "payrail", about = "Operation execution pipeline for assistant-proposed payments")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "payrail.toml")]
    config: String,
    /// Override the RPC port from the config
    #[arg(long)]
    rpc_port: Option<u16>,
    /// Override the database path from the config
    #[arg(long)]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = PayrailConfig::load_or_default(&cli.config);
    if let Some(port) = cli.rpc_port {
        config.server.rpc_port = port;
    }
    if let Some(path) = cli.db_path {
        config.server.db_path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let storage = Arc::new(Storage::new(&config.server.db_path));

    let profiles = Arc::new(Mutex::new(ProfileRegistry::with_storage(storage.clone())));
    let recipients = Arc::new(Mutex::new(RecipientDirectory::with_storage(storage.clone())));
    let ledger = Arc::new(Mutex::new(TransferLedger::with_storage(storage.clone())));
    let operations = Arc::new(Mutex::new(OperationStore::with_storage(storage.clone())));

    let executor = Arc::new(OperationExecutor::new(
        operations.clone(),
        recipients.clone(),
        ledger.clone(),
        &config.payments,
    ));
    let name_resolver: Arc<dyn NameResolver> =
        Arc::new(HttpNameResolver::new(config.payments.resolver_endpoint.clone()));

    let state = RpcState {
        profiles,
        recipients,
        ledger,
        operations,
        executor,
        name_resolver,
    };

    RpcServer::new(state, config.server.rpc_port).start().await;
}
