pub mod handlers;
pub mod types;

use crate::client::NameResolver;
use crate::operation::{OperationExecutor, OperationStore};
use crate::profile::ProfileRegistry;
use crate::recipient::RecipientDirectory;
use crate::transfer::TransferLedger;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct RpcState {
    pub profiles: Arc<Mutex<ProfileRegistry>>,
    pub recipients: Arc<Mutex<RecipientDirectory>>,
    pub ledger: Arc<Mutex<TransferLedger>>,
    pub operations: Arc<Mutex<OperationStore>>,
    pub executor: Arc<OperationExecutor>,
    pub name_resolver: Arc<dyn NameResolver>,
}

pub struct RpcServer {
    state: RpcState,
    bind_addr: String,
}

impl RpcServer {
    pub fn new(state: RpcState, port: u16) -> Self {
        Self {
            state,
            bind_addr: format!("0.0.0.0:{}", port),
        }
    }

    pub fn router(state: RpcState) -> Router {
        Router::new()
            .route("/profiles", post(handlers::create_profile))
            .route(
                "/recipients",
                post(handlers::create_recipient).get(handlers::list_recipients),
            )
            .route("/recipients/check", post(handlers::check_recipient))
            .route("/recipients/deactivate", post(handlers::deactivate_recipient))
            .route("/operations", post(handlers::create_operation))
            .route("/operations/:id", get(handlers::get_operation))
            .route("/operations/confirm", post(handlers::confirm_operation))
            .route("/transfers", post(handlers::create_transfer))
            .route("/transfers/:id", get(handlers::get_transfer))
            .route("/transfers/status", post(handlers::update_transfer_status))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn start(self) {
        let app = Self::router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .expect("Failed to bind RPC server");

        tracing::info!("RPC server listening on {}", self.bind_addr);
        axum::serve(listener, app).await.expect("RPC server failed");
    }
}
