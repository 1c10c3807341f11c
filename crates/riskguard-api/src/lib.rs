//! HTTP front end — spec.md §6.
//!
//! Generalizes `chronx_rpc::server::RpcServer`'s `Arc<State>` + permissive
//! `tower_http::cors::CorsLayer` shape from JSON-RPC namespace methods to
//! plain REST routes, since the specification calls for path-based HTTP,
//! not an RPC envelope (see DESIGN.md for the full justification).

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use riskguard_broker::JobBroker;
use riskguard_rules::ThresholdHandle;
use riskguard_store::TransactionStore;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub store: Arc<dyn TransactionStore>,
    pub broker: Arc<dyn JobBroker>,
    pub thresholds: Arc<ThresholdHandle>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

    Router::new()
        .route("/api/transaction", post(handlers::submit_transaction))
        .route("/api/simulate-fraud", post(handlers::simulate_fraud))
        .route("/api/transaction/:id", get(handlers::get_transaction))
        .route("/api/risk-details/:id", get(handlers::get_risk_details))
        .route("/api/recent-transactions", get(handlers::recent_transactions))
        .route("/api/system-stats", get(handlers::system_stats))
        .layer(cors)
        .with_state(state)
}
