mod config;
mod error;
mod solve;
mod state;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::post;
use axum::{Router, serve};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};

use paraplan_osrm::OsrmClient;
use paraplan_solver::Solver;

use crate::config::EngineConfig;
use crate::state::AppState;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = EngineConfig::from_env();
    info!(bind = %config.bind_addr, osrm = %config.osrm.base_url, "starting paraplan");

    let state = Arc::new(AppState {
        osrm: OsrmClient::new(config.osrm),
        solver: Solver::new(config.solver),
        geometry_workers: config.geometry_workers,
    });

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/optimization/v1/solve", post(solve::solve_handler))
        .layer(ServiceBuilder::new().layer(cors_layer))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();

    serve(listener, app).await.unwrap();
}
