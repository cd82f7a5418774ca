//! HTTP metrics endpoint
//!
//! Serves two JSON routes on the metrics port: `/metrics` with the key
//! count and hit/miss counters, and `/insights` with a snapshot of live
//! keys and values.

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use atomkv_core::store::Store;

/// Body of `GET /metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub keys: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Clone)]
struct MetricsState {
    store: Store,
}

async fn metrics_handler(State(state): State<MetricsState>) -> Json<MetricsSnapshot> {
    Json(MetricsSnapshot {
        keys: state.store.len(),
        hits: state.store.hits(),
        misses: state.store.misses(),
    })
}

async fn insights_handler(State(state): State<MetricsState>) -> Json<serde_json::Value> {
    let mut object = serde_json::Map::new();
    for (key, value) in state.store.entries() {
        object.insert(key, serde_json::Value::String(value));
    }
    Json(serde_json::Value::Object(object))
}

fn router(state: MetricsState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/insights", get(insights_handler))
        .with_state(state)
}

/// HTTP server exposing operational metrics
pub struct MetricsServer {
    state: MetricsState,
    address: SocketAddr,
}

impl MetricsServer {
    pub fn new(store: Store, address: SocketAddr) -> Self {
        Self {
            state: MetricsState { store },
            address,
        }
    }

    /// Run the metrics HTTP server until the shutdown signal fires
    pub async fn run_with_shutdown(
        &self,
        mut shutdown_rx: watch::Receiver<()>,
    ) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.address).await?;
        info!(address = %self.address, "metrics endpoint listening");

        let shutdown = async move {
            let _ = shutdown_rx.changed().await;
            info!("metrics endpoint shutting down");
        };

        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
