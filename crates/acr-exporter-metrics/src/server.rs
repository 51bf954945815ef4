// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! HTTP server for the metrics endpoint
//!
//! Exactly one route, `GET /metrics`, returning the latest snapshot in the
//! Prometheus text format. Every other path is a bodiless `404`.

use acr_exporter_config::ServerConfig;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{MetricsError, MetricsResult};
use crate::exporter_metrics::ExporterMetrics;
use crate::snapshot::SnapshotStore;

/// Content type of the text exposition format
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
struct AppState {
    store: SnapshotStore,
    metrics: Option<ExporterMetrics>,
}

/// HTTP server for the metrics endpoint
#[derive(Clone)]
pub struct MetricsServer {
    store: SnapshotStore,
    metrics: Option<ExporterMetrics>,
    bind_address: String,
}

impl MetricsServer {
    /// Create a server reading from `store` and listening on `bind_address`
    pub fn new(store: SnapshotStore, bind_address: impl Into<String>) -> Self {
        Self {
            store,
            metrics: None,
            bind_address: bind_address.into(),
        }
    }

    /// Create a server from the `[server]` configuration section
    pub fn from_config(store: SnapshotStore, config: &ServerConfig) -> Self {
        Self::new(store, config.bind_addr())
    }

    /// Append exporter self-metrics to every response
    pub fn with_exporter_metrics(mut self, metrics: ExporterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .fallback(not_found_handler)
            .with_state(AppState {
                store: self.store.clone(),
                metrics: self.metrics.clone(),
            })
    }

    /// Bind the configured address and serve until `shutdown` is cancelled
    pub async fn serve(self, shutdown: CancellationToken) -> MetricsResult<()> {
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .map_err(|source| MetricsError::Bind {
                addr: self.bind_address.clone(),
                source,
            })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` is cancelled
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> MetricsResult<()> {
        let addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.bind_address.clone());
        info!("Serving metrics on http://{}/metrics", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(MetricsError::Serve)?;

        info!("Metrics server stopped");
        Ok(())
    }
}

/// Handler for `/metrics`
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.store.read();

    let body = match &state.metrics {
        None => snapshot.to_string(),
        Some(metrics) => {
            let mut body = String::with_capacity(snapshot.len() + 1024);
            body.push_str(&snapshot);
            match metrics.encode() {
                Ok(text) => {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(&text);
                }
                Err(e) => warn!(error = %e, "Failed to encode exporter metrics"),
            }
            body
        }
    };

    debug!(bytes = body.len(), "Serving metrics");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}
