//! HTTP server for the Prometheus metrics endpoint.

use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 9090).into(),
        }
    }
}

impl MetricsServerConfig {
    /// Creates a config with a custom port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Shared state between the scan loop and the HTTP handlers.
#[derive(Debug)]
pub struct MetricsState {
    registry: MetricsRegistry,
    station: Mutex<Station>,
}

/// What `/health` reports about the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Station {
    scanning: bool,
    live_signals: usize,
}

impl MetricsState {
    fn new(registry: MetricsRegistry) -> Self {
        Self {
            registry,
            station: Mutex::new(Station::default()),
        }
    }

    /// Records a snapshot pushed by the scan loop.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        if let Ok(mut station) = self.station.lock() {
            *station = Station {
                scanning: snapshot.is_scanning,
                live_signals: snapshot.live_signals,
            };
        }
    }

    fn station(&self) -> Station {
        self.station.lock().map(|s| *s).unwrap_or_default()
    }
}

/// HTTP server for exposing Prometheus metrics.
#[derive(Debug)]
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<MetricsState>,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(MetricsState::new(registry)),
        }
    }

    /// Handle for pushing snapshots from the scan loop.
    pub fn state(&self) -> Arc<MetricsState> {
        Arc::clone(&self.state)
    }

    /// Starts the HTTP server and runs until it fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/metrics", get(serve_metrics))
            .route("/health", get(serve_health))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "Metrics server listening"
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

async fn serve_metrics(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Always 200; the body says whether a card is being scanned.
async fn serve_health(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    (StatusCode::OK, health_line(state.station()))
}

fn health_line(station: Station) -> String {
    if station.scanning {
        format!("OK scanning ({}/3 signals live)", station.live_signals)
    } else {
        "OK idle".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9090);
    }

    #[test]
    fn test_config_with_port() {
        let config = MetricsServerConfig::with_port(8080);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_state_updates_shared_registry() {
        let server = MetricsServer::new(
            MetricsServerConfig::default(),
            MetricsRegistry::new().unwrap(),
        );
        let state = server.state();
        state.update(&MetricsSnapshot {
            scans_accepted: 2,
            ..MetricsSnapshot::default()
        });

        let output = server.state.registry.encode().unwrap();
        assert!(output.contains("campus_gate_scans_accepted_total 2"));
    }

    #[test]
    fn test_health_reflects_last_snapshot() {
        let state = MetricsState::new(MetricsRegistry::new().unwrap());
        assert_eq!(health_line(state.station()), "OK idle");

        state.update(&MetricsSnapshot {
            is_scanning: true,
            live_signals: 2,
            ..MetricsSnapshot::default()
        });
        assert_eq!(health_line(state.station()), "OK scanning (2/3 signals live)");
    }
}
