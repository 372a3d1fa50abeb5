//! HTTP transport for the worker agent
//!
//! | Route           | Behavior                                           |
//! |-----------------|----------------------------------------------------|
//! | `POST /message` | Request envelope in, response envelope out (200)   |
//! | `GET /health`   | Fixed "ready" envelope, bypasses validation/cache  |
//! | `GET /`         | Service metadata                                   |
//!
//! Transport failures (wrong content type, unparsable body, panics) are
//! answered with plain `{error, details}` bodies instead of envelopes.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use kbb_agent::WorkerAgent;

use crate::config::GatewayConfig;
use crate::{GatewayError, Result};

/// Gateway state shared across handlers
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub agent: Arc<WorkerAgent>,
}

/// Main gateway
#[derive(Debug)]
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Wrap an already built agent
    pub fn new(config: GatewayConfig, agent: WorkerAgent) -> Self {
        Self {
            state: Arc::new(GatewayState {
                config,
                agent: Arc::new(agent),
            }),
        }
    }

    /// Build the agent described by `config` and wrap it
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let agent = WorkerAgent::from_settings(&config.agent, &config.llm)
            .map_err(|e| GatewayError::AgentInit(format!("{:#}", e)))?;
        Ok(Self::new(config, agent))
    }

    /// Get gateway state
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/", get(Self::handle_index))
            .route("/message", post(Self::handle_message))
            .route("/health", get(Self::handle_health))
            .layer(CatchPanicLayer::custom(Self::handle_panic))
            .layer(CorsLayer::permissive());

        let router = if self.state.config.tracing {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        };

        router.with_state(self.state.clone())
    }

    /// Start the gateway server
    pub async fn start(&self) -> Result<()> {
        let addr = self.state.config.socket_addr().await?;
        let router = self.build_router();

        tracing::info!(
            "{} listening on {} (intents: {:?})",
            self.state.agent.agent_name(),
            addr,
            self.state.agent.supported_intents()
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    // HTTP handlers

    async fn handle_message(
        State(state): State<Arc<GatewayState>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        if !is_json_content_type(&headers) {
            return transport_error(
                StatusCode::BAD_REQUEST,
                "Content-Type must be application/json",
                None,
            );
        }

        let value: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Invalid JSON in request: {}", e);
                return transport_error(
                    StatusCode::BAD_REQUEST,
                    "Invalid JSON format",
                    Some(e.to_string()),
                );
            }
        };

        let envelope = state.agent.handle_value(&value).await;
        (StatusCode::OK, Json(envelope)).into_response()
    }

    async fn handle_health(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
        Json(state.agent.health(None))
    }

    async fn handle_index(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
        let agent = &state.agent;
        Json(json!({
            "service": format!("{} API", agent.agent_name()),
            "version": crate::VERSION,
            "agent_name": agent.agent_name(),
            "supervisor_id": agent.supervisor_id(),
            "variant": state.config.agent.variant,
            "intents": agent.supported_intents(),
            "endpoints": {
                "POST /message": "Handle Supervisor request envelopes",
                "GET /health": "Health check endpoint",
            }
        }))
    }

    fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
        let details = if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = panic.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "unknown panic".to_string()
        };

        tracing::error!("Error processing message: {}", details);
        transport_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            Some(details),
        )
    }
}

/// `application/json`, optionally with parameters (`; charset=utf-8`)
fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

fn transport_error(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Gateway shutdown initiated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type(&headers("application/json")));
        assert!(is_json_content_type(&headers("Application/JSON; charset=utf-8")));
        assert!(!is_json_content_type(&headers("text/plain")));
        assert!(!is_json_content_type(&HeaderMap::new()));
    }

    #[test]
    fn test_panic_payloads() {
        let response = Gateway::handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = Gateway::handle_panic(Box::new(42_u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
