//! Knowledge Base Builder Gateway - HTTP front door for the worker agent
//!
//! ```text
//!   Supervisor ──POST /message──►┌──────────────────┐
//!                                │  axum Router     │  content type / JSON checks
//!   Probes ─────GET /health─────►│  (trace, cors,   │  panics → 500
//!                                │   catch-panic)   │
//!                                └────────┬─────────┘
//!                                         │ serde_json::Value
//!                                ┌────────▼─────────┐
//!                                │   WorkerAgent    │  validate, cache, dispatch
//!                                └──────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod gateway;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayState};

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default host
pub const DEFAULT_HOST: &str = "127.0.0.1";
