//! Knowledge Base Builder Core - protocol and persistence for the worker agent
//!
//! The worker answers Supervisor requests. Every request passes through the
//! same stages, each owned by one module here:
//!
//! ```text
//! raw JSON ──► protocol::EnvelopeValidator ──► RequestEnvelope
//!                                                   │
//!              fingerprint::Fingerprinter ◄─────────┘
//!                        │
//!              cache::ResponseCache (hit? return) ──► intent handler
//!                                                     (task / wiki)
//!                        │
//!              protocol::EnvelopeAssembler ──► ResponseEnvelope
//! ```
//!
//! Handlers and the pipeline itself live in `kbb-agent`; this crate holds
//! the types and storage they share.
//!
//! # Quick Start
//!
//! ```
//! use kbb_core::protocol::{EnvelopeValidator, Intent};
//! use kbb_core::ErrorCode;
//!
//! let validator = EnvelopeValidator::new(
//!     "KnowledgeBaseBuilderAgent",
//!     [Intent::UpdateWiki, Intent::HealthCheck],
//! );
//!
//! let rejection = validator
//!     .validate_str(r#"{"request_id": "r-1", "agent_name": "Other"}"#)
//!     .unwrap_err();
//! assert_eq!(rejection.code(), ErrorCode::MissingField);
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod protocol;
pub mod storage;
pub mod task;
pub mod wiki;

pub use cache::{CacheEntry, ResponseCache};
pub use error::{CoreError, ErrorCode, Result};
pub use fingerprint::{Fingerprint, Fingerprinter};
pub use protocol::{
    EnvelopeAssembler, EnvelopeValidator, Intent, Output, Rejection, RequestEnvelope,
    ResponseEnvelope, ResponseStatus,
};
pub use storage::SqliteTaskStore;
pub use task::{NewTask, TaskDefaults, TaskDraft, TaskRecord, TaskStore};
pub use wiki::{UpdateMode, WikiDefaults, WikiStore};

/// Name the worker answers to unless configured otherwise
pub const DEFAULT_AGENT_NAME: &str = "KnowledgeBaseBuilderAgent";

/// Supervisor this worker reports to
pub const DEFAULT_SUPERVISOR_ID: &str = "SupervisorAgent_Main";

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
