//! Knowledge Base Builder Agent - the worker behind the Supervisor protocol
//!
//! A [`WorkerAgent`] takes raw request bodies, validates them, serves repeats
//! from the response cache and dispatches the rest to the deployment's
//! primary handler:
//!
//! - **tasks**: `create_task` extracts a task from free text with a
//!   chat-completion model ([`llm`]) and stores it in SQLite.
//! - **wiki**: `update_wiki` overwrites or appends to a text document.
//!
//! Both variants also answer `health_check`.
//!
//! # Example
//!
//! ```no_run
//! use kbb_agent::{AgentSettings, AgentVariant, LlmSettings, WorkerAgent};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = AgentSettings::new()
//!     .with_variant(AgentVariant::Wiki)
//!     .with_data_dir("LTM");
//! let agent = WorkerAgent::from_settings(&settings, &LlmSettings::default())?;
//!
//! let response = agent
//!     .handle_message(
//!         r##"{"request_id":"t1","agent_name":"KnowledgeBaseBuilderAgent",
//!             "intent":"update_wiki","input":{"text":"# Wiki"},
//!             "context":{"user_id":"u1"}}"##,
//!     )
//!     .await;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod llm;
pub mod worker;

pub use config::{AgentSettings, AgentVariant, LlmSettings};
pub use dispatcher::{IntentDispatcher, PrimaryHandler};
pub use handlers::{HandlerError, HandlerResult, IntentHandler};
pub use llm::{LlmChatClient, LlmTaskExtractor, OpenAICompatibleClient, TaskExtractor};
pub use worker::{tasks_handler, WorkerAgent};
