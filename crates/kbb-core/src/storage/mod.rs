//! Persistent task storage on SQLite
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     SqliteTaskStore                      │
//! ├──────────────────────────────────────────────────────────┤
//! │ tasks (task_id AUTOINCREMENT, name, description,         │
//! │        deadline, status, depends_on JSON, created_at_ms) │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kbb_core::storage::SqliteTaskStore;
//! use kbb_core::task::{NewTask, TaskDefaults, TaskDraft, TaskStore};
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = SqliteTaskStore::open("LTM/tasks.db")?;
//! let draft = TaskDraft {
//!     task_name: "Write release notes".to_string(),
//!     task_description: "Summarize changes since 0.1".to_string(),
//!     task_deadline: None,
//! };
//! let record = store.create_task(NewTask::from_draft(draft, &TaskDefaults::default()))?;
//! assert_eq!(record.task_status, "todo");
//! # Ok(())
//! # }
//! ```

pub mod task_store;

pub use task_store::SqliteTaskStore;
