//! Task records
//!
//! A [`TaskDraft`] is what the language model extracts from free text. The
//! agent completes it with [`TaskDefaults`] into a [`NewTask`], and a
//! [`TaskStore`] turns that into a [`TaskRecord`] with a numeric id.

use serde::{Deserialize, Serialize};

/// Status given to freshly created tasks
pub const DEFAULT_TASK_STATUS: &str = "todo";

/// Fields extracted from natural language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub task_name: String,
    pub task_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_deadline: Option<String>,
}

/// Values applied to every new task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefaults {
    /// Initial status (`"todo"`)
    #[serde(default = "default_status")]
    pub task_status: String,

    /// Initial dependencies (none)
    #[serde(default)]
    pub depends_on: Option<Vec<i64>>,
}

fn default_status() -> String {
    DEFAULT_TASK_STATUS.to_string()
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            task_status: default_status(),
            depends_on: None,
        }
    }
}

/// A task ready to be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub task_name: String,
    pub task_description: String,
    pub task_deadline: Option<String>,
    pub task_status: String,
    pub depends_on: Option<Vec<i64>>,
}

impl NewTask {
    pub fn from_draft(draft: TaskDraft, defaults: &TaskDefaults) -> Self {
        Self {
            task_name: draft.task_name,
            task_description: draft.task_description,
            task_deadline: draft.task_deadline,
            task_status: defaults.task_status.clone(),
            depends_on: defaults.depends_on.clone(),
        }
    }
}

/// A stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Auto-incremented by the store
    pub task_id: i64,
    pub task_name: String,
    pub task_description: String,
    pub task_deadline: Option<String>,
    pub task_status: String,
    pub depends_on: Option<Vec<i64>>,
}

impl TaskRecord {
    pub fn from_new(task_id: i64, task: NewTask) -> Self {
        Self {
            task_id,
            task_name: task.task_name,
            task_description: task.task_description,
            task_deadline: task.task_deadline,
            task_status: task.task_status,
            depends_on: task.depends_on,
        }
    }
}

/// Persistent task storage
pub trait TaskStore: Send + Sync {
    /// Insert a task and return it with its generated id
    fn create_task(&self, task: NewTask) -> anyhow::Result<TaskRecord>;

    fn get_task(&self, task_id: i64) -> anyhow::Result<Option<TaskRecord>>;

    /// All tasks, optionally filtered by status, oldest first
    fn list_tasks(&self, status: Option<&str>) -> anyhow::Result<Vec<TaskRecord>>;

    /// Returns false when no such task exists
    fn update_status(&self, task_id: i64, status: &str) -> anyhow::Result<bool>;
}
