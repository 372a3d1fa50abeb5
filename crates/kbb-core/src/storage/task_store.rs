//! SQLite-backed [`TaskStore`]

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use std::path::Path;

use crate::task::{NewTask, TaskRecord, TaskStore};

const TASK_COLUMNS: &str =
    "task_id, task_name, task_description, task_deadline, task_status, depends_on";

/// Task store over a single SQLite connection
#[derive(Debug)]
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Open (or create) the database in WAL mode. `":memory:"` gives a
    /// private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Creating task DB directory '{}'", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Opening SQLite '{}'", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("Configuring SQLite PRAGMAs")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        tracing::debug!("Task store ready at {}", path.display());
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS tasks (
                task_id          INTEGER PRIMARY KEY AUTOINCREMENT,
                task_name        TEXT NOT NULL,
                task_description TEXT NOT NULL,
                task_deadline    TEXT,
                task_status      TEXT NOT NULL,
                depends_on       TEXT,
                created_at_ms    INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_status
                ON tasks(task_status, task_id);
            ",
            )
            .context("Migrating task schema")?;
        Ok(())
    }

    /// Number of stored tasks
    pub fn count(&self) -> Result<i64> {
        self.conn
            .lock()
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .context("COUNT tasks")
    }
}

fn decode_depends_on(raw: Option<String>) -> rusqlite::Result<Option<Vec<i64>>> {
    match raw {
        None => Ok(None),
        Some(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        task_id: row.get(0)?,
        task_name: row.get(1)?,
        task_description: row.get(2)?,
        task_deadline: row.get(3)?,
        task_status: row.get(4)?,
        depends_on: decode_depends_on(row.get(5)?)?,
    })
}

impl TaskStore for SqliteTaskStore {
    fn create_task(&self, task: NewTask) -> Result<TaskRecord> {
        let depends_on = task
            .depends_on
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Serializing depends_on")?;
        let created_at_ms = chrono::Utc::now().timestamp_millis();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tasks (task_name, task_description, task_deadline, task_status, depends_on, created_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.task_name,
                task.task_description,
                task.task_deadline,
                task.task_status,
                depends_on,
                created_at_ms
            ],
        )
        .context("INSERT tasks")?;

        let task_id = conn.last_insert_rowid();
        tracing::info!("Created task {} '{}'", task_id, task.task_name);
        Ok(TaskRecord::from_new(task_id, task))
    }

    fn get_task(&self, task_id: i64) -> Result<Option<TaskRecord>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            &format!("SELECT {} FROM tasks WHERE task_id = ?1", TASK_COLUMNS),
            params![task_id],
            row_to_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e).context("Query task by id"),
        }
    }

    fn list_tasks(&self, status: Option<&str>) -> Result<Vec<TaskRecord>> {
        let conn = self.conn.lock();
        let tasks = match status {
            Some(status) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM tasks WHERE task_status = ?1 ORDER BY task_id ASC",
                        TASK_COLUMNS
                    ))
                    .context("Prepare list_tasks by status")?;
                let rows = stmt.query_map(params![status], row_to_record)?;
                let collected = rows.collect::<rusqlite::Result<Vec<_>>>();
                collected
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!("SELECT {} FROM tasks ORDER BY task_id ASC", TASK_COLUMNS))
                    .context("Prepare list_tasks")?;
                let rows = stmt.query_map([], row_to_record)?;
                let collected = rows.collect::<rusqlite::Result<Vec<_>>>();
                collected
            }
        };

        tasks.context("Reading task rows")
    }

    fn update_status(&self, task_id: i64, status: &str) -> Result<bool> {
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE tasks SET task_status = ?1 WHERE task_id = ?2",
                params![status, task_id],
            )
            .context("UPDATE tasks status")?;

        if changed > 0 {
            tracing::info!("Task {} moved to '{}'", task_id, status);
        }
        Ok(changed > 0)
    }
}
