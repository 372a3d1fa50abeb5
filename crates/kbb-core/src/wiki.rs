//! Wiki document storage
//!
//! The wiki is a single text document kept on disk. Updates either replace it
//! or append to it, and every update is written through before it is visible
//! in memory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Metadata key selecting the update mode
pub const UPDATE_MODE_KEY: &str = "update_mode";

/// How new text is combined with the current document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Replace the whole document
    #[default]
    Overwrite,
    /// Add after the existing content
    Append,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Overwrite => "overwrite",
            UpdateMode::Append => "append",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Some(UpdateMode::Overwrite),
            "append" => Some(UpdateMode::Append),
            _ => None,
        }
    }

    /// Combine `existing` and `update`.
    ///
    /// Append inserts one `\n` when `existing` is non-empty and does not
    /// already end with a newline.
    pub fn apply(&self, existing: &str, update: &str) -> String {
        match self {
            UpdateMode::Overwrite => update.to_string(),
            UpdateMode::Append if existing.is_empty() => update.to_string(),
            UpdateMode::Append => {
                let mut combined = String::with_capacity(existing.len() + update.len() + 1);
                combined.push_str(existing);
                if !existing.ends_with('\n') {
                    combined.push('\n');
                }
                combined.push_str(update);
                combined
            }
        }
    }
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defaults for wiki requests that leave options out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WikiDefaults {
    /// Mode used when `update_mode` is absent or unrecognized (`overwrite`)
    #[serde(default)]
    pub update_mode: UpdateMode,
}

impl WikiDefaults {
    /// Resolve the effective mode from request metadata
    pub fn resolve_mode(&self, metadata: &Map<String, Value>) -> UpdateMode {
        metadata
            .get(UPDATE_MODE_KEY)
            .and_then(Value::as_str)
            .and_then(UpdateMode::parse)
            .unwrap_or(self.update_mode)
    }
}

/// Outcome of a wiki update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiUpdate {
    pub update_mode: UpdateMode,

    /// Character count of the resulting document
    pub wiki_size: usize,
}

/// File-backed wiki document
#[derive(Debug)]
pub struct WikiStore {
    path: PathBuf,
    content: String,
}

impl WikiStore {
    /// Open the wiki at `path`, starting empty when the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = if path.exists() {
            std::fs::read_to_string(&path)?
        } else {
            String::new()
        };

        tracing::debug!(
            "Opened wiki at {} ({} characters)",
            path.display(),
            content.chars().count()
        );

        Ok(Self { path, content })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Apply an update and persist it. On write failure the in-memory
    /// document is left unchanged.
    pub fn update(&mut self, text: &str, mode: UpdateMode) -> Result<WikiUpdate> {
        let updated = mode.apply(&self.content, text);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, &updated)?;

        let wiki_size = updated.chars().count();
        self.content = updated;

        Ok(WikiUpdate {
            update_mode: mode,
            wiki_size,
        })
    }
}
