//! Turning a model completion into a [`TaskDraft`]

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use kbb_core::TaskDraft;

/// Longest stored name or description, in characters
pub const MAX_TEXT_CHARS: usize = 1000;
/// Longest stored deadline, in characters
pub const MAX_DEADLINE_CHARS: usize = 200;
/// Characters of the input used as a fallback name
pub const FALLBACK_NAME_CHARS: usize = 100;

/// Remove a Markdown code fence (optionally tagged `json`) and any
/// surrounding quotes.
pub fn strip_code_fences(completion: &str) -> &str {
    let mut body = completion.trim();

    if let Some(rest) = body.strip_prefix("```") {
        let inner = match rest.find("```") {
            Some(end) => &rest[..end],
            None => rest,
        };
        body = inner.strip_prefix("json").unwrap_or(inner).trim();
    }

    body.trim_matches(|c| c == '"' || c == '\'').trim()
}

/// Parse a completion into a normalized draft.
///
/// Missing or empty fields fall back to the input: the name to its first
/// 100 characters, the description to the whole input.
pub fn parse_task_completion(completion: &str, input: &str) -> Result<TaskDraft> {
    let body = strip_code_fences(completion);
    let value: Value = serde_json::from_str(body)
        .with_context(|| format!("LLM completion is not valid JSON: {}", preview(body)))?;
    let fields = value
        .as_object()
        .with_context(|| format!("LLM completion is not a JSON object: {}", preview(body)))?;

    let task_name = field(fields, "task_name", MAX_TEXT_CHARS)
        .unwrap_or_else(|| truncate_chars(input.trim(), FALLBACK_NAME_CHARS));
    let task_description = field(fields, "task_description", MAX_TEXT_CHARS)
        .unwrap_or_else(|| truncate_chars(input.trim(), MAX_TEXT_CHARS));
    let task_deadline = field(fields, "task_deadline", MAX_DEADLINE_CHARS);

    Ok(TaskDraft {
        task_name,
        task_description,
        task_deadline,
    })
}

/// Trimmed, length-capped string field; empty counts as absent
fn field(fields: &Map<String, Value>, key: &str, max_chars: usize) -> Option<String> {
    let raw = match fields.get(key)? {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(truncate_chars(trimmed, max_chars))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn preview(body: &str) -> String {
    let head: String = body.chars().take(120).collect();
    if head.len() < body.len() {
        format!("{}...", head)
    } else {
        head
    }
}
