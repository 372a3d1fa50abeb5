//! Envelope validation
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the payload is a JSON object (`INVALID_JSON`)
//! 2. every top-level key is present (`MISSING_FIELD`)
//! 3. every field has its expected type, nested sections included (`INVALID_TYPE`)
//! 4. `agent_name` is this agent (`INVALID_AGENT`)
//! 5. `intent` is supported by this deployment (`UNSUPPORTED_INTENT`)
//! 6. intents that need text carry a non-empty `input.text` (`MISSING_PARAMETER`)
//!
//! Validation is pure: no I/O, same input always gives the same verdict.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{Intent, RequestContext, RequestEnvelope, RequestInput};
use crate::error::ErrorCode;

/// Top-level keys every envelope must carry, in reporting order
pub const REQUIRED_FIELDS: [&str; 5] = ["request_id", "agent_name", "intent", "input", "context"];

/// Why an envelope was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),

    #[error("Missing required field: '{0}'")]
    MissingField(String),

    #[error("Field '{field}' must be {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },

    #[error("Agent name '{received}' does not match this agent '{expected}'")]
    InvalidAgent { received: String, expected: String },

    #[error("Unsupported intent: '{intent}'. This agent only supports {supported}")]
    UnsupportedIntent { intent: String, supported: String },

    #[error("Missing required parameter: '{0}'")]
    MissingParameter(String),
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::InvalidJson(_) => ErrorCode::InvalidJson,
            ValidationError::MissingField(_) => ErrorCode::MissingField,
            ValidationError::InvalidType { .. } => ErrorCode::InvalidType,
            ValidationError::InvalidAgent { .. } => ErrorCode::InvalidAgent,
            ValidationError::UnsupportedIntent { .. } => ErrorCode::UnsupportedIntent,
            ValidationError::MissingParameter(_) => ErrorCode::MissingParameter,
        }
    }

    fn invalid_type(field: &str, expected: &'static str) -> Self {
        ValidationError::InvalidType {
            field: field.to_string(),
            expected,
        }
    }
}

/// A rejected envelope, with whatever correlation id could be recovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub request_id: Option<String>,
    pub error: ValidationError,
}

impl Rejection {
    pub fn code(&self) -> ErrorCode {
        self.error.code()
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.error)
    }
}

/// Validates raw envelopes against this agent's identity and intent set
#[derive(Debug, Clone)]
pub struct EnvelopeValidator {
    agent_name: String,
    supported: Vec<Intent>,
}

impl EnvelopeValidator {
    pub fn new(agent_name: impl Into<String>, supported: impl IntoIterator<Item = Intent>) -> Self {
        let mut intents: Vec<Intent> = Vec::new();
        for intent in supported {
            if !intents.contains(&intent) {
                intents.push(intent);
            }
        }

        Self {
            agent_name: agent_name.into(),
            supported: intents,
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn supported_intents(&self) -> &[Intent] {
        &self.supported
    }

    pub fn supports(&self, intent: Intent) -> bool {
        self.supported.contains(&intent)
    }

    /// Validate an unparsed payload
    pub fn validate_str(&self, raw: &str) -> Result<RequestEnvelope, Rejection> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.validate(&value),
            Err(e) => Err(Rejection {
                request_id: None,
                error: ValidationError::InvalidJson(e.to_string()),
            }),
        }
    }

    /// Validate an already parsed payload
    pub fn validate(&self, value: &Value) -> Result<RequestEnvelope, Rejection> {
        let Some(object) = value.as_object() else {
            return Err(Rejection {
                request_id: None,
                error: ValidationError::InvalidJson(format!(
                    "expected a JSON object, got {}",
                    json_kind(value)
                )),
            });
        };

        self.check(object).map_err(|error| Rejection {
            request_id: object
                .get("request_id")
                .and_then(Value::as_str)
                .map(str::to_string),
            error,
        })
    }

    fn check(&self, object: &Map<String, Value>) -> Result<RequestEnvelope, ValidationError> {
        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(ValidationError::MissingField(field.to_string()));
            }
        }

        let request_id = string_field(object, "request_id")?;
        let agent_name = string_field(object, "agent_name")?;
        let intent = string_field(object, "intent")?;
        let input = object_field(object, "input")?;
        let context = object_field(object, "context")?;

        let input = parse_input(input)?;
        let context = parse_context(context)?;

        if agent_name != self.agent_name {
            return Err(ValidationError::InvalidAgent {
                received: agent_name.to_string(),
                expected: self.agent_name.clone(),
            });
        }

        let intent = Intent::parse(intent)
            .filter(|candidate| self.supports(*candidate))
            .ok_or_else(|| ValidationError::UnsupportedIntent {
                intent: intent.to_string(),
                supported: self.describe_supported(),
            })?;

        if intent.requires_text() {
            if input.text.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::MissingParameter("input.text".to_string()));
            }
        }

        Ok(RequestEnvelope {
            request_id: request_id.to_string(),
            agent_name: agent_name.to_string(),
            intent,
            input,
            context,
        })
    }

    fn describe_supported(&self) -> String {
        self.supported
            .iter()
            .map(|intent| format!("'{}'", intent))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

fn parse_input(input: &Map<String, Value>) -> Result<RequestInput, ValidationError> {
    let text = match input.get("text") {
        None => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => return Err(ValidationError::invalid_type("input.text", "a string")),
    };

    let metadata = match input.get("metadata") {
        None => Map::new(),
        Some(Value::Object(metadata)) => metadata.clone(),
        Some(_) => return Err(ValidationError::invalid_type("input.metadata", "an object")),
    };

    Ok(RequestInput { text, metadata })
}

fn parse_context(context: &Map<String, Value>) -> Result<RequestContext, ValidationError> {
    let user_id = match context.get("user_id") {
        None => return Err(ValidationError::MissingField("context.user_id".to_string())),
        Some(Value::String(user_id)) => user_id.clone(),
        Some(_) => return Err(ValidationError::invalid_type("context.user_id", "a string")),
    };

    let informational = |key: &str| context.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(RequestContext {
        user_id,
        conversation_id: informational("conversation_id"),
        timestamp: informational("timestamp"),
    })
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, ValidationError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::invalid_type(key, "a string"))
}

fn object_field<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    object
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| ValidationError::invalid_type(key, "an object"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
