//! Supervisor protocol
//!
//! The wire contract between a supervisor and this worker agent:
//!
//! ```text
//! request  { request_id, agent_name, intent, input { text, metadata }, context { user_id, .. } }
//! response { request_id, agent_name, status, output { result, confidence, details } | error { type, message } }
//! ```
//!
//! Untrusted input only becomes a [`RequestEnvelope`] through
//! [`EnvelopeValidator`]; responses are only built through [`EnvelopeAssembler`].

pub mod envelope;
pub mod validator;

pub use envelope::{EnvelopeAssembler, ErrorBody, Output, ResponseEnvelope, ResponseStatus};
pub use validator::{EnvelopeValidator, Rejection, ValidationError, REQUIRED_FIELDS};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Intents understood by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Turn free-form text into a stored task record
    CreateTask,
    /// Overwrite or append the wiki document
    UpdateWiki,
    /// Liveness probe, never cached
    HealthCheck,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::CreateTask, Intent::UpdateWiki, Intent::HealthCheck];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreateTask => "create_task",
            Intent::UpdateWiki => "update_wiki",
            Intent::HealthCheck => "health_check",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|intent| intent.as_str() == raw)
    }

    /// Whether `input.text` must be present and non-empty
    pub fn requires_text(&self) -> bool {
        !matches!(self, Intent::HealthCheck)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request envelope in Supervisor format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Caller-supplied correlation id, echoed in every response
    pub request_id: String,
    pub agent_name: String,
    pub intent: Intent,
    pub input: RequestInput,
    pub context: RequestContext,
}

impl RequestEnvelope {
    pub fn new(
        request_id: impl Into<String>,
        agent_name: impl Into<String>,
        intent: Intent,
        input: RequestInput,
        context: RequestContext,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            agent_name: agent_name.into(),
            intent,
            input,
            context,
        }
    }

    /// Request text, empty when absent
    pub fn text(&self) -> &str {
        self.input.text.as_deref().unwrap_or_default()
    }
}

/// The `input` section of a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl RequestInput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String-valued metadata entry
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// The `context` section of a request. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl RequestContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parse_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::parse("delete_everything"), None);
        assert_eq!(Intent::parse("Create_Task"), None);
    }

    #[test]
    fn test_health_check_needs_no_text() {
        assert!(!Intent::HealthCheck.requires_text());
        assert!(Intent::CreateTask.requires_text());
        assert!(Intent::UpdateWiki.requires_text());
    }

    #[test]
    fn test_envelope_serializes_in_wire_shape() {
        let envelope = RequestEnvelope::new(
            "r-1",
            "KnowledgeBaseBuilderAgent",
            Intent::UpdateWiki,
            RequestInput::from_text("hello").with_metadata("update_mode", "append"),
            RequestContext::for_user("u1"),
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["intent"], "update_wiki");
        assert_eq!(json["input"]["text"], "hello");
        assert_eq!(json["input"]["metadata"]["update_mode"], "append");
        assert_eq!(json["context"]["user_id"], "u1");
        assert!(json["context"].get("conversation_id").is_none());
    }
}
