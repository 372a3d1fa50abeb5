//! Response envelopes and their assembly

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::validator::Rejection;
use crate::error::ErrorCode;

/// `request_id` used when a health probe arrives without one
pub const HEALTH_CHECK_REQUEST_ID: &str = "health-check";

/// Fixed result text of a health probe
pub const HEALTH_CHECK_RESULT: &str = "I'm up and ready";

/// Overall outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Success payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub result: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Handler-specific fields
    pub details: Value,
}

impl Output {
    /// Confidence is clamped into [0, 1]; NaN becomes 0.
    pub fn new(result: impl Into<String>, confidence: f64, details: Value) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            result: result.into(),
            confidence,
            details,
        }
    }
}

/// Failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub code: ErrorCode,
    pub message: String,
}

/// The envelope returned for every request
///
/// Exactly one of `output` and `error` is set; the other serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
    agent_name: String,
    status: ResponseStatus,
    output: Option<Output>,
    error: Option<ErrorBody>,
}

impl ResponseEnvelope {
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Re-stamp with another correlation id (used for cache hits)
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Builds response envelopes on behalf of one agent
#[derive(Debug, Clone)]
pub struct EnvelopeAssembler {
    agent_name: String,
}

impl EnvelopeAssembler {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn success(&self, request_id: &str, output: Output) -> ResponseEnvelope {
        ResponseEnvelope {
            request_id: Some(request_id.to_string()),
            agent_name: self.agent_name.clone(),
            status: ResponseStatus::Success,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(
        &self,
        request_id: Option<&str>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> ResponseEnvelope {
        ResponseEnvelope {
            request_id: request_id.map(str::to_string),
            agent_name: self.agent_name.clone(),
            status: ResponseStatus::Error,
            output: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn rejection(&self, rejection: &Rejection) -> ResponseEnvelope {
        self.failure(
            rejection.request_id.as_deref(),
            rejection.code(),
            rejection.error.to_string(),
        )
    }

    /// Fixed "ready" payload
    pub fn health_output(&self, checked_at: DateTime<Utc>) -> Output {
        let checked_at = checked_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        Output::new(
            HEALTH_CHECK_RESULT,
            1.0,
            json!({
                "message": format!("Health check successful at {}", checked_at),
                "checked_at": checked_at,
                "agent_name": self.agent_name,
            }),
        )
    }

    pub fn health(&self, request_id: Option<&str>, checked_at: DateTime<Utc>) -> ResponseEnvelope {
        self.success(
            request_id.unwrap_or(HEALTH_CHECK_REQUEST_ID),
            self.health_output(checked_at),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ValidationError;
    use chrono::TimeZone;

    fn assembler() -> EnvelopeAssembler {
        EnvelopeAssembler::new("KnowledgeBaseBuilderAgent")
    }

    #[test]
    fn test_success_shape() {
        let envelope = assembler().success("r-1", Output::new("done", 0.95, json!({ "k": 1 })));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["request_id"], "r-1");
        assert_eq!(json["agent_name"], "KnowledgeBaseBuilderAgent");
        assert_eq!(json["status"], "success");
        assert_eq!(json["output"]["result"], "done");
        assert_eq!(json["output"]["details"]["k"], 1);
        assert!(json["error"].is_null());
        assert!(json.as_object().unwrap().contains_key("error"));
    }

    #[test]
    fn test_failure_shape() {
        let envelope = assembler().failure(Some("r-2"), ErrorCode::DatabaseError, "db down");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["type"], "DATABASE_ERROR");
        assert_eq!(json["error"]["message"], "db down");
        assert!(json["output"].is_null());
    }

    #[test]
    fn test_failure_without_request_id_omits_key() {
        let envelope = assembler().failure(None, ErrorCode::InvalidJson, "bad");
        let json = serde_json::to_value(&envelope).unwrap();

        assert!(json.get("request_id").is_none());
        assert_eq!(json["agent_name"], "KnowledgeBaseBuilderAgent");
    }

    #[test]
    fn test_rejection_carries_recovered_request_id() {
        let rejection = Rejection {
            request_id: Some("r-3".to_string()),
            error: ValidationError::MissingField("context".to_string()),
        };
        let envelope = assembler().rejection(&rejection);

        assert_eq!(envelope.request_id(), Some("r-3"));
        assert_eq!(envelope.error_code(), Some(ErrorCode::MissingField));
        assert_eq!(
            envelope.error().unwrap().message,
            "Missing required field: 'context'"
        );
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Output::new("", 1.7, Value::Null).confidence, 1.0);
        assert_eq!(Output::new("", -0.2, Value::Null).confidence, 0.0);
        assert_eq!(Output::new("", f64::NAN, Value::Null).confidence, 0.0);
    }

    #[test]
    fn test_health_payload() {
        let at = Utc.with_ymd_and_hms(2025, 11, 21, 9, 30, 0).unwrap();
        let envelope = assembler().health(None, at);
        let output = envelope.output().unwrap();

        assert_eq!(envelope.request_id(), Some(HEALTH_CHECK_REQUEST_ID));
        assert_eq!(output.result, HEALTH_CHECK_RESULT);
        assert_eq!(output.confidence, 1.0);
        assert_eq!(output.details["checked_at"], "2025-11-21T09:30:00Z");
    }

    #[test]
    fn test_restamp_keeps_payload() {
        let envelope = assembler()
            .success("old", Output::new("done", 0.5, json!({})))
            .with_request_id("new");

        assert_eq!(envelope.request_id(), Some("new"));
        assert_eq!(envelope.output().unwrap().result, "done");
    }

    #[test]
    fn test_envelope_round_trips_through_json() {
        let envelope = assembler().success("r-4", Output::new("ok", 0.9, json!({ "a": [1, 2] })));
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: ResponseEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, envelope);
    }
}
