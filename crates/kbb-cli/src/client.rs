//! Supervisor-side HTTP client
//!
//! Builds request envelopes the way the Supervisor does (fresh UUID
//! `request_id`, RFC 3339 `context.timestamp`) and posts them to a worker.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::time::Duration;

use kbb_core::protocol::{Intent, RequestContext, RequestEnvelope, RequestInput};
use kbb_core::wiki::{UpdateMode, UPDATE_MODE_KEY};

/// Default worker address
pub const DEFAULT_URL: &str = "http://127.0.0.1:5000";

/// What a request carries besides the text
#[derive(Debug, Clone)]
pub struct Sender {
    pub agent_name: String,
    pub user_id: String,
    pub conversation_id: Option<String>,
}

impl Sender {
    fn context(&self, now: DateTime<Utc>) -> RequestContext {
        RequestContext {
            user_id: self.user_id.clone(),
            conversation_id: self.conversation_id.clone(),
            timestamp: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }

    fn envelope(&self, intent: Intent, input: RequestInput, now: DateTime<Utc>) -> RequestEnvelope {
        RequestEnvelope::new(
            uuid::Uuid::new_v4().to_string(),
            self.agent_name.clone(),
            intent,
            input,
            self.context(now),
        )
    }

    pub fn create_task(&self, text: &str, now: DateTime<Utc>) -> RequestEnvelope {
        self.envelope(Intent::CreateTask, RequestInput::from_text(text), now)
    }

    pub fn update_wiki(&self, text: &str, mode: UpdateMode, now: DateTime<Utc>) -> RequestEnvelope {
        let input = RequestInput::from_text(text).with_metadata(UPDATE_MODE_KEY, mode.as_str());
        self.envelope(Intent::UpdateWiki, input, now)
    }

    pub fn health_check(&self, now: DateTime<Utc>) -> RequestEnvelope {
        self.envelope(Intent::HealthCheck, RequestInput::default(), now)
    }
}

/// HTTP status plus decoded body
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    /// A response envelope (as opposed to a transport error body)
    pub fn is_envelope(&self) -> bool {
        self.body.get("status").and_then(Value::as_str).is_some()
    }

    pub fn is_success(&self) -> bool {
        self.body.get("status").and_then(Value::as_str) == Some("success")
    }
}

/// Talks to one worker over HTTP
#[derive(Debug, Clone)]
pub struct WorkerClient {
    http: reqwest::Client,
    base_url: String,
}

impl WorkerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a request envelope to `/message`
    pub async fn send(&self, envelope: &RequestEnvelope) -> Result<Reply> {
        tracing::debug!(
            "Sending {} request {} to {}",
            envelope.intent.as_str(),
            envelope.request_id,
            self.base_url
        );
        self.post_value(&serde_json::to_value(envelope)?).await
    }

    /// POST an arbitrary JSON document to `/message`
    pub async fn post_value(&self, body: &Value) -> Result<Reply> {
        let response = self
            .http
            .post(format!("{}/message", self.base_url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base_url))?;
        Self::decode(response).await
    }

    /// GET `/health`
    pub async fn health(&self) -> Result<Reply> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base_url))?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Reply> {
        let status = response.status().as_u16();
        let text = response.text().await.context("failed to read response body")?;
        let body = serde_json::from_str(&text)
            .with_context(|| format!("worker answered HTTP {} with non-JSON body: {}", status, text))?;
        Ok(Reply { status, body })
    }
}
