use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LlmChatClient, LlmChatCompletion};
use crate::config::LlmSettings;

#[derive(Debug, Clone)]
pub struct OpenAICompatibleClient {
    pub name: String,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: Option<u32>,
    http_client: reqwest::Client,
}

impl OpenAICompatibleClient {
    pub fn new(
        name: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Build a client from settings. Fails when no API key is configured.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings
            .api_key()
            .with_context(|| format!("{} not configured", settings.api_key_env))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        let mut client = Self::new(
            "openai-compatible",
            Some(api_key),
            &settings.base_url,
            &settings.model,
        )
        .with_temperature(settings.temperature)
        .with_http_client(http_client);
        client.max_tokens = settings.max_tokens;

        tracing::info!("Initialized LLM client with model: {}", client.model);
        Ok(client)
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }

    async fn request_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<(String, u32)> {
        let request = self.build_request(system_prompt, user_prompt);

        let mut builder = self
            .http_client
            .post(self.endpoint())
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .context("Failed to send OpenAI-compatible request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI-compatible API error ({}): {}", status, error_text);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI-compatible response")?;

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .context("OpenAI-compatible response has no choices")?;

        let tokens = completion
            .usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok((content, tokens))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    total_tokens: Option<u32>,
}

#[async_trait::async_trait]
impl LlmChatClient for OpenAICompatibleClient {
    async fn chat_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<LlmChatCompletion> {
        let (content, tokens) = self.request_completion(system_prompt, user_prompt).await?;
        Ok(LlmChatCompletion {
            llm_name: self.name.clone(),
            content,
            token_cost: tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = OpenAICompatibleClient::new("t", None, "http://localhost:8080/v1/", "m");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let client = OpenAICompatibleClient::new("t", None, "http://x", "gpt-4o-mini");
        let body = serde_json::to_value(client.build_request("sys", "usr")).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["temperature"], 0.2);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing_tolerates_null_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}],"usage":null}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_from_settings_requires_key() {
        let settings = LlmSettings {
            api_key_env: "KBB_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmSettings::default()
        };
        let err = OpenAICompatibleClient::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("KBB_TEST_KEY_THAT_IS_NEVER_SET not configured"));
    }
}
