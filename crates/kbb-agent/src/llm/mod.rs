//! Task extraction through a chat-completion model
//!
//! [`LlmChatClient`] is the transport seam (one system + user prompt in, one
//! completion out). [`LlmTaskExtractor`] builds the extraction prompts on top
//! of any client and turns the completion into a [`TaskDraft`].

pub mod openai_compatible;
pub mod parsing;

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use kbb_core::TaskDraft;

pub use openai_compatible::OpenAICompatibleClient;

/// One chat completion
#[derive(Debug, Clone)]
pub struct LlmChatCompletion {
    pub llm_name: String,
    pub content: String,
    pub token_cost: u32,
}

/// Chat-completion transport
#[async_trait::async_trait]
pub trait LlmChatClient: Send + Sync + std::fmt::Debug {
    async fn chat_completion(&self, system_prompt: &str, user_prompt: &str)
        -> Result<LlmChatCompletion>;
}

/// Extracts a task from free text
#[async_trait::async_trait]
pub trait TaskExtractor: Send + Sync {
    /// `current_date` anchors relative deadlines such as "next Friday".
    async fn extract_task(&self, text: &str, current_date: NaiveDate) -> Result<TaskDraft>;
}

const SYSTEM_PROMPT: &str = "You turn requests of any shape (labelled fields, plain sentences, \
a single word) into one task. Reply with a single JSON object holding the string fields \
task_name, task_description and task_deadline, and nothing else.";

/// [`TaskExtractor`] backed by a chat model
#[derive(Debug, Clone)]
pub struct LlmTaskExtractor {
    client: Arc<dyn LlmChatClient>,
}

impl LlmTaskExtractor {
    pub fn new(client: Arc<dyn LlmChatClient>) -> Self {
        Self { client }
    }

    fn user_prompt(text: &str, current_date: NaiveDate) -> String {
        format!(
            "Today is {date}.\n\
             \n\
             Extract a task from the input below.\n\
             - task_name: the action to perform, short and in title case. Expand a bare \
             keyword into a proper name (\"billing\" -> \"Implement billing module\").\n\
             - task_description: the details given, or a one-sentence description when the \
             input is minimal.\n\
             - task_deadline: any due date mentioned. Resolve relative dates against today \
             as YYYY-MM-DD; keep words like \"ASAP\" as written; use \"\" when none.\n\
             \n\
             Input:\n\
             {text}\n\
             \n\
             Return only the JSON object, without Markdown.",
            date = current_date.format("%Y-%m-%d"),
            text = text,
        )
    }
}

#[async_trait::async_trait]
impl TaskExtractor for LlmTaskExtractor {
    async fn extract_task(&self, text: &str, current_date: NaiveDate) -> Result<TaskDraft> {
        let input = text.trim();
        if input.is_empty() {
            anyhow::bail!("Empty input text");
        }

        tracing::info!("Parsing task input with LLM (current date: {})", current_date);
        let completion = self
            .client
            .chat_completion(SYSTEM_PROMPT, &Self::user_prompt(input, current_date))
            .await?;
        tracing::debug!(
            "{} answered with {} tokens",
            completion.llm_name,
            completion.token_cost
        );

        parsing::parse_task_completion(&completion.content, input)
    }
}
