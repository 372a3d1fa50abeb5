//! `create_task`: free text → LLM extraction → task database

use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::sync::Arc;

use super::{chain, HandlerError, HandlerResult, IntentHandler};
use crate::llm::TaskExtractor;
use kbb_core::{NewTask, Output, RequestEnvelope, TaskDefaults, TaskRecord, TaskStore};

pub struct TaskCreationHandler {
    agent_name: String,
    extractor: Arc<dyn TaskExtractor>,
    store: Arc<dyn TaskStore>,
    defaults: TaskDefaults,
    confidence: f64,
}

impl std::fmt::Debug for TaskCreationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskCreationHandler")
            .field("agent_name", &self.agent_name)
            .field("defaults", &self.defaults)
            .field("confidence", &self.confidence)
            .finish_non_exhaustive()
    }
}

impl TaskCreationHandler {
    pub fn new(
        agent_name: impl Into<String>,
        extractor: Arc<dyn TaskExtractor>,
        store: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            extractor,
            store,
            defaults: TaskDefaults::default(),
            confidence: 0.95,
        }
    }

    pub fn with_defaults(mut self, defaults: TaskDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub async fn create(&self, text: &str, today: NaiveDate) -> HandlerResult {
        let draft = self.extractor.extract_task(text, today).await.map_err(|e| {
            tracing::error!("Task extraction failed: {:#}", e);
            HandlerError::LlmParsing(chain(&e))
        })?;

        let task = NewTask::from_draft(draft, &self.defaults);
        let store = Arc::clone(&self.store);
        let record = tokio::task::spawn_blocking(move || store.create_task(task))
            .await
            .map_err(|e| HandlerError::Processing(e.to_string()))?
            .map_err(|e| {
                tracing::error!("Task store failed: {:#}", e);
                HandlerError::Database(chain(&e))
            })?;

        Ok(Output::new(
            format!("Task created successfully: {}", record.task_id),
            self.confidence,
            self.details(&record)?,
        ))
    }

    fn details(&self, record: &TaskRecord) -> Result<Value, HandlerError> {
        let mut details =
            serde_json::to_value(record).map_err(|e| HandlerError::Processing(e.to_string()))?;
        if let Value::Object(map) = &mut details {
            map.insert(
                "agent_name".to_string(),
                Value::String(self.agent_name.clone()),
            );
        }
        Ok(details)
    }
}

#[async_trait::async_trait]
impl IntentHandler for TaskCreationHandler {
    async fn execute(&self, request: &RequestEnvelope) -> HandlerResult {
        self.create(request.text(), Local::now().date_naive()).await
    }
}
