//! The worker agent request pipeline
//!
//! ```text
//! validate ─► health_check? ─► fingerprint ─► cache hit? ─► dispatch ─► cache success ─► envelope
//!                  │                              │
//!                  └── fixed "ready" envelope     └── cached envelope, re-stamped
//! ```
//!
//! Business requests run one at a time: the cache lock is held from lookup
//! until the response is stored, so an identical request arriving meanwhile
//! is served from the cache instead of calling the handler again. Health
//! checks take no lock and never touch the cache.
//!
//! Wiki replies are cached together with a digest of the document they
//! leave behind. Once the document has moved on, the entry is stale and the
//! request runs again, so an old overwrite is never answered without being
//! written.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use kbb_core::{
    EnvelopeAssembler, EnvelopeValidator, ErrorCode, Fingerprinter, Intent, RequestEnvelope,
    ResponseCache, ResponseEnvelope, SqliteTaskStore, WikiStore,
};

use crate::config::{AgentSettings, AgentVariant, LlmSettings};
use crate::dispatcher::{IntentDispatcher, PrimaryHandler};
use crate::handlers::{HealthCheckHandler, TaskCreationHandler, WikiUpdateHandler};
use crate::llm::{LlmTaskExtractor, OpenAICompatibleClient, TaskExtractor};

#[derive(Debug)]
pub struct WorkerAgent {
    supervisor_id: String,
    validator: EnvelopeValidator,
    assembler: EnvelopeAssembler,
    fingerprinter: Fingerprinter,
    cache: Mutex<ResponseCache>,
    dispatcher: IntentDispatcher,
}

impl WorkerAgent {
    /// Assemble a worker around an already built primary handler. The cache
    /// is loaded from `settings.cache_path`.
    pub fn new(settings: &AgentSettings, primary: PrimaryHandler) -> Self {
        let assembler = EnvelopeAssembler::new(&settings.agent_name);
        let dispatcher =
            IntentDispatcher::new(primary, HealthCheckHandler::new(assembler.clone()));
        let validator =
            EnvelopeValidator::new(&settings.agent_name, dispatcher.supported_intents());
        let cache = ResponseCache::load(&settings.cache_path);

        tracing::info!(
            "Worker {} ready (intents: {:?}, {} cached responses)",
            settings.agent_name,
            validator.supported_intents(),
            cache.len()
        );

        Self {
            supervisor_id: settings.supervisor_id.clone(),
            validator,
            assembler,
            fingerprinter: Fingerprinter::new(settings.wiki_defaults),
            cache: Mutex::new(cache),
            dispatcher,
        }
    }

    /// Build the production collaborators for the configured variant
    pub fn from_settings(settings: &AgentSettings, llm: &LlmSettings) -> anyhow::Result<Self> {
        let primary = match settings.variant {
            AgentVariant::Tasks => {
                let client = OpenAICompatibleClient::from_settings(llm)?;
                let extractor: Arc<dyn TaskExtractor> =
                    Arc::new(LlmTaskExtractor::new(Arc::new(client)));
                tasks_handler(settings, extractor)?
            }
            AgentVariant::Wiki => {
                let store = WikiStore::open(&settings.wiki_path)?;
                PrimaryHandler::Wiki(
                    WikiUpdateHandler::new(&settings.agent_name, store)
                        .with_defaults(settings.wiki_defaults),
                )
            }
        };

        Ok(Self::new(settings, primary))
    }

    pub fn agent_name(&self) -> &str {
        self.assembler.agent_name()
    }

    pub fn supervisor_id(&self) -> &str {
        &self.supervisor_id
    }

    pub fn supported_intents(&self) -> &[Intent] {
        self.validator.supported_intents()
    }

    pub fn dispatcher(&self) -> &IntentDispatcher {
        &self.dispatcher
    }

    pub async fn cached_responses(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Fixed "ready" envelope; no validation, no cache
    pub fn health(&self, request_id: Option<&str>) -> ResponseEnvelope {
        self.assembler.health(request_id, Utc::now())
    }

    /// Handle an unparsed request body
    pub async fn handle_message(&self, raw: &str) -> ResponseEnvelope {
        match self.validator.validate_str(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(rejection) => {
                tracing::warn!("Message validation failed: {} - {}", rejection.code(), rejection);
                self.assembler.rejection(&rejection)
            }
        }
    }

    /// Handle a parsed request body
    pub async fn handle_value(&self, value: &Value) -> ResponseEnvelope {
        match self.validator.validate(value) {
            Ok(request) => self.handle_request(request).await,
            Err(rejection) => {
                tracing::warn!("Message validation failed: {} - {}", rejection.code(), rejection);
                self.assembler.rejection(&rejection)
            }
        }
    }

    /// Run a validated request through cache and dispatch
    pub async fn handle_request(&self, request: RequestEnvelope) -> ResponseEnvelope {
        tracing::info!(
            "Received Supervisor message: intent={}, request_id={}",
            request.intent,
            request.request_id
        );

        if request.intent == Intent::HealthCheck {
            return self.health(Some(request.request_id.as_str()));
        }

        let fingerprint = self.fingerprinter.fingerprint(&request);
        let mut cache = self.cache.lock().await;

        let state = self.dispatcher.state_digest().await;

        if let Some(cached) = cache.lookup_current(&fingerprint, state.as_ref()) {
            tracing::info!("Cache hit for {}...", fingerprint.short());
            return cached.clone().with_request_id(&request.request_id);
        }
        if cache.lookup(&fingerprint).is_some() {
            tracing::info!("Cached response {}... is stale, running again", fingerprint.short());
        }

        match self.dispatcher.dispatch(&request).await {
            Ok(output) => {
                let envelope = self.assembler.success(&request.request_id, output);
                let subject = self.fingerprinter.subject(&request);
                let state = self.dispatcher.state_digest().await;
                if let Err(e) =
                    cache.store_with_state(fingerprint.clone(), subject, envelope.clone(), state)
                {
                    tracing::warn!(
                        "{}: could not persist cache entry {}...: {}",
                        ErrorCode::LtmWriteFailed,
                        fingerprint.short(),
                        e
                    );
                }
                envelope
            }
            Err(err) => {
                tracing::warn!(
                    "Request {} failed: {} - {}",
                    request.request_id,
                    err.code(),
                    err
                );
                self.assembler
                    .failure(Some(request.request_id.as_str()), err.code(), err.to_string())
            }
        }
    }
}

/// `create_task` handler over the SQLite store at `settings.task_db_path`
pub fn tasks_handler(
    settings: &AgentSettings,
    extractor: Arc<dyn TaskExtractor>,
) -> anyhow::Result<PrimaryHandler> {
    let store = Arc::new(SqliteTaskStore::open(&settings.task_db_path)?);
    Ok(PrimaryHandler::Tasks(
        TaskCreationHandler::new(&settings.agent_name, extractor, store)
            .with_defaults(settings.task_defaults.clone())
            .with_confidence(settings.task_confidence),
    ))
}
