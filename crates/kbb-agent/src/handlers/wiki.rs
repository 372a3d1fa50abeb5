//! `update_wiki`: overwrite or append to the wiki document

use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{HandlerError, HandlerResult, IntentHandler};
use kbb_core::fingerprint::fingerprint_text;
use kbb_core::{Fingerprint, Output, RequestEnvelope, UpdateMode, WikiDefaults, WikiStore};

pub const WIKI_UPDATED: &str = "Wiki updated successfully";

#[derive(Debug)]
pub struct WikiUpdateHandler {
    agent_name: String,
    store: Arc<Mutex<WikiStore>>,
    defaults: WikiDefaults,
}

impl WikiUpdateHandler {
    pub fn new(agent_name: impl Into<String>, store: WikiStore) -> Self {
        Self {
            agent_name: agent_name.into(),
            store: Arc::new(Mutex::new(store)),
            defaults: WikiDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: WikiDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Current document text
    pub async fn content(&self) -> String {
        self.store.lock().await.content().to_string()
    }

    /// Digest of the current document text
    pub async fn content_digest(&self) -> Fingerprint {
        fingerprint_text(self.store.lock().await.content())
    }

    /// The file write runs on the blocking pool with the store lock held
    pub async fn apply(&self, text: &str, mode: UpdateMode) -> HandlerResult {
        let mut store = Arc::clone(&self.store).lock_owned().await;
        let text = text.to_string();

        let update = tokio::task::spawn_blocking(move || {
            store.update(&text, mode).map_err(|e| {
                tracing::error!("Wiki write to {} failed: {}", store.path().display(), e);
                HandlerError::WriteFailed(e.to_string())
            })
        })
        .await
        .map_err(|e| HandlerError::Processing(e.to_string()))??;

        tracing::info!(
            "Wiki {} applied, size now {} characters",
            update.update_mode,
            update.wiki_size
        );

        Ok(Output::new(
            WIKI_UPDATED,
            1.0,
            json!({
                "wiki_size": update.wiki_size,
                "update_mode": update.update_mode,
                "agent_name": self.agent_name,
            }),
        ))
    }
}

#[async_trait::async_trait]
impl IntentHandler for WikiUpdateHandler {
    async fn execute(&self, request: &RequestEnvelope) -> HandlerResult {
        let mode = self.defaults.resolve_mode(&request.input.metadata);
        if let Some(raw) = request.input.metadata_str(kbb_core::wiki::UPDATE_MODE_KEY) {
            if UpdateMode::parse(raw).is_none() {
                tracing::warn!("Unknown update_mode {:?}, using {}", raw, mode);
            }
        }

        self.apply(request.text(), mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbb_core::protocol::{Intent, RequestContext, RequestInput};

    fn handler(dir: &tempfile::TempDir) -> WikiUpdateHandler {
        let store = WikiStore::open(dir.path().join("wiki.md")).unwrap();
        WikiUpdateHandler::new("KnowledgeBaseBuilderAgent", store)
    }

    fn request(input: RequestInput) -> RequestEnvelope {
        RequestEnvelope::new(
            "r-1",
            "KnowledgeBaseBuilderAgent",
            Intent::UpdateWiki,
            input,
            RequestContext::for_user("u1"),
        )
    }

    #[tokio::test]
    async fn test_overwrite_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir);

        let first = handler
            .execute(&request(RequestInput::from_text("A")))
            .await
            .unwrap();
        assert_eq!(first.details["update_mode"], "overwrite");
        assert_eq!(first.details["wiki_size"], 1);

        let second = handler
            .execute(&request(
                RequestInput::from_text("B").with_metadata("update_mode", "append"),
            ))
            .await
            .unwrap();
        assert_eq!(second.result, WIKI_UPDATED);
        assert_eq!(second.details["update_mode"], "append");
        assert_eq!(second.details["wiki_size"], 3);
        assert_eq!(handler.content().await, "A\nB");
    }

    #[tokio::test]
    async fn test_unknown_mode_reports_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir);
        handler.apply("old", UpdateMode::Overwrite).await.unwrap();

        let output = handler
            .execute(&request(
                RequestInput::from_text("new").with_metadata("update_mode", "merge"),
            ))
            .await
            .unwrap();

        assert_eq!(output.details["update_mode"], "overwrite");
        assert_eq!(handler.content().await, "new");
    }

    #[tokio::test]
    async fn test_write_failure_is_ltm_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the wiki's directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = WikiStore::open(blocker.join("wiki.md")).unwrap();
        let handler = WikiUpdateHandler::new("agent", store);

        let err = handler.apply("text", UpdateMode::Overwrite).await.unwrap_err();
        assert_eq!(err.code(), kbb_core::ErrorCode::LtmWriteFailed);
        assert_eq!(handler.content().await, "");
    }

    #[tokio::test]
    async fn test_content_digest_follows_writes() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir);
        assert_eq!(handler.content_digest().await, fingerprint_text(""));

        handler.apply("A", UpdateMode::Overwrite).await.unwrap();
        assert_eq!(handler.content_digest().await, fingerprint_text("A"));

        handler.apply("\n\n", UpdateMode::Append).await.unwrap();
        assert_eq!(handler.content().await, "A\n\n\n");
        assert_eq!(handler.content_digest().await, fingerprint_text("A\n\n\n"));
    }
}
