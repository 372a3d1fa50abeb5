//! Intent → handler routing
//!
//! A deployment owns exactly one primary handler plus the health check, so
//! routing is a closed match rather than a lookup table.

use kbb_core::{Fingerprint, Intent, RequestEnvelope};

use crate::handlers::{
    HandlerError, HandlerResult, HealthCheckHandler, IntentHandler, TaskCreationHandler,
    WikiUpdateHandler,
};

/// The business handler a deployment serves
#[derive(Debug)]
pub enum PrimaryHandler {
    Tasks(TaskCreationHandler),
    Wiki(WikiUpdateHandler),
}

impl PrimaryHandler {
    pub fn intent(&self) -> Intent {
        match self {
            PrimaryHandler::Tasks(_) => Intent::CreateTask,
            PrimaryHandler::Wiki(_) => Intent::UpdateWiki,
        }
    }
}

#[derive(Debug)]
pub struct IntentDispatcher {
    primary: PrimaryHandler,
    health: HealthCheckHandler,
}

impl IntentDispatcher {
    pub fn new(primary: PrimaryHandler, health: HealthCheckHandler) -> Self {
        Self { primary, health }
    }

    pub fn primary(&self) -> &PrimaryHandler {
        &self.primary
    }

    /// Primary intent first, then `health_check`
    pub fn supported_intents(&self) -> [Intent; 2] {
        [self.primary.intent(), Intent::HealthCheck]
    }

    /// Digest of the state the primary handler's replies describe. Task
    /// replies depend only on the request, so there is none for them.
    pub async fn state_digest(&self) -> Option<Fingerprint> {
        match &self.primary {
            PrimaryHandler::Tasks(_) => None,
            PrimaryHandler::Wiki(handler) => Some(handler.content_digest().await),
        }
    }

    pub async fn dispatch(&self, request: &RequestEnvelope) -> HandlerResult {
        match (request.intent, &self.primary) {
            (Intent::HealthCheck, _) => self.health.execute(request).await,
            (Intent::CreateTask, PrimaryHandler::Tasks(handler)) => handler.execute(request).await,
            (Intent::UpdateWiki, PrimaryHandler::Wiki(handler)) => handler.execute(request).await,
            (intent, primary) => Err(HandlerError::Processing(format!(
                "No handler for intent '{}' (this agent serves '{}')",
                intent,
                primary.intent()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbb_core::protocol::{RequestContext, RequestInput};
    use kbb_core::{EnvelopeAssembler, WikiStore};

    fn wiki_dispatcher(dir: &tempfile::TempDir) -> IntentDispatcher {
        let store = WikiStore::open(dir.path().join("wiki.md")).unwrap();
        IntentDispatcher::new(
            PrimaryHandler::Wiki(WikiUpdateHandler::new("agent", store)),
            HealthCheckHandler::new(EnvelopeAssembler::new("agent")),
        )
    }

    fn request(intent: Intent) -> RequestEnvelope {
        RequestEnvelope::new(
            "r",
            "agent",
            intent,
            RequestInput::from_text("hello"),
            RequestContext::for_user("u"),
        )
    }

    #[tokio::test]
    async fn test_routes_primary_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = wiki_dispatcher(&dir);

        assert_eq!(
            dispatcher.supported_intents(),
            [Intent::UpdateWiki, Intent::HealthCheck]
        );

        let wiki = dispatcher.dispatch(&request(Intent::UpdateWiki)).await.unwrap();
        assert_eq!(wiki.details["wiki_size"], 5);

        let health = dispatcher.dispatch(&request(Intent::HealthCheck)).await.unwrap();
        assert_eq!(health.result, "I'm up and ready");
    }

    #[tokio::test]
    async fn test_foreign_intent_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = wiki_dispatcher(&dir);

        let err = dispatcher
            .dispatch(&request(Intent::CreateTask))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Processing(_)));
    }
}
