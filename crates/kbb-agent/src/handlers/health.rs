use chrono::Utc;

use super::{HandlerResult, IntentHandler};
use kbb_core::{EnvelopeAssembler, RequestEnvelope};

/// Fixed "ready" answer; touches no state
#[derive(Debug, Clone)]
pub struct HealthCheckHandler {
    assembler: EnvelopeAssembler,
}

impl HealthCheckHandler {
    pub fn new(assembler: EnvelopeAssembler) -> Self {
        Self { assembler }
    }
}

#[async_trait::async_trait]
impl IntentHandler for HealthCheckHandler {
    async fn execute(&self, _request: &RequestEnvelope) -> HandlerResult {
        Ok(self.assembler.health_output(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbb_core::protocol::{Intent, RequestContext, RequestInput};

    #[test]
    fn test_ready_payload() {
        let handler = HealthCheckHandler::new(EnvelopeAssembler::new("KnowledgeBaseBuilderAgent"));
        let request = RequestEnvelope::new(
            "h-1",
            "KnowledgeBaseBuilderAgent",
            Intent::HealthCheck,
            RequestInput::default(),
            RequestContext::for_user("u"),
        );

        let output = tokio_test::block_on(handler.execute(&request)).unwrap();
        assert_eq!(output.result, "I'm up and ready");
        assert_eq!(output.confidence, 1.0);
        assert_eq!(output.details["agent_name"], "KnowledgeBaseBuilderAgent");
        assert!(output.details["message"]
            .as_str()
            .unwrap()
            .starts_with("Health check successful at "));
    }
}
