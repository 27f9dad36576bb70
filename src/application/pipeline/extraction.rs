//! Extraction stage - lets active domains pull facts out of the message.
//!
//! Extractors run one after another in domain precedence order, so results
//! are appended deterministically. A failing extractor is logged and
//! skipped; the others still contribute.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::{Stage, StageError, TurnContext};
use crate::domain::conversation::ConversationState;
use crate::domain::plugin::{DomainRegistry, ExtractionContext};
use crate::ports::AgentStateStore;

/// Metadata key listing steering-capable domains whose triggers the
/// current message mentions.
pub const TRIGGERED_DOMAINS_KEY: &str = "triggered_domains";

pub struct ExtractionStage {
    domains: Arc<DomainRegistry>,
    agent_state: Arc<dyn AgentStateStore>,
}

impl ExtractionStage {
    pub fn new(domains: Arc<DomainRegistry>, agent_state: Arc<dyn AgentStateStore>) -> Self {
        Self {
            domains,
            agent_state,
        }
    }
}

#[async_trait]
impl Stage for ExtractionStage {
    fn name(&self) -> &str {
        "extraction"
    }

    async fn run(
        &self,
        state: &ConversationState,
        ctx: &mut TurnContext,
    ) -> Result<ConversationState, StageError> {
        let mut next = state.clone();

        let triggered: Vec<&str> = self
            .domains
            .get_active_domains()
            .into_iter()
            .filter(|d| d.capabilities.steering && d.config.is_triggered_by(&ctx.message))
            .map(|d| d.id.as_str())
            .collect();
        next.set_metadata(TRIGGERED_DOMAINS_KEY, json!(triggered));

        let extraction_ctx = ExtractionContext {
            message: &ctx.message,
            state,
            agent_state: self.agent_state.as_ref(),
        };

        for (domain, extractor) in self.domains.active_extractors() {
            match extractor.extract(&extraction_ctx).await {
                Ok(Some(result)) => {
                    tracing::debug!(domain_id = %domain.id, "Extraction recorded");
                    next.append_extraction(result);
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        domain_id = %domain.id,
                        conversation_id = %state.conversation_id,
                        error = %error,
                        "Extractor failed, skipping domain"
                    );
                }
            }
        }

        Ok(next)
    }
}
