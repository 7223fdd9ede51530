use async_trait::async_trait;
use serde::Serialize;

use crate::entities::{CandidateEvent, EventOutcome, InboundMessage, MessageContext};
use crate::value_objects::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Low-randomness settings for structured extraction.
    pub const EXTRACTION: GenerationConfig = GenerationConfig {
        temperature: 0.1,
        top_p: 0.95,
        top_k: 64,
        max_output_tokens: 1024,
    };
}

/// Generative model call; returns raw, untrusted text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        input: &str,
        config: &GenerationConfig,
    ) -> anyhow::Result<String>;
}

/// Outbound API that performs canonical persistence.
#[async_trait]
pub trait DeadlineDelivery: Send + Sync {
    async fn deliver(&self, event: &CandidateEvent) -> anyhow::Result<RecordId>;
}

/// Sends a user-visible reply back to where a message came from.
#[async_trait]
pub trait ChatReplier: Send + Sync {
    async fn reply(&self, message: &InboundMessage, text: &str) -> anyhow::Result<()>;
}

/// Turns message text into an event outcome. Implementations must not fail;
/// every problem degrades to `NoEvent` or `ModelUnavailable`.
#[async_trait]
pub trait EventDetector: Send + Sync {
    fn name(&self) -> &'static str;
    async fn detect(&self, text: &str, context: &MessageContext) -> EventOutcome;
}
