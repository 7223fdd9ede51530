// Message entities
// What the chat platform delivers, and the context extraction runs against

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub text: String,
    pub channel_id: String,
    pub channel_name: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub guild_name: String,
    pub author_id: String,
    pub author_name: String,
    pub permalink: String,
}

impl InboundMessage {
    pub fn context(&self, received_at: DateTime<Utc>) -> MessageContext {
        MessageContext {
            message_id: self.message_id.trim().to_string(),
            text: self.text.clone(),
            channel_name: self.channel_name.clone(),
            guild_name: self.guild_name.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            fallback_link: self.permalink.clone(),
            received_at,
        }
    }
}

/// Provenance and raw text for one message, copied verbatim onto the candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContext {
    pub message_id: String,
    pub text: String,
    pub channel_name: String,
    pub guild_name: String,
    pub author_id: String,
    pub author_name: String,
    /// Platform permalink to the message, used when the model gives no link.
    pub fallback_link: String,
    pub received_at: DateTime<Utc>,
}
