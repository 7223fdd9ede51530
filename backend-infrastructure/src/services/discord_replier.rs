use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::{json, Value};

use backend_domain::{truncate_chars, ChatReplier, InboundMessage};

const MAX_MESSAGE_CHARS: usize = 2000;

/// Replies through the Discord REST API, threaded onto the source message.
pub struct DiscordReplier {
    client: Client,
    api_base: String,
    token: String,
}

impl DiscordReplier {
    pub fn new(api_base: String, token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Discord HTTP client")?;
        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    /// Plain channel message, used for command answers.
    pub async fn send(&self, channel_id: &str, content: &str) -> Result<()> {
        self.post_message(channel_id, reply_body(content, None)).await
    }

    async fn post_message(&self, channel_id: &str, body: Value) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/channels/{}/messages", self.api_base, channel_id))
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .json(&body)
            .send()
            .await
            .context("failed to call Discord API")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("Discord returned {}: {}", status, text);
        }
        Ok(())
    }
}

fn reply_body(content: &str, reply_to: Option<&str>) -> Value {
    let mut body = json!({
        "content": truncate_chars(content, MAX_MESSAGE_CHARS),
        "allowed_mentions": { "parse": [], "replied_user": false },
    });
    if let Some(message_id) = reply_to.filter(|id| !id.is_empty()) {
        body["message_reference"] = json!({
            "message_id": message_id,
            "fail_if_not_exists": false,
        });
    }
    body
}

#[async_trait]
impl ChatReplier for DiscordReplier {
    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<()> {
        self.post_message(&message.channel_id, reply_body(text, Some(&message.message_id)))
            .await
    }
}
