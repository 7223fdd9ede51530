use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use backend_domain::{BotDeadline, BotDeadlinePayload, CandidateEvent, DeadlineDelivery, RecordId};

/// Forwards detected events to `POST {base}/bot/deadlines`.
pub struct ApiDeadlineDelivery {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiDeadlineDelivery {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build delivery HTTP client")?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[async_trait]
impl DeadlineDelivery for ApiDeadlineDelivery {
    async fn deliver(&self, event: &CandidateEvent) -> Result<RecordId> {
        let payload = BotDeadlinePayload {
            deadline: BotDeadline::from(event),
            api_key: self.api_key.clone(),
        };
        let resp = self
            .client
            .post(format!("{}/bot/deadlines", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("failed to reach deadline API")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("deadline API returned {}: {}", status, text);
        }
        let created: CreatedResponse = resp
            .json()
            .await
            .context("failed to parse deadline API response")?;
        Ok(RecordId(created.id))
    }
}
