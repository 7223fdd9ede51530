// In-process fakes for the ports, shared by the application tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use backend_domain::{
    CandidateEvent, Category, ChatReplier, DeadlineDelivery, DeadlineFilter, DeadlineRepository,
    EventDetector, EventOutcome, GenerationConfig, InboundMessage, MessageContext, ModelClient,
    RecordId, RuntimeConfig, StoredDeadline, SOURCE_DISCORD_BOT,
};
use chrono::{TimeZone, Utc};
use tokio::sync::Mutex;

use crate::{AppState, ExtractionPipeline, Metrics, RecordStore, TokenService};

pub fn candidate(message_id: &str, due_date: &str) -> CandidateEvent {
    CandidateEvent {
        title: "Problem Set 4".to_string(),
        organization: "CS101".to_string(),
        description: "Submit on the portal".to_string(),
        due_date_canonical: due_date.to_string(),
        due_date_raw: Some("April 9".to_string()),
        category: Category::Deadline,
        link: None,
        location: None,
        time: None,
        source_message_id: Some(message_id.to_string()),
        channel_name: "cs101-assignments".to_string(),
        guild_name: "Campus".to_string(),
        author_id: "42".to_string(),
        author_name: "alex".to_string(),
        received_at: Utc
            .with_ymd_and_hms(2025, 4, 9, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
        raw_content: "PS4 due April 9".to_string(),
        source: SOURCE_DISCORD_BOT.to_string(),
    }
}

pub fn message(message_id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        message_id: message_id.to_string(),
        text: text.to_string(),
        channel_id: "555".to_string(),
        channel_name: "cs101-assignments".to_string(),
        guild_id: Some("1".to_string()),
        guild_name: "Campus".to_string(),
        author_id: "42".to_string(),
        author_name: "alex".to_string(),
        permalink: format!("https://discord.com/channels/1/555/{}", message_id),
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: Vec::new(),
        jwt_secret: "test-secret".to_string(),
        token_expire_minutes: 60,
        admin_username: "admin".to_string(),
        admin_password: Some("hunter2".to_string()),
        bot_api_key: Some("bot-key".to_string()),
        api_base_url: None,
        model_timeout_seconds: 2,
        store_timeout_seconds: 2,
        delivery_timeout_seconds: 2,
        request_timeout_seconds: 5,
        max_body_bytes: 1024 * 1024,
        discord_token: None,
        discord_guild_ids: Vec::new(),
        discord_gateway_url: String::new(),
        discord_api_base: String::new(),
        legacy_detector_enabled: false,
        ingest_queue_capacity: 8,
    }
}

#[derive(Default)]
pub struct FakeRepository {
    records: Mutex<Vec<StoredDeadline>>,
    writes: Mutex<usize>,
    fail_next: Mutex<bool>,
    slow_lookups: Mutex<bool>,
}

impl FakeRepository {
    pub async fn seed(&self, record: StoredDeadline) {
        self.records.lock().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn writes(&self) -> usize {
        *self.writes.lock().await
    }

    pub async fn get(&self, id: &RecordId) -> Option<StoredDeadline> {
        self.records
            .lock()
            .await
            .iter()
            .find(|record| &record.id == id)
            .cloned()
    }

    /// Makes every message-id lookup sleep briefly, widening check-then-write gaps.
    pub async fn slow_lookups(&self) {
        *self.slow_lookups.lock().await = true;
    }

    pub async fn fail_next(&self) {
        *self.fail_next.lock().await = true;
    }

    async fn check_failure(&self) -> anyhow::Result<()> {
        let mut flag = self.fail_next.lock().await;
        if *flag {
            *flag = false;
            bail!("repository offline");
        }
        Ok(())
    }
}

#[async_trait]
impl DeadlineRepository for FakeRepository {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        self.check_failure().await
    }

    async fn find_by_message_id(&self, message_id: &str) -> anyhow::Result<Option<StoredDeadline>> {
        self.check_failure().await?;
        if *self.slow_lookups.lock().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|record| record.message_id() == message_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &RecordId) -> anyhow::Result<Option<StoredDeadline>> {
        self.check_failure().await?;
        Ok(self.get(id).await)
    }

    async fn insert(&self, record: &StoredDeadline) -> anyhow::Result<()> {
        self.check_failure().await?;
        self.records.lock().await.push(record.clone());
        *self.writes.lock().await += 1;
        Ok(())
    }

    async fn replace(&self, record: &StoredDeadline) -> anyhow::Result<()> {
        self.check_failure().await?;
        let mut records = self.records.lock().await;
        let slot = records
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or_else(|| anyhow!("record {} not found", record.id))?;
        *slot = record.clone();
        *self.writes.lock().await += 1;
        Ok(())
    }

    async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: &DeadlineFilter,
    ) -> anyhow::Result<Vec<StoredDeadline>> {
        self.check_failure().await?;
        let mut records: Vec<StoredDeadline> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.event.received_at.cmp(&a.event.received_at));
        Ok(records.into_iter().skip(skip).take(limit).collect())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.check_failure().await
    }
}

/// Replays scripted model responses; `Err` entries simulate an unreachable model.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<usize>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn replying(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
            delay: None,
        }
    }

    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> usize {
        *self.calls.lock().await
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(
        &self,
        _prompt: &str,
        _input: &str,
        _config: &GenerationConfig,
    ) -> anyhow::Result<String> {
        *self.calls.lock().await += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.responses.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(anyhow!(reason)),
            None => Err(anyhow!("no scripted response")),
        }
    }
}

#[derive(Default)]
pub struct FakeDelivery {
    pub fail: bool,
    delivered: Mutex<Vec<CandidateEvent>>,
}

impl FakeDelivery {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn delivered(&self) -> usize {
        self.delivered.lock().await.len()
    }
}

#[async_trait]
impl DeadlineDelivery for FakeDelivery {
    async fn deliver(&self, event: &CandidateEvent) -> anyhow::Result<RecordId> {
        if self.fail {
            bail!("api unreachable");
        }
        self.delivered.lock().await.push(event.clone());
        Ok(RecordId::from("remote-id"))
    }
}

#[derive(Default)]
pub struct RecordingReplier {
    replies: Mutex<Vec<String>>,
}

impl RecordingReplier {
    pub async fn replies(&self) -> Vec<String> {
        self.replies.lock().await.clone()
    }
}

#[async_trait]
impl ChatReplier for RecordingReplier {
    async fn reply(&self, _message: &InboundMessage, text: &str) -> anyhow::Result<()> {
        self.replies.lock().await.push(text.to_string());
        Ok(())
    }
}

pub struct FixedDetector(pub EventOutcome);

#[async_trait]
impl EventDetector for FixedDetector {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn detect(&self, _text: &str, _context: &MessageContext) -> EventOutcome {
        self.0.clone()
    }
}

pub fn app_state(
    repo: Arc<FakeRepository>,
    model: Arc<ScriptedModel>,
    delivery: Option<Arc<FakeDelivery>>,
) -> AppState {
    let config = runtime_config();
    let timeout = Duration::from_secs(config.store_timeout_seconds);
    AppState {
        record_store: Arc::new(RecordStore::new(repo, timeout)),
        detector: Arc::new(ExtractionPipeline::new(
            model,
            Duration::from_secs(config.model_timeout_seconds),
        )),
        fallback_detector: None,
        delivery: delivery.map(|d| d as Arc<dyn DeadlineDelivery>),
        tokens: Arc::new(TokenService::new(
            &config.jwt_secret,
            config.token_expire_minutes,
        )),
        metrics: Arc::new(Metrics::default()),
        config,
    }
}
