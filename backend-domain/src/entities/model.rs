use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{CandidateEvent, StoredDeadline};
use crate::value_objects::CanonicalDate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineView {
    pub id: String,
    pub title: String,
    pub course: String,
    pub club: String,
    pub description: String,
    pub due_date: String,
    pub date_str: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date_raw: Option<String>,
    pub raw_content: String,
    pub channel_name: String,
    pub guild_name: String,
    pub message_id: String,
    pub author_id: String,
    pub author_name: String,
    pub timestamp: DateTime<Utc>,
    pub link: Option<String>,
    pub source: String,
    pub category: String,
    pub location: Option<String>,
    pub time: Option<String>,
}

impl From<&StoredDeadline> for DeadlineView {
    fn from(record: &StoredDeadline) -> Self {
        let event = &record.event;
        Self {
            id: record.id.to_string(),
            title: event.title.clone(),
            course: event.organization.clone(),
            club: event.organization.clone(),
            description: event.description.clone(),
            due_date: iso_due_date(&event.due_date_canonical),
            date_str: event.due_date_canonical.clone(),
            due_date_raw: event.due_date_raw.clone(),
            raw_content: event.raw_content.clone(),
            channel_name: event.channel_name.clone(),
            guild_name: event.guild_name.clone(),
            message_id: record.message_id().to_string(),
            author_id: event.author_id.clone(),
            author_name: event.author_name.clone(),
            timestamp: event.received_at,
            link: event.link.clone(),
            source: event.source.clone(),
            category: event.category.to_string(),
            location: event.location.clone(),
            time: event.time.clone(),
        }
    }
}

/// ISO-8601 midnight for a canonical date; other strings pass through unchanged.
pub fn iso_due_date(date_str: &str) -> String {
    match CanonicalDate::parse(date_str) {
        Some(date) => format!("{}T00:00:00", date),
        None => date_str.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineList {
    pub deadlines: Vec<DeadlineView>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeadlineListQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub club: Option<String>,
    pub category: Option<String>,
}

/// Body of `POST /bot/deadlines`, shared by the server handler and the delivery client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotDeadlinePayload {
    pub deadline: BotDeadline,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotDeadline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_str: Option<String>,
    // Provenance extensions; older senders omit them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// When the source message was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&CandidateEvent> for BotDeadline {
    fn from(event: &CandidateEvent) -> Self {
        Self {
            course: Some(event.organization.clone()),
            club: Some(event.organization.clone()),
            title: event.title.clone(),
            description: Some(event.description.clone()),
            due_date: iso_due_date(&event.due_date_canonical),
            link: event.link.clone(),
            location: event.location.clone(),
            time: event.time.clone(),
            category: Some(event.category.to_string()),
            source: Some(event.source.clone()),
            message_id: event.source_message_id.clone(),
            date_str: Some(event.due_date_canonical.clone()),
            date_raw: event.due_date_raw.clone(),
            raw_content: Some(event.raw_content.clone()),
            channel_name: Some(event.channel_name.clone()),
            guild_name: Some(event.guild_name.clone()),
            author_id: Some(event.author_id.clone()),
            author_name: Some(event.author_name.clone()),
            timestamp: Some(event.received_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotDeadlineCreated {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub token_expire_minutes: u64,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub bot_api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub model_timeout_seconds: u64,
    pub store_timeout_seconds: u64,
    pub delivery_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub max_body_bytes: u64,
    pub discord_token: Option<String>,
    pub discord_guild_ids: Vec<String>,
    pub discord_gateway_url: String,
    pub discord_api_base: String,
    pub legacy_detector_enabled: bool,
    pub ingest_queue_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage_backend: String,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub fallback_model: Option<String>,
    pub base_url: String,
}
