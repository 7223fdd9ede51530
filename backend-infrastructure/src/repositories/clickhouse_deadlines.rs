use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use backend_domain::{
    current_millis, CandidateEvent, Category, DeadlineFilter, DeadlineRepository, RecordId,
    StoredDeadline,
};

use crate::utils::{millis_to_utc, utc_to_millis};

const TABLE: &str = "deadlines";

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct DeadlineRow {
    pub id: String,
    pub message_id: String,
    pub title: String,
    pub organization: String,
    pub description: String,
    pub due_date: String,
    pub due_date_raw: Option<String>,
    pub category: String,
    pub link: Option<String>,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub channel_name: String,
    pub guild_name: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub received_at: OffsetDateTime,
    pub raw_content: String,
    pub source: String,
    pub version: u64,
}

impl DeadlineRow {
    fn from_record(record: &StoredDeadline, version: u64) -> Self {
        let event = &record.event;
        Self {
            id: record.id.to_string(),
            message_id: record.message_id().to_string(),
            title: event.title.clone(),
            organization: event.organization.clone(),
            description: event.description.clone(),
            due_date: event.due_date_canonical.clone(),
            due_date_raw: event.due_date_raw.clone(),
            category: event.category.to_string(),
            link: event.link.clone(),
            location: event.location.clone(),
            time_of_day: event.time.clone(),
            channel_name: event.channel_name.clone(),
            guild_name: event.guild_name.clone(),
            author_id: event.author_id.clone(),
            author_name: event.author_name.clone(),
            received_at: millis_to_utc(event.received_at.timestamp_millis()),
            raw_content: event.raw_content.clone(),
            source: event.source.clone(),
            version,
        }
    }

    fn into_record(self) -> StoredDeadline {
        let received_at = Utc
            .timestamp_millis_opt(utc_to_millis(self.received_at))
            .single()
            .unwrap_or_else(Utc::now);
        StoredDeadline {
            id: RecordId(self.id),
            event: CandidateEvent {
                title: self.title,
                organization: self.organization,
                description: self.description,
                due_date_canonical: self.due_date,
                due_date_raw: self.due_date_raw,
                category: Category::from(self.category),
                link: self.link,
                location: self.location,
                time: self.time_of_day,
                source_message_id: Some(self.message_id).filter(|id| !id.is_empty()),
                channel_name: self.channel_name,
                guild_name: self.guild_name,
                author_id: self.author_id,
                author_name: self.author_name,
                received_at,
                raw_content: self.raw_content,
                source: self.source,
            },
        }
    }
}

/// Records live in a ReplacingMergeTree keyed by id; a replace is a newer
/// version of the same id and every read uses FINAL.
#[derive(Clone)]
pub struct ClickhouseDeadlineRepository {
    client: Client,
    database: String,
}

impl ClickhouseDeadlineRepository {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    async fn write(&self, record: &StoredDeadline) -> Result<()> {
        let version = u64::try_from(current_millis()).unwrap_or_default();
        let mut insert = self.client.insert(TABLE)?;
        insert.write(&DeadlineRow::from_record(record, version)).await?;
        insert.end().await?;
        Ok(())
    }
}

#[async_trait]
impl DeadlineRepository for ClickhouseDeadlineRepository {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_deadlines = r#"
CREATE TABLE IF NOT EXISTS deadlines (
    id String,
    message_id String,
    title String,
    organization String,
    description String,
    due_date String,
    due_date_raw Nullable(String),
    category String,
    link Nullable(String),
    location Nullable(String),
    time_of_day Nullable(String),
    channel_name String,
    guild_name String,
    author_id String,
    author_name String,
    received_at DateTime64(3),
    raw_content String,
    source String,
    version UInt64
) ENGINE = ReplacingMergeTree(version)
ORDER BY id
"#;

        self.client.query(create_deadlines).execute().await?;
        Ok(())
    }

    async fn find_by_message_id(&self, message_id: &str) -> Result<Option<StoredDeadline>> {
        let rows = self
            .client
            .query("SELECT ?fields FROM deadlines FINAL WHERE message_id = ? ORDER BY received_at ASC LIMIT 1")
            .bind(message_id)
            .fetch_all::<DeadlineRow>()
            .await?;
        Ok(rows.into_iter().next().map(DeadlineRow::into_record))
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<StoredDeadline>> {
        let rows = self
            .client
            .query("SELECT ?fields FROM deadlines FINAL WHERE id = ? LIMIT 1")
            .bind(id.as_str())
            .fetch_all::<DeadlineRow>()
            .await?;
        Ok(rows.into_iter().next().map(DeadlineRow::into_record))
    }

    async fn insert(&self, record: &StoredDeadline) -> Result<()> {
        self.write(record).await
    }

    async fn replace(&self, record: &StoredDeadline) -> Result<()> {
        self.write(record).await
    }

    async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: &DeadlineFilter,
    ) -> Result<Vec<StoredDeadline>> {
        let mut sql = String::from("SELECT ?fields FROM deadlines FINAL WHERE 1 = 1");
        if filter.club.is_some() {
            sql.push_str(" AND organization = ?");
        }
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        sql.push_str(" ORDER BY received_at DESC LIMIT ? OFFSET ?");

        let mut query = self.client.query(&sql);
        if let Some(club) = &filter.club {
            query = query.bind(club.as_str());
        }
        if let Some(category) = &filter.category {
            query = query.bind(category.as_str());
        }
        let rows = query
            .bind(limit as u64)
            .bind(skip as u64)
            .fetch_all::<DeadlineRow>()
            .await?;
        Ok(rows.into_iter().map(DeadlineRow::into_record).collect())
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StoredDeadline {
        StoredDeadline {
            id: RecordId::from("abc"),
            event: CandidateEvent {
                title: "PS4".to_string(),
                organization: "CS101".to_string(),
                description: "Submit online".to_string(),
                due_date_canonical: "2025-04-15".to_string(),
                due_date_raw: Some("April 15th".to_string()),
                category: Category::Deadline,
                link: None,
                location: Some("Room 1".to_string()),
                time: Some("5pm".to_string()),
                source_message_id: Some("m-1".to_string()),
                channel_name: "cs101-assignments".to_string(),
                guild_name: "Campus".to_string(),
                author_id: "42".to_string(),
                author_name: "alex".to_string(),
                received_at: Utc
                    .with_ymd_and_hms(2025, 4, 9, 12, 30, 0)
                    .single()
                    .expect("time"),
                raw_content: "PS4 due April 15th".to_string(),
                source: "discord_bot".to_string(),
            },
        }
    }

    #[test]
    fn row_conversion_preserves_record() {
        let original = record();
        let row = DeadlineRow::from_record(&original, 7);
        assert_eq!(row.message_id, "m-1");
        assert_eq!(row.category, "deadline");
        assert_eq!(row.version, 7);
        assert_eq!(row.into_record(), original);
    }
}
