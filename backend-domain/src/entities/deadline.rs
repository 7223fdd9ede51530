// Deadline entities
// The normalized candidate record and its persisted form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{is_canonical_date, Category, RecordId};

pub const SOURCE_DISCORD_BOT: &str = "discord_bot";
pub const SOURCE_API: &str = "api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub title: String,
    pub organization: String,
    pub description: String,
    /// Expected `YYYY-MM-DD`; only checked when the record is stored.
    pub due_date_canonical: String,
    /// Model-supplied date text; `None` when the date fell back to the reference day.
    pub due_date_raw: Option<String>,
    pub category: Category,
    pub link: Option<String>,
    pub location: Option<String>,
    pub time: Option<String>,
    pub source_message_id: Option<String>,
    pub channel_name: String,
    pub guild_name: String,
    pub author_id: String,
    pub author_name: String,
    pub received_at: DateTime<Utc>,
    pub raw_content: String,
    pub source: String,
}

impl CandidateEvent {
    pub fn has_explicit_date(&self) -> bool {
        self.due_date_raw
            .as_deref()
            .map(|raw| !raw.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDeadline {
    pub id: RecordId,
    pub event: CandidateEvent,
}

impl StoredDeadline {
    pub fn has_canonical_date(&self) -> bool {
        is_canonical_date(&self.event.due_date_canonical)
    }

    pub fn message_id(&self) -> &str {
        self.event.source_message_id.as_deref().unwrap_or("")
    }
}

/// Optional exact-match predicate for list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeadlineFilter {
    #[serde(default)]
    pub club: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl DeadlineFilter {
    pub fn normalized(self) -> Self {
        Self {
            club: self
                .club
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            category: self
                .category
                .map(|value| value.trim().to_lowercase())
                .filter(|value| !value.is_empty()),
        }
    }

    pub fn matches(&self, record: &StoredDeadline) -> bool {
        let club_ok = self
            .club
            .as_deref()
            .map(|club| record.event.organization == club)
            .unwrap_or(true);
        let category_ok = self
            .category
            .as_deref()
            .map(|category| record.event.category.as_str() == category)
            .unwrap_or(true);
        club_ok && category_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(RecordId),
    /// An existing record with a malformed date was replaced in place.
    Upgraded(RecordId),
    /// A record with a valid date already exists; nothing was written.
    Unchanged(RecordId),
}

impl UpsertOutcome {
    pub fn id(&self) -> &RecordId {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Upgraded(id) | UpsertOutcome::Unchanged(id) => id,
        }
    }

    pub fn into_id(self) -> RecordId {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Upgraded(id) | UpsertOutcome::Unchanged(id) => id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted(_) => "inserted",
            UpsertOutcome::Upgraded(_) => "upgraded",
            UpsertOutcome::Unchanged(_) => "unchanged",
        }
    }
}
