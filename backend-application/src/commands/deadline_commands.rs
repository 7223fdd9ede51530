use backend_domain::{
    non_blank, normalize_date, today_local, BotDeadline, BotDeadlineCreated, BotDeadlinePayload,
    CandidateEvent, CanonicalDate, Category, SOURCE_API,
};
use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::{AppError, AppState};

pub const CREATED_MESSAGE: &str = "Deadline created successfully";

/// `POST /bot/deadlines`: authenticated by the shared bot API key, stored through
/// the same validated upsert the ingestion path uses.
pub async fn create_from_bot(
    state: &AppState,
    payload: BotDeadlinePayload,
) -> Result<BotDeadlineCreated, AppError> {
    authorize_bot(state.config.bot_api_key.as_deref(), &payload.api_key)?;

    let event = candidate_from_payload(payload.deadline, today_local())?;
    let outcome = state.record_store.upsert(event).await?;
    info!("bot deadline {} ({})", outcome.id(), outcome.as_str());

    Ok(BotDeadlineCreated {
        id: outcome.into_id().to_string(),
        message: CREATED_MESSAGE.to_string(),
    })
}

fn authorize_bot(expected: Option<&str>, presented: &str) -> Result<(), AppError> {
    match expected {
        Some(key) if !key.is_empty() && key == presented => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

pub fn candidate_from_payload(
    deadline: BotDeadline,
    reference: NaiveDate,
) -> Result<CandidateEvent, AppError> {
    let organization = non_blank(deadline.club.as_deref())
        .or_else(|| non_blank(deadline.course.as_deref()))
        .ok_or_else(|| AppError::BadRequest("club or course is required".to_string()))?;
    let title = non_blank(Some(deadline.title.as_str()))
        .ok_or_else(|| AppError::BadRequest("title must not be empty".to_string()))?;
    let due_date = resolve_payload_date(&deadline, reference)?;

    Ok(CandidateEvent {
        title,
        organization,
        description: deadline.description.unwrap_or_default(),
        due_date_canonical: due_date.to_string(),
        due_date_raw: non_blank(deadline.date_raw.as_deref()),
        category: deadline
            .category
            .as_deref()
            .map(Category::from)
            .unwrap_or_default(),
        link: non_blank(deadline.link.as_deref()),
        location: non_blank(deadline.location.as_deref()),
        time: non_blank(deadline.time.as_deref()),
        source_message_id: non_blank(deadline.message_id.as_deref()),
        channel_name: deadline.channel_name.unwrap_or_default(),
        guild_name: deadline.guild_name.unwrap_or_default(),
        author_id: deadline.author_id.unwrap_or_default(),
        author_name: deadline.author_name.unwrap_or_default(),
        received_at: deadline.timestamp.unwrap_or_else(Utc::now),
        raw_content: deadline.raw_content.unwrap_or_default(),
        source: non_blank(deadline.source.as_deref()).unwrap_or_else(|| SOURCE_API.to_string()),
    })
}

/// Prefers `date_str`, then the date part of the ISO `due_date`; free text in
/// either is normalized against `reference`.
fn resolve_payload_date(deadline: &BotDeadline, reference: NaiveDate) -> Result<CanonicalDate, AppError> {
    let candidates = [
        non_blank(deadline.date_str.as_deref()),
        non_blank(Some(deadline.due_date.as_str())),
    ];
    for value in candidates.iter().flatten() {
        let date_part = value.split('T').next().unwrap_or(value.as_str());
        if let Some(date) = CanonicalDate::parse(date_part) {
            return Ok(date);
        }
    }
    for value in candidates.iter().flatten() {
        if let Ok(date) = normalize_date(value, reference) {
            return Ok(date);
        }
    }
    Err(AppError::BadRequest(
        "due_date or date_str must be a recognizable date".to_string(),
    ))
}
