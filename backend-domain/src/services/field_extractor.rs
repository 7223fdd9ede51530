// Field extractor
// RawModelResult + message context -> CandidateEvent, with exhaustive fallbacks

use chrono::NaiveDate;

use crate::entities::{CandidateEvent, MessageContext, RawModelResult, SOURCE_DISCORD_BOT};
use crate::services::date_normalizer::normalize_date;
use crate::utils::{non_blank, truncate_chars};
use crate::value_objects::{CanonicalDate, Category};

pub const UNTITLED_EVENT: &str = "Untitled Event";
pub const UNKNOWN_ORGANIZATION: &str = "UNKNOWN";
pub const DESCRIPTION_FALLBACK_CHARS: usize = 500;

/// Never fails. A date that is missing or unparseable falls back to `reference`
/// and leaves `due_date_raw` empty.
pub fn extract_candidate(
    raw: &RawModelResult,
    context: &MessageContext,
    reference: NaiveDate,
) -> CandidateEvent {
    let (due_date_canonical, due_date_raw) = resolve_due_date(raw.date_expression.as_deref(), reference);
    let location = non_blank(raw.location.as_deref());
    let time = non_blank(raw.time.as_deref());

    CandidateEvent {
        title: non_blank(raw.title.as_deref()).unwrap_or_else(|| UNTITLED_EVENT.to_string()),
        organization: non_blank(raw.organization.as_deref())
            .unwrap_or_else(|| organization_from_channel(&context.channel_name)),
        description: build_description(
            raw.description.as_deref(),
            &context.text,
            location.as_deref(),
            time.as_deref(),
        ),
        due_date_canonical: due_date_canonical.to_string(),
        due_date_raw,
        category: raw
            .category
            .as_deref()
            .map(Category::from)
            .unwrap_or_default(),
        link: pick_link(raw, context),
        location,
        time,
        source_message_id: non_blank(Some(context.message_id.as_str())),
        channel_name: context.channel_name.clone(),
        guild_name: context.guild_name.clone(),
        author_id: context.author_id.clone(),
        author_name: context.author_name.clone(),
        received_at: context.received_at,
        raw_content: context.text.clone(),
        source: SOURCE_DISCORD_BOT.to_string(),
    }
}

fn resolve_due_date(expression: Option<&str>, reference: NaiveDate) -> (CanonicalDate, Option<String>) {
    let Some(expression) = non_blank(expression) else {
        return (CanonicalDate::new(reference), None);
    };
    match normalize_date(&expression, reference) {
        Ok(date) => (date, Some(expression)),
        Err(_) => (CanonicalDate::new(reference), None),
    }
}

/// `cs101-assignments` -> `CS101`; `general` -> `GENERAL`.
pub fn organization_from_channel(channel_name: &str) -> String {
    let name = channel_name.trim();
    if name.is_empty() {
        return UNKNOWN_ORGANIZATION.to_string();
    }
    match name.split_once('-') {
        Some((head, _)) if !head.trim().is_empty() => head.trim().to_uppercase(),
        _ => name.to_uppercase(),
    }
}

fn build_description(
    description: Option<&str>,
    message_text: &str,
    location: Option<&str>,
    time: Option<&str>,
) -> String {
    let mut text = non_blank(description)
        .unwrap_or_else(|| truncate_chars(message_text, DESCRIPTION_FALLBACK_CHARS));
    if let Some(location) = location {
        text.push_str("\nLocation: ");
        text.push_str(location);
    }
    if let Some(time) = time {
        text.push_str("\nTime: ");
        text.push_str(time);
    }
    text
}

fn pick_link(raw: &RawModelResult, context: &MessageContext) -> Option<String> {
    raw.links
        .iter()
        .find_map(|link| non_blank(Some(link.as_str())))
        .or_else(|| non_blank(raw.link.as_deref()))
        .or_else(|| non_blank(Some(context.fallback_link.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 9).expect("reference date")
    }

    fn context(channel: &str, text: &str) -> MessageContext {
        MessageContext {
            message_id: "1234".to_string(),
            text: text.to_string(),
            channel_name: channel.to_string(),
            guild_name: "Campus".to_string(),
            author_id: "42".to_string(),
            author_name: "alex".to_string(),
            fallback_link: "https://discord.com/channels/1/2/1234".to_string(),
            received_at: Utc.with_ymd_and_hms(2025, 4, 9, 15, 0, 0).single().expect("time"),
        }
    }

    #[test]
    fn empty_result_uses_every_fallback() {
        let ctx = context("cs101-assignments", "Homework posted");
        let candidate = extract_candidate(&RawModelResult::default(), &ctx, reference());
        assert_eq!(candidate.organization, "CS101");
        assert_eq!(candidate.title, UNTITLED_EVENT);
        assert_eq!(candidate.due_date_canonical, "2025-04-09");
        assert_eq!(candidate.due_date_raw, None);
        assert_eq!(candidate.description, "Homework posted");
        assert_eq!(candidate.category, Category::Event);
        assert_eq!(candidate.link.as_deref(), Some("https://discord.com/channels/1/2/1234"));
        assert_eq!(candidate.source_message_id.as_deref(), Some("1234"));
        assert_eq!(candidate.source, SOURCE_DISCORD_BOT);
    }

    #[test]
    fn parsed_date_keeps_raw_expression() {
        let raw = RawModelResult {
            date_expression: Some("April 15th".to_string()),
            ..RawModelResult::default()
        };
        let candidate = extract_candidate(&raw, &context("general", ""), reference());
        assert_eq!(candidate.due_date_canonical, "2025-04-15");
        assert_eq!(candidate.due_date_raw.as_deref(), Some("April 15th"));
        assert!(candidate.has_explicit_date());
    }

    #[test]
    fn unparseable_date_falls_back_to_reference() {
        let raw = RawModelResult {
            date_expression: Some("sometime next month-ish".to_string()),
            ..RawModelResult::default()
        };
        let candidate = extract_candidate(&raw, &context("general", ""), reference());
        assert_eq!(candidate.due_date_canonical, "2025-04-09");
        assert!(!candidate.has_explicit_date());
    }

    #[test]
    fn channel_without_dash_is_uppercased_whole() {
        assert_eq!(organization_from_channel("general"), "GENERAL");
        assert_eq!(organization_from_channel("robotics-club-events"), "ROBOTICS");
        assert_eq!(organization_from_channel("-misc"), "-MISC");
        assert_eq!(organization_from_channel(""), UNKNOWN_ORGANIZATION);
    }

    #[test]
    fn description_appends_location_then_time() {
        let raw = RawModelResult {
            description: Some("Weekly sync".to_string()),
            location: Some("Room 101".to_string()),
            time: Some("5pm".to_string()),
            ..RawModelResult::default()
        };
        let candidate = extract_candidate(&raw, &context("general", ""), reference());
        assert_eq!(candidate.description, "Weekly sync\nLocation: Room 101\nTime: 5pm");
    }

    #[test]
    fn long_message_is_truncated_for_description() {
        let text = "x".repeat(DESCRIPTION_FALLBACK_CHARS + 40);
        let candidate = extract_candidate(&RawModelResult::default(), &context("general", &text), reference());
        assert_eq!(candidate.description.chars().count(), DESCRIPTION_FALLBACK_CHARS);
        assert_eq!(candidate.raw_content, text);
    }

    #[test]
    fn link_priority_is_links_then_link_then_permalink() {
        let mut raw = RawModelResult {
            links: vec!["".to_string(), "https://first.example".to_string()],
            link: Some("https://single.example".to_string()),
            ..RawModelResult::default()
        };
        let ctx = context("general", "");
        assert_eq!(
            extract_candidate(&raw, &ctx, reference()).link.as_deref(),
            Some("https://first.example")
        );
        raw.links.clear();
        assert_eq!(
            extract_candidate(&raw, &ctx, reference()).link.as_deref(),
            Some("https://single.example")
        );
    }

    #[test]
    fn model_category_and_organization_win() {
        let raw = RawModelResult {
            organization: Some("Chess Club".to_string()),
            category: Some("Meeting".to_string()),
            ..RawModelResult::default()
        };
        let candidate = extract_candidate(&raw, &context("cs101-assignments", ""), reference());
        assert_eq!(candidate.organization, "Chess Club");
        assert_eq!(candidate.category, Category::Meeting);
    }
}
