// Legacy pattern detector
// Keyword/regex deadline detection, used only when the model is unavailable

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;

use crate::entities::{EventOutcome, MessageContext, RawModelResult};
use crate::ports::EventDetector;
use crate::services::field_extractor::extract_candidate;
use crate::utils::today_local;

const DATE_FRAGMENT: &str = r"(\w+\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?)";
const TITLE_MAX_CHARS: usize = 50;
const TITLE_KEEP_CHARS: usize = 47;

fn deadline_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            format!(r"(?i)due\s+(?:(?:on|by)\s+)?{}", DATE_FRAGMENT),
            format!(r"(?i)deadline[: ]\s*{}", DATE_FRAGMENT),
            format!(r"(?i)submit\s+(?:(?:before|by)\s+)?{}", DATE_FRAGMENT),
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// First pattern match wins; returns the captured date phrase.
pub fn find_deadline_phrase(text: &str) -> Option<String> {
    deadline_patterns()
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// First sentence of the message, shortened to 50 characters with an ellipsis.
pub fn extract_title(text: &str) -> String {
    let sentence = text.split('.').next().unwrap_or("").trim();
    if sentence.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = sentence.chars().take(TITLE_KEEP_CHARS).collect();
        title.push_str("...");
        title
    } else {
        sentence.to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyPatternDetector;

impl LegacyPatternDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect_at(&self, text: &str, context: &MessageContext, reference: NaiveDate) -> EventOutcome {
        let Some(phrase) = find_deadline_phrase(text) else {
            return EventOutcome::NoEvent;
        };
        let raw = RawModelResult {
            event_detected: Some(true),
            title: Some(extract_title(text)),
            date_expression: Some(phrase),
            category: Some("deadline".to_string()),
            ..RawModelResult::default()
        };
        EventOutcome::event(extract_candidate(&raw, context, reference))
    }
}

#[async_trait]
impl EventDetector for LegacyPatternDetector {
    fn name(&self) -> &'static str {
        "legacy_patterns"
    }

    async fn detect(&self, text: &str, context: &MessageContext) -> EventOutcome {
        self.detect_at(text, context, today_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Category;
    use chrono::Utc;

    fn context(text: &str) -> MessageContext {
        MessageContext {
            message_id: "99".to_string(),
            text: text.to_string(),
            channel_name: "math201-homework".to_string(),
            guild_name: "Campus".to_string(),
            author_id: "7".to_string(),
            author_name: "sam".to_string(),
            fallback_link: "https://discord.com/channels/1/2/99".to_string(),
            received_at: Utc::now(),
        }
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 9).expect("reference date")
    }

    #[test]
    fn all_patterns_compile() {
        assert_eq!(deadline_patterns().len(), 3);
    }

    #[test]
    fn finds_date_phrases() {
        assert_eq!(find_deadline_phrase("Problem set due on April 15th").as_deref(), Some("April 15th"));
        assert_eq!(find_deadline_phrase("DEADLINE: May 2, 2025").as_deref(), Some("May 2, 2025"));
        assert_eq!(find_deadline_phrase("please submit by March 3").as_deref(), Some("March 3"));
        assert_eq!(find_deadline_phrase("see you at lunch"), None);
    }

    #[test]
    fn title_is_first_sentence_or_shortened() {
        assert_eq!(extract_title("Essay due on April 15. Good luck"), "Essay due on April 15");
        let long = "a".repeat(80);
        let title = extract_title(&long);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn detection_builds_deadline_candidate() {
        let text = "Lab report due by April 20th. Upload to the portal.";
        let outcome = LegacyPatternDetector::new().detect_at(text, &context(text), reference());
        let EventOutcome::Event(candidate) = outcome else {
            panic!("expected an event");
        };
        assert_eq!(candidate.title, "Lab report due by April 20th");
        assert_eq!(candidate.due_date_canonical, "2025-04-20");
        assert_eq!(candidate.category, Category::Deadline);
        assert_eq!(candidate.organization, "MATH201");
    }

    #[test]
    fn no_phrase_is_no_event() {
        let outcome = LegacyPatternDetector::new().detect_at("hello", &context("hello"), reference());
        assert_eq!(outcome, EventOutcome::NoEvent);
    }
}
