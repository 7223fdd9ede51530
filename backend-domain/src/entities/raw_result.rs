// Raw model result
// Untrusted, semi-structured model output; every field may be missing

use serde_json::{Map, Value};

const DETECTED_FLAG: &str = "has_event";
const LEGACY_DETECTED_FLAG: &str = "has_deadline";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawModelResult {
    pub event_detected: Option<bool>,
    pub title: Option<String>,
    pub date_expression: Option<String>,
    pub organization: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub time: Option<String>,
    pub links: Vec<String>,
    pub link: Option<String>,
    pub category: Option<String>,
}

impl RawModelResult {
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            event_detected: detection_flag(object),
            title: text_field(object, &["title"]),
            date_expression: text_field(object, &["date_str", "date", "due_date"]),
            organization: text_field(object, &["club", "organization", "course"]),
            description: text_field(object, &["description"]),
            location: text_field(object, &["location"]),
            time: text_field(object, &["time"]),
            links: links_field(object),
            link: text_field(object, &["link"]),
            category: text_field(object, &["category"]),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.event_detected.unwrap_or(false)
    }
}

/// Reads `has_event`, falling back to the older `has_deadline` only when the
/// current flag is absent or unreadable. The current flag wins on disagreement.
pub fn detection_flag(object: &Map<String, Value>) -> Option<bool> {
    object
        .get(DETECTED_FLAG)
        .and_then(flag_value)
        .or_else(|| object.get(LEGACY_DETECTED_FLAG).and_then(flag_value))
}

fn flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        Value::Number(number) => number.as_i64().map(|n| n != 0),
        _ => None,
    }
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(text_value)
}

fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn links_field(object: &Map<String, Value>) -> Vec<String> {
    match object.get("links") {
        Some(Value::Array(items)) => items.iter().filter_map(text_value).collect(),
        Some(value) => text_value(value).into_iter().collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn legacy_flag_is_used_when_current_flag_missing() {
        let raw = RawModelResult::from_object(&object(json!({"has_deadline": true})));
        assert_eq!(raw.event_detected, Some(true));
    }

    #[test]
    fn current_flag_wins_on_disagreement() {
        let raw = RawModelResult::from_object(&object(
            json!({"has_event": false, "has_deadline": true}),
        ));
        assert_eq!(raw.event_detected, Some(false));
        let raw = RawModelResult::from_object(&object(
            json!({"has_event": true, "has_deadline": false}),
        ));
        assert_eq!(raw.event_detected, Some(true));
    }

    #[test]
    fn blank_strings_are_treated_as_absent() {
        let raw = RawModelResult::from_object(&object(
            json!({"has_event": true, "title": "  ", "club": "", "date_str": ""}),
        ));
        assert_eq!(raw.title, None);
        assert_eq!(raw.organization, None);
        assert_eq!(raw.date_expression, None);
    }

    #[test]
    fn aliases_and_single_link_are_accepted() {
        let raw = RawModelResult::from_object(&object(json!({
            "has_event": "true",
            "course": "CS101",
            "links": "https://example.org/form",
        })));
        assert!(raw.is_detected());
        assert_eq!(raw.organization.as_deref(), Some("CS101"));
        assert_eq!(raw.links, vec!["https://example.org/form".to_string()]);
    }

    #[test]
    fn non_string_links_are_skipped() {
        let raw = RawModelResult::from_object(&object(json!({
            "links": [null, "", "https://a.example", 3],
        })));
        assert_eq!(raw.links, vec!["https://a.example".to_string(), "3".to_string()]);
    }
}
