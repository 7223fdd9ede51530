use chrono::{Local, NaiveDate, Utc};

pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn current_nanos() -> i64 {
    Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| current_millis().saturating_mul(1_000_000))
}

/// The reference day for date normalization: the server's local calendar day.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}
