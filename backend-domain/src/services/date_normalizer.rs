// Date normalizer
// Natural-language date expressions -> canonical calendar dates.
// Numeric forms are read month-first (US convention).

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::errors::DateParseError;
use crate::value_objects::CanonicalDate;

const FILLER_WORDS: &[&str] = &["at", "on", "and", "of", "the"];
const ZONE_WORDS: &[&str] = &[
    "utc", "gmt", "est", "edt", "cst", "cdt", "mst", "mdt", "pst", "pdt",
];

/// Resolves `raw` against `reference`, in priority order: `today`, `tomorrow`,
/// yearless expressions (reference year appended, then retried bare), and
/// expressions that carry their own year. Never substitutes a date on failure.
pub fn normalize_date(raw: &str, reference: NaiveDate) -> Result<CanonicalDate, DateParseError> {
    let expression = raw.trim();
    if expression.is_empty() {
        return Err(DateParseError::new(raw, "empty date expression"));
    }

    let words = word_tokens(expression);
    if words.iter().any(|word| word == "today") {
        return Ok(CanonicalDate::new(reference));
    }
    if words.iter().any(|word| word == "tomorrow") {
        return reference
            .checked_add_days(Days::new(1))
            .map(CanonicalDate::new)
            .ok_or_else(|| DateParseError::new(raw, "date out of range"));
    }

    let has_year = words
        .iter()
        .any(|word| word.len() == 4 && word.chars().all(|c| c.is_ascii_digit()));
    if has_year {
        return parse_natural_date(expression, reference);
    }

    let with_year = format!("{}, {}", expression, reference.year());
    parse_natural_date(&with_year, reference)
        .or_else(|_| parse_natural_date(expression, reference))
}

/// Lowercased alphanumeric runs, so `today's` still yields `today`.
fn word_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Default)]
struct DateParts {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    weekday: Option<Weekday>,
    numbers: Vec<u32>,
}

pub fn parse_natural_date(text: &str, reference: NaiveDate) -> Result<CanonicalDate, DateParseError> {
    let mut parts = DateParts::default();
    let tokens = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(|token| token.trim_matches(|c: char| matches!(c, '.' | '(' | ')' | '\'' | '"')))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase);

    for token in tokens {
        if let Some(date) = numeric_date(&token) {
            let (year, month, day) = date.map_err(|reason| DateParseError::new(text, reason))?;
            if parts.month.is_some() || parts.day.is_some() {
                return Err(DateParseError::new(text, "more than one date in expression"));
            }
            parts.month = Some(month);
            parts.day = Some(day);
            if let Some(year) = year {
                set_year(&mut parts, year, text)?;
            }
            continue;
        }
        if is_time_of_day(&token) || FILLER_WORDS.contains(&token.as_str()) || ZONE_WORDS.contains(&token.as_str()) {
            continue;
        }
        if let Some(month) = month_from_name(&token) {
            if parts.month.is_some() {
                return Err(DateParseError::new(text, "more than one month in expression"));
            }
            parts.month = Some(month);
            continue;
        }
        if let Some(weekday) = weekday_from_name(&token) {
            parts.weekday = Some(weekday);
            continue;
        }
        if let Some(number) = strip_ordinal(&token) {
            if token.len() == 4 {
                set_year(&mut parts, i32::try_from(number).unwrap_or(i32::MAX), text)?;
            } else if token.len() <= 4 {
                parts.numbers.push(number);
            } else {
                return Err(DateParseError::new(text, format!("unrecognised number '{}'", token)));
            }
            continue;
        }
        return Err(DateParseError::new(text, format!("unrecognised token '{}'", token)));
    }

    resolve(parts, reference).map_err(|reason| DateParseError::new(text, reason))
}

fn set_year(parts: &mut DateParts, year: i32, text: &str) -> Result<(), DateParseError> {
    match parts.year {
        Some(existing) if existing != year => {
            Err(DateParseError::new(text, "conflicting years in expression"))
        }
        _ => {
            parts.year = Some(year);
            Ok(())
        }
    }
}

fn resolve(mut parts: DateParts, reference: NaiveDate) -> Result<CanonicalDate, String> {
    let mut numbers = std::mem::take(&mut parts.numbers).into_iter();

    if parts.month.is_some() && parts.day.is_none() {
        parts.day = numbers.next();
    } else if parts.month.is_none() && parts.day.is_none() {
        match (numbers.next(), numbers.next()) {
            (Some(month), Some(day)) => {
                parts.month = Some(month);
                parts.day = Some(day);
            }
            (Some(day), None) => {
                parts.month = Some(reference.month());
                parts.day = Some(day);
            }
            _ => {}
        }
    }
    if let Some(year) = numbers.next() {
        if parts.year.is_some() {
            return Err("too many numbers in expression".to_string());
        }
        parts.year = Some(expand_short_year(year)?);
    }
    if numbers.next().is_some() {
        return Err("too many numbers in expression".to_string());
    }

    match (parts.month, parts.day) {
        (Some(month), Some(day)) => {
            let year = parts.year.unwrap_or_else(|| reference.year());
            NaiveDate::from_ymd_opt(year, month, day)
                .map(CanonicalDate::new)
                .ok_or_else(|| format!("no such calendar day {}-{}-{}", year, month, day))
        }
        (Some(_), None) => Err("month without a day".to_string()),
        (None, _) => match parts.weekday {
            Some(weekday) => Ok(CanonicalDate::new(next_weekday_on_or_after(reference, weekday))),
            None => Err("no date components found".to_string()),
        },
    }
}

fn expand_short_year(value: u32) -> Result<i32, String> {
    match value {
        0..=99 => Ok(2000 + value as i32),
        _ => Err(format!("ambiguous year '{}'", value)),
    }
}

fn next_weekday_on_or_after(reference: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - reference.weekday().num_days_from_monday()) % 7;
    reference
        .checked_add_days(Days::new(u64::from(ahead)))
        .unwrap_or(reference)
}

/// `2025-04-15`, `2025/4/15`, `4/15/2025`, `4/15/25`, `4/15`, `04-15-2025`,
/// and ISO datetimes (`2025-04-15T10:00`). `None` when the token is not numeric.
fn numeric_date(token: &str) -> Option<Result<(Option<i32>, u32, u32), String>> {
    let token = match token.find('t') {
        Some(idx) if idx == 10 && token.as_bytes().get(4) == Some(&b'-') => &token[..idx],
        _ => token,
    };
    if !token.contains(['/', '-', '.']) {
        return None;
    }
    let fields: Vec<&str> = token.split(['/', '-', '.']).collect();
    if fields.iter().any(|field| field.is_empty() || !field.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    let numbers: Vec<u32> = fields.iter().filter_map(|field| field.parse().ok()).collect();
    if numbers.len() != fields.len() {
        return Some(Err(format!("number out of range in '{}'", token)));
    }

    let parsed = match (fields.as_slice(), numbers.as_slice()) {
        ([y, _, _], [year, month, day]) if y.len() == 4 => Ok((Some(*year as i32), *month, *day)),
        ([_, _, y], [month, day, year]) if y.len() == 4 => Ok((Some(*year as i32), *month, *day)),
        ([_, _, y], [month, day, year]) if y.len() == 2 => {
            expand_short_year(*year).map(|year| (Some(year), *month, *day))
        }
        ([m, _], [month, day]) if m.len() <= 2 => Ok((None, *month, *day)),
        _ => Err(format!("unsupported numeric date '{}'", token)),
    };
    Some(parsed)
}

fn is_time_of_day(token: &str) -> bool {
    if matches!(token, "am" | "pm" | "a.m" | "p.m" | "noon" | "midnight") {
        return true;
    }
    let body = token
        .strip_suffix("am")
        .or_else(|| token.strip_suffix("pm"))
        .or_else(|| token.strip_suffix("a.m"))
        .or_else(|| token.strip_suffix("p.m"));
    let has_meridiem = body.is_some();
    let body = body.unwrap_or(token);
    if body.is_empty() {
        return false;
    }
    let all_time_chars = body.chars().all(|c| c.is_ascii_digit() || c == ':');
    let has_digit = body.chars().any(|c| c.is_ascii_digit());
    all_time_chars && has_digit && (has_meridiem || body.contains(':'))
}

fn month_from_name(token: &str) -> Option<u32> {
    let month = match token {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from_name(token: &str) -> Option<Weekday> {
    let weekday = match token {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// `15`, `15th`, `1st`, `2nd`, `3rd` -> the number.
fn strip_ordinal(token: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .unwrap_or(token);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
