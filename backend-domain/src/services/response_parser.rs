// Response parser
// Tolerant decoding of generative-model text into a RawModelResult

use serde_json::{Map, Value};

use crate::entities::RawModelResult;
use crate::errors::ResponseParseError;

/// Removes Markdown code-fence markers, keeping everything between them.
pub fn strip_code_fences(text: &str) -> String {
    let stripped = if text.contains("```json") {
        text.replace("```json", "").replace("```", "")
    } else if text.contains("```") {
        text.replace("```", "")
    } else {
        text.to_string()
    };
    stripped.trim().to_string()
}

/// Parses the response as a JSON object; when that fails, retries on the
/// outermost `{ ... }` substring.
pub fn parse_response_object(text: &str) -> Result<Map<String, Value>, ResponseParseError> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err(ResponseParseError::Empty);
    }
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(object);
    }

    let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) else {
        return Err(ResponseParseError::Malformed("no brace-delimited object".to_string()));
    };
    if end <= start {
        return Err(ResponseParseError::Malformed("unbalanced braces".to_string()));
    }
    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ResponseParseError::Malformed("not an object".to_string())),
        Err(err) => Err(ResponseParseError::Malformed(err.to_string())),
    }
}

/// `Ok(None)` means the model answered but reported no event.
pub fn interpret_response(text: &str) -> Result<Option<RawModelResult>, ResponseParseError> {
    let object = parse_response_object(text)?;
    let raw = RawModelResult::from_object(&object);
    if raw.is_detected() {
        Ok(Some(raw))
    } else {
        Ok(None)
    }
}
