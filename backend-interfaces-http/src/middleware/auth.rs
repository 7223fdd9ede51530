use axum::http::HeaderMap;
use tracing::debug;

use backend_application::AppState;
use backend_domain::TokenClaims;

use crate::error::HttpError;

/// Requires a valid bearer token signed by this process.
pub fn authorize(state: &AppState, headers: &HeaderMap) -> Result<TokenClaims, HttpError> {
    let token = extract_bearer(headers).ok_or(HttpError::Unauthorized)?;
    state.tokens.verify(&token).map_err(|err| {
        debug!("rejected bearer token: {:#}", err);
        HttpError::Unauthorized
    })
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc.def"));
    }
}
