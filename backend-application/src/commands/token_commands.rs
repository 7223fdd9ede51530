use backend_domain::{LoginRequest, TokenResponse};
use tracing::warn;

use crate::auth::GUEST_SUBJECT;
use crate::{AppError, AppState};

const TOKEN_TYPE: &str = "bearer";

/// Exchanges the configured admin credentials for a bearer token. Login is
/// disabled entirely when no admin password is configured.
pub fn login(state: &AppState, request: LoginRequest) -> Result<TokenResponse, AppError> {
    let Some(password) = state.config.admin_password.as_deref() else {
        warn!("login attempt while no admin password is configured");
        return Err(AppError::Unauthorized);
    };
    if request.username != state.config.admin_username || request.password != password {
        return Err(AppError::Unauthorized);
    }

    let access_token = state.tokens.issue(&request.username, true)?;
    Ok(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    })
}

pub fn guest_token(state: &AppState) -> Result<TokenResponse, AppError> {
    let access_token = state.tokens.issue(GUEST_SUBJECT, false)?;
    Ok(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    })
}
