//! Bearer-token extraction for authenticated routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tidepool_tokens::TokenClass;

/// The authenticated account id, extracted from the access token.
///
/// Adding this parameter makes a handler require authentication.
pub struct AuthUser(pub String);

/// Pull the credential out of an `Authorization` header value. The
/// auth-scheme comparison is case-insensitive (RFC 6750 §2.1).
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim_start();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingBearer)?;
        let token = bearer_token(header).ok_or(ApiError::MissingBearer)?;

        let claims = state
            .tokens
            .verify(token, TokenClass::Access)
            .map_err(|_| ApiError::InvalidAccessToken)?;
        Ok(AuthUser(claims.sub))
    }
}
