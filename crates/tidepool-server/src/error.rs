//! Typed-error to HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tidepool_auth::AuthError;
use tidepool_social::GuardError;
use tracing::error;

/// Error surface of every handler.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Guard(GuardError),
    /// Missing or malformed `Authorization: Bearer` header.
    MissingBearer,
    /// The bearer token did not verify as an access token.
    InvalidAccessToken,
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<GuardError> for ApiError {
    fn from(e: GuardError) -> Self {
        ApiError::Guard(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials
                | AuthError::InvalidOrExpiredRefreshToken
                | AuthError::RefreshTokenMismatch => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AuthError::Store(_) => StatusCode::BAD_GATEWAY,
                AuthError::Hash(_) | AuthError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Guard(e) => match e {
                GuardError::SelfReference => StatusCode::BAD_REQUEST,
                GuardError::AlreadyExists => StatusCode::CONFLICT,
                GuardError::NotFound => StatusCode::NOT_FOUND,
                GuardError::Store(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::MissingBearer | ApiError::InvalidAccessToken => StatusCode::UNAUTHORIZED,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.code(),
            ApiError::Guard(e) => e.code(),
            ApiError::MissingBearer | ApiError::InvalidAccessToken => "unauthorized",
        }
    }

    /// Client-facing message. 5xx responses get a generic body; the
    /// details stay in the logs.
    fn message(&self) -> String {
        let status = self.status();
        if status.is_server_error() {
            return "request could not be completed".to_string();
        }
        match self {
            ApiError::Auth(e) => e.to_string(),
            ApiError::Guard(e) => e.to_string(),
            ApiError::MissingBearer => "missing bearer token".to_string(),
            ApiError::InvalidAccessToken => "invalid access token".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                ApiError::Auth(e) => error!(code = e.code(), %e, "Request failed"),
                ApiError::Guard(e) => error!(code = e.code(), %e, "Request failed"),
                _ => {}
            }
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.message(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_store::StoreError;

    #[test]
    fn test_credential_failures_map_to_401() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::RefreshTokenMismatch).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidOrExpiredRefreshToken).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_guard_failures_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(GuardError::SelfReference).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(GuardError::AlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(GuardError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_store_failures_map_to_502_with_generic_body() {
        let err = ApiError::from(AuthError::Store(StoreError::Conflict));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), "request could not be completed");
    }
}
