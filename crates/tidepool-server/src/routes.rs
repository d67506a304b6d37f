//! HTTP route handlers.

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tidepool_auth::NewAccount;
use tidepool_social::{COLLECTIONS, FOLLOWS, LIKES};
use tidepool_store::{AccountPublic, ProfileUpdate};
use tidepool_tokens::TokenPair;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    account: AccountPublic,
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct IdentityLoginRequest {
    provider_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct EdgeStatusResponse {
    exists: bool,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/identity", post(identity_login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/account", post(register).patch(update_profile))
        .route("/account/{id}", get(account))
        .route("/follows/{id}", post(add_follow).delete(remove_follow))
        .route("/follows/{id}/status", get(follow_status))
        .route("/likes/{id}", post(add_like).delete(remove_like))
        .route("/likes/{id}/status", get(like_status))
        .route(
            "/collections/{id}",
            post(add_collection).delete(remove_collection),
        )
        .route("/collections/{id}/status", get(collection_status))
        .with_state(state)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state.sessions.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        account: outcome.account,
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// Login with a raw identity-provider token. The configured verifier
/// decides whether the token is genuine before any session opens.
async fn identity_login(
    State(state): State<AppState>,
    Json(req): Json<IdentityLoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let identity = state.verifier.verify(&req.provider_token).await?;
    let outcome = state.sessions.login_with_verified_identity(identity).await?;
    Ok(Json(LoginResponse {
        account: outcome.account,
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.sessions.refresh(&req.refresh_token).await?;
    Ok(Json(pair))
}

async fn logout(State(state): State<AppState>, user: AuthUser) -> Result<StatusCode, ApiError> {
    state.sessions.logout(&user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .register(NewAccount {
            email: req.email,
            password: req.password,
            name: req.name,
        })
        .await?;
    Ok(StatusCode::CREATED)
}

async fn account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountPublic>, ApiError> {
    let account = state.sessions.account(&id).await?;
    Ok(Json(account))
}

async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<AccountPublic>, ApiError> {
    let account = state.sessions.update_profile(&user.0, update).await?;
    Ok(Json(account))
}

async fn add_follow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.guard.add(&FOLLOWS, &user.0, &id).await?;
    Ok(StatusCode::CREATED)
}

async fn remove_follow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .guard
        .remove(&FOLLOWS, &user.0, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn follow_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EdgeStatusResponse>, ApiError> {
    let exists = state
        .guard
        .exists(&FOLLOWS, &user.0, &id)
        .await?;
    Ok(Json(EdgeStatusResponse { exists }))
}

async fn add_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.guard.add(&LIKES, &user.0, &id).await?;
    Ok(StatusCode::CREATED)
}

async fn remove_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .guard
        .remove(&LIKES, &user.0, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EdgeStatusResponse>, ApiError> {
    let exists = state
        .guard
        .exists(&LIKES, &user.0, &id)
        .await?;
    Ok(Json(EdgeStatusResponse { exists }))
}

async fn add_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .guard
        .add(&COLLECTIONS, &user.0, &id)
        .await?;
    Ok(StatusCode::CREATED)
}

async fn remove_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .guard
        .remove(&COLLECTIONS, &user.0, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn collection_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EdgeStatusResponse>, ApiError> {
    let exists = state
        .guard
        .exists(&COLLECTIONS, &user.0, &id)
        .await?;
    Ok(Json(EdgeStatusResponse { exists }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tidepool_auth::{
        AuthError, AuthResult, IdentityVerifier, SessionManager, VerifiedIdentity,
    };
    use tidepool_social::RelationshipGuard;
    use tidepool_store::MemoryStore;
    use tidepool_tokens::{TokenConfig, TokenIssuer};

    struct StubVerifier;

    #[async_trait]
    impl IdentityVerifier for StubVerifier {
        async fn verify(&self, provider_token: &str) -> AuthResult<VerifiedIdentity> {
            if provider_token != "provider-token" {
                return Err(AuthError::InvalidCredentials);
            }
            Ok(VerifiedIdentity {
                email: "grace@example.com".to_string(),
                name: "Grace".to_string(),
                picture: None,
            })
        }
    }

    fn test_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenIssuer::new(&TokenConfig {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 2_592_000,
        }));
        AppState {
            sessions: Arc::new(SessionManager::new(store.clone(), tokens.clone())),
            guard: Arc::new(RelationshipGuard::new(store)),
            tokens,
            verifier: Arc::new(StubVerifier),
        }
    }

    #[tokio::test]
    async fn test_identity_login_gated_by_verifier() {
        let state = test_state();

        let err = identity_login(
            State(state.clone()),
            Json(IdentityLoginRequest {
                provider_token: "forged".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Auth(AuthError::InvalidCredentials)));

        let ok = identity_login(
            State(state),
            Json(IdentityLoginRequest {
                provider_token: "provider-token".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.0.account.email, "grace@example.com");
        assert!(!ok.0.access_token.is_empty());
    }
}
