//! Shared application state for the HTTP surface.

use std::sync::Arc;
use tidepool_auth::{IdentityVerifier, SessionManager};
use tidepool_social::RelationshipGuard;
use tidepool_tokens::TokenIssuer;

/// Everything a handler can reach, behind `Arc`s so the router clones
/// cheaply per request.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub guard: Arc<RelationshipGuard>,
    pub tokens: Arc<TokenIssuer>,
    pub verifier: Arc<dyn IdentityVerifier>,
}
