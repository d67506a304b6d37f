//! Tidepool backend server: authentication, sessions, and relationship edges.

mod error;
mod extract;
mod routes;
mod state;
mod verify;

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tidepool_auth::{IdentityVerifier, SessionManager};
use tidepool_config::{init_logging, Config};
use tidepool_social::RelationshipGuard;
use tidepool_store::PostgrestStore;
use tidepool_tokens::{TokenConfig, TokenIssuer};
use tracing::{info, warn};

use crate::state::AppState;
use crate::verify::{DisabledVerifier, HttpIdentityVerifier};

/// Tidepool backend command-line interface.
#[derive(Parser)]
#[command(name = "tidepool-server")]
#[command(about = "Tidepool backend for authentication and relationship edges")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file. Environment variables override it.
    #[arg(short, long, env = "TIDEPOOL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Defaults to the
    /// configured level.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::new(),
    };

    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    if config.store_service_key.is_empty() {
        bail!("store service key is not configured (TIDEPOOL_STORE_SERVICE_KEY)");
    }
    if config.access_token_secret.is_empty() || config.refresh_token_secret.is_empty() {
        bail!("token secrets are not configured (TIDEPOOL_ACCESS_TOKEN_SECRET, TIDEPOOL_REFRESH_TOKEN_SECRET)");
    }
    if config.access_token_secret == config.refresh_token_secret {
        bail!("access and refresh token secrets must differ");
    }
    let store_url = config.store_url().context("store URL is not valid")?;

    let store = Arc::new(PostgrestStore::new(
        store_url.as_str().trim_end_matches('/'),
        config.store_service_key.clone(),
    ));
    let tokens = Arc::new(TokenIssuer::new(&TokenConfig {
        access_secret: config.access_token_secret.clone(),
        refresh_secret: config.refresh_token_secret.clone(),
        access_ttl_secs: config.access_ttl_secs,
        refresh_ttl_secs: config.refresh_ttl_secs,
    }));

    let verifier: Arc<dyn IdentityVerifier> = if config.identity_verifier_url.is_empty() {
        warn!("No identity verifier endpoint configured; identity login is disabled");
        Arc::new(DisabledVerifier)
    } else {
        Arc::new(HttpIdentityVerifier::new(
            config.identity_verifier_url.clone(),
        ))
    };

    let state = AppState {
        sessions: Arc::new(SessionManager::new(store.clone(), tokens.clone())),
        guard: Arc::new(RelationshipGuard::new(store.clone())),
        tokens,
        verifier,
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
