//! HTTP API server for Gesher
//!
//! Exposes the contact fan-out endpoint and the media preload/readiness
//! endpoints consumed by the site frontend.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use gesher_core::config::GesherConfig;
use gesher_core::media::{
    HttpPrefetchLoader, MediaLoader, MediaReadinessStore, NoopLoader, StaticUrlResolver,
    StorageUrlResolver, UrlResolver,
};
use gesher_core::mode::RuntimeMode;
use gesher_core::notify::{
    ChatRelay, EmailRelay, FormRelayEmail, LoggingEmailRelay, NotificationDispatcher,
    TwilioWhatsApp,
};
use tower_http::cors::CorsLayer;

use crate::handlers::{health, media_readiness, preload_media, submit_contact};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub media: Arc<MediaReadinessStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub server_started_at: std::time::Instant,
}

impl AppState {
    /// Wires collaborators for the given runtime mode.
    ///
    /// Production talks to the real storage backend and relays; development
    /// resolves assets against a static base and logs instead of sending.
    /// The chat relay additionally self-simulates whenever credentials are
    /// absent, regardless of mode.
    pub fn from_config(config: &GesherConfig, mode: RuntimeMode) -> Self {
        let (resolver, loader): (Arc<dyn UrlResolver>, Arc<dyn MediaLoader>) = match mode {
            RuntimeMode::Production => (
                Arc::new(StorageUrlResolver::new(config.media.clone())),
                Arc::new(HttpPrefetchLoader::new(&config.media)),
            ),
            RuntimeMode::Development => (
                Arc::new(StaticUrlResolver::new(config.media.dev_asset_base.clone())),
                Arc::new(NoopLoader),
            ),
        };
        let media = MediaReadinessStore::new(resolver, loader, &config.media);

        let email: Arc<dyn EmailRelay> = match mode {
            RuntimeMode::Production => Arc::new(FormRelayEmail::new(&config.notify)),
            RuntimeMode::Development => Arc::new(LoggingEmailRelay),
        };
        let chat: Arc<dyn ChatRelay> = Arc::new(TwilioWhatsApp::new(config.notify.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(email, chat));

        Self {
            media,
            dispatcher,
            server_started_at: std::time::Instant::now(),
        }
    }
}

/// Builds the API router over the given state.
///
/// Kept separate from [`run_server`] so integration tests can drive the
/// router directly without binding a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/contact", post(submit_contact))
        .route("/api/media/preload/{*key}", post(preload_media))
        .route("/api/media/ready/{*key}", get(media_readiness))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the API server until the process is stopped.
pub async fn run_server(
    config: GesherConfig,
    mode: RuntimeMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_config(&config, mode);
    let app = build_router(state);

    tracing::info!(
        "Gesher API server running on http://{} ({})",
        config.server.bind_address,
        mode
    );
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
