//! Teledesk - chat assistant backend
//!
//! Serves chat sessions whose questions are answered by a pluggable
//! responder: canned keyword answers, a remote `teleData` server, or a local
//! model querying the contacts database.

mod api;
mod chat;
mod config;
mod contacts;
mod format;
mod llm;
mod responder;

use api::{create_router, AppState};
use config::{AppConfig, ResponderKind};
use contacts::{ContactStore, ContactsResponder};
use llm::{LoggingService, OllamaService};
use responder::{LoggingResponder, RemoteResponder, Responder, RuleBasedResponder};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teledesk=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env()?;
    let responder = build_responder(&config)?;
    tracing::info!(
        responder = %responder.name(),
        timeout_secs = config.response_timeout.as_secs(),
        "Responder initialized"
    );

    // Create application state
    let state = AppState::new(
        Arc::new(LoggingResponder::new(responder)),
        config.response_timeout,
    );

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Teledesk server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_responder(config: &AppConfig) -> Result<Arc<dyn Responder>, Box<dyn std::error::Error>> {
    let responder: Arc<dyn Responder> = match &config.responder {
        ResponderKind::Rules => Arc::new(RuleBasedResponder::new(config.delay)),
        ResponderKind::Remote { base_url } => {
            let remote = RemoteResponder::new(base_url, config.response_timeout)?;
            tracing::info!(endpoint = %remote.endpoint(), "Using remote responder");
            Arc::new(remote)
        }
        ResponderKind::Contacts => {
            // Ensure database directory exists
            if let Some(parent) = config.contacts_db.parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %config.contacts_db.display(), "Opening contacts database");
            let store = ContactStore::open(&config.contacts_db)?;
            let contact_count = store.count()?;
            if contact_count == 0 {
                tracing::warn!("Contacts table is empty; every question will find no records");
            }

            let llm = OllamaService::new(&config.ollama_url, config.ollama_model.clone())?;
            tracing::info!(
                url = %config.ollama_url,
                model = %config.ollama_model,
                contacts = contact_count,
                "Using contacts responder"
            );
            Arc::new(ContactsResponder::new(
                Arc::new(LoggingService::new(Arc::new(llm))),
                store,
            ))
        }
    };
    Ok(responder)
}
