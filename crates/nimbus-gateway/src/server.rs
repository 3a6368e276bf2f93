// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Everything except
//! `POST /login` sits behind the session middleware.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use nimbus_chat::ChatOrchestrator;
use nimbus_core::NimbusError;
use nimbus_store::ConversationStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, SessionMap};
use crate::chat;
use crate::handlers;
use crate::users::UserStore;

/// Uploads are capped at 50 MiB, matching the browser client's limit.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Conversation persistence.
    pub store: Arc<ConversationStore>,
    /// Streaming chat orchestration.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// User accounts and lockout bookkeeping.
    pub users: Arc<UserStore>,
    /// Live session tokens.
    pub sessions: SessionMap,
    /// Directory receiving uploaded attachment bytes.
    pub uploads_dir: PathBuf,
}

/// Builds the full application router over the given state.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(auth::post_login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/logout", get(auth::get_logout))
        .route(
            "/api/conversations",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(handlers::get_conversation)
                .put(handlers::rename_conversation)
                .delete(handlers::delete_conversation),
        )
        .route("/api/chat", post(chat::post_chat))
        .route("/api/upload", post(handlers::upload_file))
        .route("/admin/users", post(handlers::create_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds and serves the gateway until the process exits.
pub async fn start_server(host: &str, port: u16, state: AppState) -> Result<(), NimbusError> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NimbusError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Nimbus server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| NimbusError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
