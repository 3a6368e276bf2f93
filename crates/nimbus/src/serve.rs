// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nimbus serve` command implementation.
//!
//! Wires the conversation store, user store, Gemini provider, and chat
//! orchestrator into the gateway and serves until the process exits.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use nimbus_chat::ChatOrchestrator;
use nimbus_config::NimbusConfig;
use nimbus_config::model::GeminiConfig;
use nimbus_core::NimbusError;
use nimbus_gateway::{AppState, LockoutPolicy, UserStore, start_server};
use nimbus_gemini::GeminiProvider;
use nimbus_gemini::keys::KeyPool;
use nimbus_store::ConversationStore;
use tracing::{info, warn};

/// Runs the `nimbus serve` command.
pub async fn run_serve(config: NimbusConfig) -> Result<(), NimbusError> {
    init_tracing(&config.server.log_level);

    info!("starting nimbus serve");

    // Credentials: inline config keys win, then the configured keys file,
    // then ~/.gemini_chat_keys. An empty pool still serves — chat requests
    // fail with NotConfigured until keys appear.
    let keys = Arc::new(load_key_pool(&config.gemini).await);
    if keys.is_empty() {
        warn!("no Gemini API keys configured; chat requests will fail until keys are provided");
    }
    let provider = Arc::new(GeminiProvider::new(&config.gemini, keys)?);

    let store = Arc::new(ConversationStore::open(&config.storage.conversations_dir).await?);
    tokio::fs::create_dir_all(&config.storage.uploads_dir)
        .await
        .map_err(|e| NimbusError::storage("failed to create uploads directory", e))?;

    let users = Arc::new(UserStore::new(
        &config.auth.users_file,
        LockoutPolicy {
            attempts: config.auth.lockout_attempts,
            minutes: config.auth.lockout_minutes,
        },
    ));
    if users
        .seed_default_admin(
            &config.auth.default_admin_username,
            &config.auth.default_admin_password,
        )
        .await?
    {
        warn!(
            username = %config.auth.default_admin_username,
            "seeded default admin user; change its password"
        );
    }

    let orchestrator = Arc::new(ChatOrchestrator::new(
        store.clone(),
        provider,
        config.gemini.models.clone(),
        config.gemini.default_model.clone(),
    ));

    let state = AppState {
        store,
        orchestrator,
        users,
        sessions: Arc::new(DashMap::new()),
        uploads_dir: PathBuf::from(&config.storage.uploads_dir),
    };

    start_server(&config.server.host, config.server.port, state).await
}

/// Resolves the API key pool from config, a keys file, or the home-dir
/// default location.
async fn load_key_pool(config: &GeminiConfig) -> KeyPool {
    if !config.api_keys.is_empty() {
        return KeyPool::new(config.api_keys.clone());
    }

    let path = config
        .api_keys_file
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".gemini_chat_keys")));

    match path {
        Some(path) => match tokio::fs::read_to_string(&path).await {
            Ok(content) => KeyPool::from_lines(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read API keys file");
                KeyPool::new(Vec::new())
            }
        },
        None => KeyPool::new(Vec::new()),
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
