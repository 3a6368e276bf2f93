// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-cookie authentication for the gateway.
//!
//! `POST /login` verifies credentials against the user store and issues an
//! opaque session token in an HttpOnly cookie; the middleware resolves the
//! cookie to a [`SessionUser`] and rejects everything else with 401.
//! Sessions live in process memory and die with the server.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use dashmap::DashMap;
use nimbus_core::NimbusError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::handlers::ApiError;
use crate::server::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// The authenticated identity attached to a request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub username: String,
    pub is_admin: bool,
}

/// Token -> identity map for live sessions.
pub type SessionMap = Arc<DashMap<String, SessionUser>>;

/// Form body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response body of `POST /login`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
}

/// Response body of `GET /logout`.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /login
pub async fn post_login(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if form.username.is_empty() || form.password.is_empty() {
        return Err(NimbusError::InvalidInput(
            "Please provide both username and password".to_string(),
        )
        .into());
    }

    let verified = state
        .users
        .verify_password(&form.username, &form.password)
        .await?;

    let token = uuid::Uuid::new_v4().to_string();
    state.sessions.insert(
        token.clone(),
        SessionUser {
            username: verified.username.clone(),
            is_admin: verified.is_admin,
        },
    );

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            username: verified.username,
        }),
    ))
}

/// GET /logout
pub async fn get_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Json(LogoutResponse { success: true }))
}

/// Middleware requiring a live session cookie.
///
/// On success the [`SessionUser`] is attached to request extensions for
/// downstream handlers (the admin surface checks `is_admin`).
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.get(cookie.value()).map(|s| s.clone()));

    match session {
        Some(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => {
            debug!("request without valid session rejected");
            Err(NimbusError::Auth("authentication required".to_string()).into())
        }
    }
}
