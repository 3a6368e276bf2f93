// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Nimbus chat server.
//!
//! Session-cookie auth, conversation CRUD, uploads, and the streaming chat
//! endpoint, assembled into one axum router.

pub mod auth;
pub mod chat;
pub mod handlers;
pub mod server;
pub mod users;

pub use auth::{SESSION_COOKIE, SessionMap, SessionUser};
pub use server::{AppState, build_router, start_server};
pub use users::{LockoutPolicy, UserStore};
