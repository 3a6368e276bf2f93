// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed user accounts with login lockout bookkeeping.
//!
//! One JSON file maps usernames to password hashes and attempt counters.
//! Password hashing uses argon2 with per-hash random salts. A mutex
//! serializes every read-modify-write of the file; lockout state is
//! persisted so it survives restarts.

use std::collections::HashMap;
use std::path::PathBuf;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use nimbus_core::NimbusError;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Failed-login lockout policy.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Failed attempts before the account locks.
    pub attempts: u32,
    /// Lockout duration in minutes.
    pub minutes: u32,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            minutes: 15,
        }
    }
}

/// One persisted user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub login_attempts: u32,
    #[serde(default)]
    pub last_attempt: f64,
    #[serde(default)]
    pub locked_until: f64,
}

/// Identity of a successfully verified user.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub username: String,
    pub is_admin: bool,
}

/// File-backed user store.
pub struct UserStore {
    path: PathBuf,
    policy: LockoutPolicy,
    lock: Mutex<()>,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>, policy: LockoutPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            lock: Mutex::new(()),
        }
    }

    /// Creates a user. Fails with `InvalidInput` when the name is taken.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<(), NimbusError> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await;
        if users.contains_key(username) {
            return Err(NimbusError::InvalidInput(
                "Username already exists".to_string(),
            ));
        }
        users.insert(
            username.to_string(),
            UserRecord {
                password_hash: hash_password(password)?,
                is_admin,
                login_attempts: 0,
                last_attempt: 0.0,
                locked_until: 0.0,
            },
        );
        self.save(&users).await?;
        info!(username, is_admin, "user created");
        Ok(())
    }

    /// Verifies a login attempt, updating attempt counters and lockout
    /// state. Every failure path returns a user-facing `Auth` message.
    pub async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<VerifiedUser, NimbusError> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await;
        let now = now_unix();

        let Some(user) = users.get_mut(username) else {
            // Burn a hash so unknown and known usernames take comparable
            // time, limiting enumeration.
            let _ = hash_password(password);
            return Err(NimbusError::Auth("Invalid username or password".to_string()));
        };

        if user.locked_until > now {
            let minutes_left = ((user.locked_until - now) / 60.0) as u32 + 1;
            return Err(NimbusError::Auth(format!(
                "Account locked. Try again in {minutes_left} minutes."
            )));
        }

        if check_password(password, &user.password_hash) {
            user.login_attempts = 0;
            user.last_attempt = now;
            let verified = VerifiedUser {
                username: username.to_string(),
                is_admin: user.is_admin,
            };
            self.save(&users).await?;
            info!(username, "login succeeded");
            Ok(verified)
        } else {
            user.login_attempts += 1;
            user.last_attempt = now;

            let message = if user.login_attempts >= self.policy.attempts {
                user.locked_until = now + f64::from(self.policy.minutes) * 60.0;
                warn!(username, "account locked after repeated failures");
                format!(
                    "Account locked for {} minutes due to too many failed attempts.",
                    self.policy.minutes
                )
            } else {
                let remaining = self.policy.attempts - user.login_attempts;
                format!("Invalid username or password. {remaining} attempts remaining.")
            };

            self.save(&users).await?;
            Err(NimbusError::Auth(message))
        }
    }

    /// Seeds the default admin when no users exist yet. Returns whether a
    /// user was created.
    pub async fn seed_default_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, NimbusError> {
        {
            let _guard = self.lock.lock().await;
            if !self.load().await.is_empty() {
                return Ok(false);
            }
        }
        self.create_user(username, password, true).await?;
        info!(username, "default admin seeded");
        Ok(true)
    }

    /// Loads the users file, treating a missing or unparseable file as
    /// empty.
    async fn load(&self) -> HashMap<String, UserRecord> {
        let bytes = tokio::fs::read(&self.path).await.unwrap_or_default();
        if bytes.is_empty() {
            return HashMap::new();
        }
        match serde_json::from_slice(&bytes) {
            Ok(users) => users,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unparseable users file, treating as empty");
                HashMap::new()
            }
        }
    }

    async fn save(&self, users: &HashMap<String, UserRecord>) -> Result<(), NimbusError> {
        let bytes = serde_json::to_vec_pretty(users).map_err(|e| NimbusError::Storage {
            message: format!("failed to serialize users: {e}"),
            source: Some(Box::new(e)),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| NimbusError::storage("failed to write users file", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| NimbusError::storage("failed to replace users file", e))?;
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, NimbusError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| NimbusError::Internal(format!("failed to hash password: {e}")))
}

fn check_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn now_unix() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
