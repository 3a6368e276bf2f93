// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin API key pool.
//!
//! An explicit, injectable rotation object owned by the provider's
//! construction context. Keys are shuffled once at load so restarts do not
//! always hammer the same upstream account first; every external call
//! draws the next key in sequence.

use std::sync::atomic::{AtomicUsize, Ordering};

use nimbus_core::NimbusError;
use rand::seq::SliceRandom;

/// A shuffled, cursor-based pool of upstream API keys.
pub struct KeyPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyPool {
    /// Builds a pool from raw key strings, dropping blanks and shuffling.
    pub fn new(keys: Vec<String>) -> Self {
        let mut keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        keys.shuffle(&mut rand::thread_rng());
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Builds a pool from a keys-file body, one key per line.
    pub fn from_lines(content: &str) -> Self {
        Self::new(content.lines().map(str::to_string).collect())
    }

    /// Draws the next key round-robin.
    ///
    /// Fails fast with [`NimbusError::NotConfigured`] when the pool is
    /// empty, before any upstream call is attempted.
    pub fn next_key(&self) -> Result<&str, NimbusError> {
        if self.keys.is_empty() {
            return Err(NimbusError::NotConfigured);
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Ok(&self.keys[index])
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for KeyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPool")
            .field("keys", &format!("[{} redacted]", self.keys.len()))
            .finish()
    }
}
