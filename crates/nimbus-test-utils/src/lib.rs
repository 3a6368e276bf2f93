// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Nimbus workspace.

pub mod mock_provider;

pub use mock_provider::{MockProvider, ScriptedStream};
