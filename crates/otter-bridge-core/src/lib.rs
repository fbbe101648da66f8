// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Otter Bridge — Core types, error definitions, runtime configuration, and
// the persisted printer preferences store.

pub mod config;
pub mod error;
pub mod prefs_store;
pub mod types;

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use prefs_store::SettingsStore;
pub use types::*;
