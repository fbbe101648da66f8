// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the printer bridge.

use thiserror::Error;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Preferences storage --
    #[error("preferences storage error: {0}")]
    Storage(String),

    #[error("prefs not loaded")]
    ConfigState,

    #[error("printer IP or port not set")]
    ConfigIncomplete,

    #[error("failed to get preferences: {0}")]
    Preferences(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Printer link --
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("failed to write data to {addr}: {reason}")]
    Write { addr: String, reason: String },

    // -- HTTP listener --
    #[error("Invalid request format")]
    RequestFormat,

    #[error("print server error: {0}")]
    Server(String),
}

impl BridgeError {
    /// Wrap an I/O failure with a short description of what was being done.
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
