// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime configuration for the print bridge listener.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application directory name under the per-user config directory.
pub const APP_NAME: &str = "otter-order-printer-bridge";

/// Well-known port the kitchen front end posts print jobs to.
pub const DEFAULT_BRIDGE_PORT: u16 = 3838;

/// Front-end origins granted cross-origin access.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] =
    ["http://localhost:5174", "https://kitchen.otterorder.com"];

/// Listener and printer-link settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Port for the HTTP listener (default 3838).
    pub port: u16,
    /// Interface the listener binds to.
    pub bind_host: String,
    /// Origins that receive CORS headers.
    pub allowed_origins: Vec<String>,
    /// Deadline for the TCP handshake with the printer.
    pub connect_timeout_secs: u64,
    /// Deadline for writing the whole payload to the printer.
    pub write_timeout_secs: u64,
    /// Serialize concurrent submissions that target the same printer address.
    pub serialize_per_printer: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_BRIDGE_PORT,
            bind_host: "0.0.0.0".to_owned(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| (*o).to_owned()).collect(),
            connect_timeout_secs: 10,
            write_timeout_secs: 10,
            serialize_per_printer: true,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by `OTTER_BRIDGE_PORT`, `OTTER_BRIDGE_HOST` and
    /// `OTTER_BRIDGE_ORIGINS` (comma separated).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("OTTER_BRIDGE_PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid OTTER_BRIDGE_PORT"),
            }
        }

        if let Some(host) = lookup("OTTER_BRIDGE_HOST") {
            let host = host.trim();
            if host.is_empty() {
                warn!("ignoring empty OTTER_BRIDGE_HOST");
            } else {
                config.bind_host = host.to_owned();
            }
        }

        if let Some(raw) = lookup("OTTER_BRIDGE_ORIGINS") {
            let origins: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_owned)
                .collect();
            if origins.is_empty() {
                warn!("ignoring empty OTTER_BRIDGE_ORIGINS");
            } else {
                config.allowed_origins = origins;
            }
        }

        config
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// `host:port` the listener binds to.
    pub fn bind_address(&self) -> String {
        crate::types::join_host_port(&self.bind_host, &self.port.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_kitchen_front_end() {
        let config = BridgeConfig::default();
        assert_eq!(config.port, 3838);
        assert_eq!(config.bind_address(), "0.0.0.0:3838");
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5174", "https://kitchen.otterorder.com"]
        );
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.write_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn env_overrides_apply() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            ("OTTER_BRIDGE_PORT", "4000"),
            ("OTTER_BRIDGE_HOST", "127.0.0.1"),
            ("OTTER_BRIDGE_ORIGINS", "https://a.example, https://b.example"),
        ]));
        assert_eq!(config.port, 4000);
        assert_eq!(config.bind_address(), "127.0.0.1:4000");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            ("OTTER_BRIDGE_PORT", "not-a-port"),
            ("OTTER_BRIDGE_ORIGINS", " , "),
        ]));
        assert_eq!(config, BridgeConfig::default());
    }
}
