// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the printer bridge.

use serde::{Deserialize, Serialize};

/// Default raw TCP printing port (HP JetDirect).
pub const DEFAULT_PRINTER_PORT: &str = "9100";

/// Printer connection preferences, as persisted to `config.json`.
///
/// The port is kept as a string so the on-disk format matches what the
/// front end edits; it is only interpreted when the socket address is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub printer_ip: String,
    pub printer_port: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            printer_ip: String::new(),
            printer_port: DEFAULT_PRINTER_PORT.to_owned(),
        }
    }
}

impl Preferences {
    pub fn new(ip: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            printer_ip: ip.into(),
            printer_port: port.into(),
        }
    }

    /// Both the IP and the port are filled in.
    pub fn is_usable(&self) -> bool {
        !self.printer_ip.is_empty() && !self.printer_port.is_empty()
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn printer_address(&self) -> String {
        join_host_port(&self.printer_ip, &self.printer_port)
    }
}

/// Join a host and port into a dialable address, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Lifecycle of the HTTP print bridge listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}

/// Snapshot of the bridge listener, as reported to the application shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub status: ServerStatus,
    pub port: u16,
    /// Terminal failure captured from the listener task, if any.
    pub last_error: Option<String>,
}

impl BridgeStatus {
    pub fn stopped(port: u16) -> Self {
        Self {
            status: ServerStatus::Stopped,
            port,
            last_error: None,
        }
    }

    /// One-line description for the UI.
    pub fn status_message(&self) -> String {
        match self.status {
            ServerStatus::Running => format!("Printer server is running on port {}", self.port),
            ServerStatus::Starting => format!("Printer server is starting on port {}", self.port),
            ServerStatus::Error => format!(
                "Printer server failed: {}",
                self.last_error.as_deref().unwrap_or("unknown error")
            ),
            ServerStatus::Stopped => "Printer server is not running".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preferences_use_raw_port() {
        let p = Preferences::default();
        assert_eq!(p.printer_ip, "");
        assert_eq!(p.printer_port, "9100");
        assert!(!p.is_usable());
    }

    #[test]
    fn usable_requires_both_fields() {
        assert!(Preferences::new("10.0.0.5", "9100").is_usable());
        assert!(!Preferences::new("10.0.0.5", "").is_usable());
        assert!(!Preferences::new("", "9100").is_usable());
    }

    #[test]
    fn serialises_with_snake_case_keys() {
        let json = serde_json::to_string(&Preferences::new("1.2.3.4", "9100")).unwrap();
        assert_eq!(json, r#"{"printer_ip":"1.2.3.4","printer_port":"9100"}"#);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let p: Preferences = serde_json::from_str(r#"{"printer_ip":"10.1.1.9"}"#).unwrap();
        assert_eq!(p, Preferences::new("10.1.1.9", "9100"));
    }

    #[test]
    fn ipv6_address_is_bracketed() {
        assert_eq!(join_host_port("::1", "9100"), "[::1]:9100");
        assert_eq!(
            Preferences::new("192.168.1.50", "9101").printer_address(),
            "192.168.1.50:9101"
        );
    }

    #[test]
    fn status_messages() {
        let mut status = BridgeStatus::stopped(3838);
        assert_eq!(status.status_message(), "Printer server is not running");
        status.status = ServerStatus::Running;
        assert_eq!(
            status.status_message(),
            "Printer server is running on port 3838"
        );
        status.status = ServerStatus::Error;
        status.last_error = Some("bind 0.0.0.0:3838: address in use".into());
        assert!(status.status_message().contains("address in use"));
    }
}
