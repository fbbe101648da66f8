// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Supervised bridge listener.
//
// The listener runs as its own task with its own cancellation token.  Its
// lifecycle and any terminal failure are recorded in a status value the
// shell can poll; a failed bind leaves the process running headless.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use otter_bridge_core::{BridgeStatus, ServerStatus};
use otter_bridge_print::PrinterBridge;

pub struct BridgeSupervisor {
    bridge: PrinterBridge,
    cancel: CancellationToken,
    status: Arc<Mutex<BridgeStatus>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BridgeSupervisor {
    pub fn new(bridge: PrinterBridge) -> Self {
        let port = bridge.config().port;
        Self {
            bridge,
            cancel: CancellationToken::new(),
            status: Arc::new(Mutex::new(BridgeStatus::stopped(port))),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the listener task.  A second call while it is alive is a no-op.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            info!("printer bridge already running");
            return;
        }

        set_status(&self.status, ServerStatus::Starting, None, None);

        let bridge = self.bridge.clone();
        let cancel = self.cancel.child_token();
        let status = Arc::clone(&self.status);

        *handle = Some(tokio::spawn(async move {
            let listener = match bridge.bind().await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(error = %e, "printer bridge failed to start");
                    set_status(&status, ServerStatus::Error, None, Some(e.to_string()));
                    return;
                }
            };

            let port = listener.local_addr().ok().map(|a| a.port());
            set_status(&status, ServerStatus::Running, port, None);
            info!(port = ?port, "printer server started");

            match bridge.serve(listener, cancel).await {
                Ok(()) => set_status(&status, ServerStatus::Stopped, None, None),
                Err(e) => {
                    error!(error = %e, "printer bridge terminated");
                    set_status(&status, ServerStatus::Error, None, Some(e.to_string()));
                }
            }
        }));
    }

    pub fn status(&self) -> BridgeStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cancel the listener and wait for in-flight requests to drain.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "printer bridge task panicked");
                set_status(&self.status, ServerStatus::Error, None, Some(e.to_string()));
            }
        }
    }
}

fn set_status(
    status: &Mutex<BridgeStatus>,
    state: ServerStatus,
    port: Option<u16>,
    last_error: Option<String>,
) {
    let mut guard = status.lock().unwrap_or_else(PoisonError::into_inner);
    guard.status = state;
    if let Some(port) = port {
        guard.port = port;
    }
    guard.last_error = last_error;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;
    use tokio::net::TcpListener;

    use otter_bridge_core::{BridgeConfig, SettingsStore};

    use super::*;

    fn loopback_bridge(tmp: &TempDir, port: u16) -> PrinterBridge {
        let store = SettingsStore::in_dir(tmp.path().join("app"));
        let config = BridgeConfig {
            port,
            bind_host: "127.0.0.1".into(),
            ..BridgeConfig::default()
        };
        PrinterBridge::new(Arc::new(Mutex::new(store)), config)
    }

    async fn wait_for(supervisor: &BridgeSupervisor, wanted: ServerStatus) -> BridgeStatus {
        for _ in 0..100 {
            let status = supervisor.status();
            if status.status == wanted {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("status never became {wanted:?}: {:?}", supervisor.status());
    }

    #[tokio::test]
    async fn runs_until_shutdown() {
        let tmp = TempDir::new().unwrap();
        let supervisor = BridgeSupervisor::new(loopback_bridge(&tmp, 0));
        assert_eq!(supervisor.status().status, ServerStatus::Stopped);

        supervisor.start();
        let running = wait_for(&supervisor, ServerStatus::Running).await;
        assert_ne!(running.port, 0);

        // The bound port is really accepting connections.
        tokio::net::TcpStream::connect(("127.0.0.1", running.port))
            .await
            .unwrap();

        supervisor.shutdown().await;
        let stopped = supervisor.status();
        assert_eq!(stopped.status, ServerStatus::Stopped);
        assert!(stopped.last_error.is_none());
    }

    #[tokio::test]
    async fn bind_failure_is_captured_not_propagated() {
        let tmp = TempDir::new().unwrap();
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();
        let supervisor = BridgeSupervisor::new(loopback_bridge(&tmp, port));

        supervisor.start();
        let failed = wait_for(&supervisor, ServerStatus::Error).await;

        let message = failed.last_error.clone().expect("failure recorded");
        assert!(message.contains(&format!("127.0.0.1:{port}")), "{message}");
        assert!(failed.status_message().starts_with("Printer server failed"));

        supervisor.shutdown().await;
        assert_eq!(supervisor.status().status, ServerStatus::Error);
    }
}
