// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — one context object built at startup and handed to
// everything that needs the store or the bridge, living as long as the
// process.
//
// The preferences store is not `Sync`-safe on its own, so it is wrapped in
// `Arc<Mutex<>>` and shared between the shell and the HTTP handlers.  Lock
// hold times are tiny: after the first load every read is in memory.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use otter_bridge_core::config::APP_NAME;
use otter_bridge_core::error::{BridgeError, Result};
use otter_bridge_core::{BridgeConfig, BridgeStatus, Preferences, SettingsStore};
use otter_bridge_print::{PrinterBridge, SharedStore};
use tracing::{info, warn};

use super::supervisor::BridgeSupervisor;

/// Shared application services.
///
/// Cheaply cloneable (Arc-wrapped).
#[derive(Clone)]
pub struct AppServices {
    store: SharedStore,
    bridge: PrinterBridge,
    supervisor: Arc<BridgeSupervisor>,
    config_path: PathBuf,
}

impl AppServices {
    /// Build the services against the per-user config directory.  No file
    /// I/O happens until preferences are first read.
    pub fn init(config: BridgeConfig) -> Result<Self> {
        Ok(Self::with_store(SettingsStore::new(APP_NAME)?, config))
    }

    pub fn with_store(store: SettingsStore, config: BridgeConfig) -> Self {
        let config_path = store.path().to_path_buf();
        let store: SharedStore = Arc::new(Mutex::new(store));
        let bridge = PrinterBridge::new(Arc::clone(&store), config);
        let supervisor = Arc::new(BridgeSupervisor::new(bridge.clone()));
        Self {
            store,
            bridge,
            supervisor,
            config_path,
        }
    }

    // -- Bridge lifecycle ----------------------------------------------------

    /// Start the HTTP listener in the background.  Failures are captured in
    /// [`server_status`](Self::server_status), not returned.
    pub fn start_bridge(&self) {
        self.supervisor.start();
    }

    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
    }

    pub fn server_status(&self) -> BridgeStatus {
        self.supervisor.status()
    }

    // -- Preferences ---------------------------------------------------------

    pub fn get_preferences(&self) -> Result<Preferences> {
        self.lock_store()?.preferences()
    }

    /// Persist `prefs`, then print a test page to prove the printer is
    /// reachable.  A test page failure is returned even though the new
    /// preferences are already on disk.
    #[allow(dead_code)]
    pub async fn save_preferences(&self, prefs: Preferences) -> Result<()> {
        let services = self.clone();
        tokio::task::spawn_blocking(move || services.lock_store()?.update_preferences(prefs))
            .await
            .map_err(|e| BridgeError::Storage(format!("preferences task failed: {e}")))??;
        info!("preferences saved, printing test page");

        self.bridge.print_test_page().await.inspect_err(|e| {
            warn!(error = %e, "test page after saving preferences failed");
        })
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, SettingsStore>> {
        self.store
            .lock()
            .map_err(|_| BridgeError::Storage("preferences store lock poisoned".into()))
    }
}
