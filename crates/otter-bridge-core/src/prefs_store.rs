// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persisted printer preferences.
//
// The store owns `<user-config-dir>/<app-name>/config.json`.  Nothing is read
// from disk until the first access; every mutation is written through before
// the call returns.  Writes go to a uniquely named temp file in the same
// directory which is then renamed over the canonical path, so a reader never
// sees a half-written file.  A corrupt file is replaced with defaults rather
// than reported.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, instrument, warn};

use crate::error::{BridgeError, Result};
use crate::types::Preferences;

/// File name of the preferences document inside the app directory.
pub const CONFIG_FILE: &str = "config.json";

/// Distinguishes temp files created within the same clock tick.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Lazily loaded, write-through store for [`Preferences`].
///
/// Not internally synchronised: callers that share a store wrap it in a
/// mutex.  Separate stores pointed at the same file are last-writer-wins.
#[derive(Debug)]
pub struct SettingsStore {
    dir: PathBuf,
    path: PathBuf,
    prefs: Preferences,
    loaded: bool,
}

impl SettingsStore {
    /// Store rooted at `<user-config-dir>/<app_name>/config.json`.
    ///
    /// Performs no I/O beyond resolving the platform config directory.
    pub fn new(app_name: &str) -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            BridgeError::Storage("get user config dir: no config directory for this user".into())
        })?;
        Ok(Self::in_dir(base.join(app_name)))
    }

    /// Store whose `config.json` lives directly in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(CONFIG_FILE);
        Self {
            dir,
            path,
            prefs: Preferences::default(),
            loaded: false,
        }
    }

    /// Canonical path of the preferences file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Read preferences from disk, creating the directory and a default file
    /// when none exists yet.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&mut self) -> Result<()> {
        create_private_dir(&self.dir)
            .map_err(|e| BridgeError::storage("ensure config dir", e))?;

        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(BridgeError::storage("read prefs", e)),
        };

        if data.is_empty() {
            info!("no stored preferences, writing defaults");
            self.prefs = Preferences::default();
            self.loaded = true;
            return self.save();
        }

        match serde_json::from_slice::<Preferences>(&data) {
            Ok(prefs) => {
                debug!(printer_ip = %prefs.printer_ip, printer_port = %prefs.printer_port, "preferences loaded");
                self.prefs = prefs;
                self.loaded = true;
                Ok(())
            }
            Err(e) => self.restore_defaults_on_corruption(&e),
        }
    }

    /// Recovery path for an unparsable preferences file: fall back to the
    /// defaults and write them back so the file heals.  The parse error is
    /// logged, never returned.
    ///
    /// The write happens here rather than on the next explicit save, so a
    /// corrupt file is replaced by valid default JSON as soon as it is read.
    /// Only a failure of that write is returned.
    pub fn restore_defaults_on_corruption(&mut self, cause: &dyn std::fmt::Display) -> Result<()> {
        warn!(path = %self.path.display(), error = %cause, "preferences file is corrupt, restoring defaults");
        self.prefs = Preferences::default();
        self.loaded = true;
        self.save()
    }

    /// Current preferences, loading from disk on first use.
    pub fn preferences(&mut self) -> Result<Preferences> {
        self.ensure_loaded()?;
        Ok(self.prefs.clone())
    }

    /// Replace the preferences and persist them.  Returning `Ok` means the
    /// new values are on disk.
    pub fn update_preferences(&mut self, prefs: Preferences) -> Result<()> {
        self.ensure_loaded()?;
        self.prefs = prefs;
        self.save()
    }

    /// Write the in-memory preferences with write-then-rename.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn save(&self) -> Result<()> {
        if !self.loaded {
            return Err(BridgeError::ConfigState);
        }

        let json = serde_json::to_string_pretty(&self.prefs)?;
        let tmp = self.temp_path();

        write_private_file(&tmp, json.as_bytes())
            .map_err(|e| BridgeError::storage("write temp prefs", e))?;

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(BridgeError::storage("rename prefs", e));
        }

        debug!("preferences saved");
        Ok(())
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.load()
    }

    /// `config.json.tmp-<nanos>-<seq>` next to the canonical file.
    fn temp_path(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{CONFIG_FILE}.tmp-{nanos}-{seq}"))
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Create `path` readable and writable by the owner only, and flush it to disk.
fn write_private_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
