// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP print bridge.
//
// The kitchen display posts `{"data": "<base64>"}` to `POST /` on a fixed
// port; the decoded bytes are written verbatim to the configured printer
// over a fresh raw TCP connection.  Every failure is turned into a JSON
// error response; nothing a single request does can take the listener down.
//
// # CORS
//
// Only the configured front-end origins get `Access-Control-Allow-*`
// headers.  Same-origin and non-browser clients are unaffected.
//
// # Shutdown
//
// `serve` stops accepting when its `CancellationToken` fires and returns
// once in-flight requests have finished.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::net::TcpListener;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use otter_bridge_core::error::{BridgeError, Result};
use otter_bridge_core::{BridgeConfig, Preferences, SettingsStore};

use crate::printer_locks::PrinterLocks;
use crate::raw_client::{self, LinkTimeouts};
use crate::test_page;

/// Largest accepted request body.  Raster logos make receipts bigger than
/// axum's 2 MiB default.  Larger bodies get a JSON 413.
const MAX_SUBMISSION_BYTES: usize = 16 * 1024 * 1024;

/// Preferences store shared between the bridge and the application shell.
pub type SharedStore = Arc<Mutex<SettingsStore>>;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `POST /`.  `data` is base64 in transit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrintSubmission {
    #[serde(default, deserialize_with = "base64_bytes")]
    pub data: Vec<u8>,
}

fn base64_bytes<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(encoded) => STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom),
        None => Ok(Vec::new()),
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

// ---------------------------------------------------------------------------
// PrinterBridge
// ---------------------------------------------------------------------------

/// HTTP-to-raw-TCP print bridge.
///
/// Cheap to clone; clones share the store, config and printer locks.
#[derive(Debug, Clone)]
pub struct PrinterBridge {
    store: SharedStore,
    config: Arc<BridgeConfig>,
    locks: PrinterLocks,
}

impl PrinterBridge {
    pub fn new(store: SharedStore, config: BridgeConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            locks: PrinterLocks::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The axum router: `POST /` behind the CORS allow-list, with request tracing.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(handle_print))
            .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES))
            .layer(build_cors(&self.config.allowed_origins))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    /// Bind the listener on the configured host and port.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_address();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| BridgeError::Server(format!("bind {addr}: {e}")))
    }

    /// Serve on `listener` until `cancel` fires, then drain in-flight requests.
    pub async fn serve(&self, listener: TcpListener, cancel: CancellationToken) -> Result<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| BridgeError::Server(format!("listener address: {e}")))?;
        info!(addr = %addr, "printer bridge listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await
            .map_err(|e| BridgeError::Server(format!("serve {addr}: {e}")))?;

        info!(addr = %addr, "printer bridge shut down");
        Ok(())
    }

    /// Bind and serve.  Returns `Ok` after a graceful shutdown, `Err` only
    /// when the listener cannot be bound or the server fails.
    pub async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, cancel).await
    }

    /// Print the self-test receipt on the configured printer.
    pub async fn print_test_page(&self) -> Result<()> {
        info!("starting print test");

        let prefs = self
            .current_preferences()
            .await
            .map_err(|e| BridgeError::Preferences(e.to_string()))?;
        if !prefs.is_usable() {
            return Err(BridgeError::ConfigIncomplete);
        }

        let addr = prefs.printer_address();
        let timeouts = LinkTimeouts::from(self.config.as_ref());
        let _guard = self.lock_printer(&addr).await;

        info!(addr = %addr, "connecting to printer");
        let stream = raw_client::connect(&addr, timeouts.connect).await?;

        let page = test_page::render_test_page(&prefs, chrono::Local::now().naive_local());
        debug!(addr = %addr, bytes = page.len(), "sending test page");
        raw_client::write_and_close(stream, &addr, &page, timeouts.write).await?;

        info!(addr = %addr, "print test sent");
        Ok(())
    }

    /// Forward one submission to the printer named by `prefs`.
    pub async fn forward(&self, prefs: &Preferences, data: &[u8]) -> Result<()> {
        if !prefs.is_usable() {
            return Err(BridgeError::ConfigIncomplete);
        }
        let addr = prefs.printer_address();
        let _guard = self.lock_printer(&addr).await;
        raw_client::forward_to_printer(
            &prefs.printer_ip,
            &prefs.printer_port,
            data,
            &LinkTimeouts::from(self.config.as_ref()),
        )
        .await
    }

    /// The first read loads the file, so the store is touched off the
    /// async workers.
    async fn current_preferences(&self) -> Result<Preferences> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut store = store
                .lock()
                .map_err(|_| BridgeError::Storage("preferences store lock poisoned".into()))?;
            store.preferences()
        })
        .await
        .map_err(|e| BridgeError::Storage(format!("preferences task failed: {e}")))?
    }

    async fn lock_printer(&self, addr: &str) -> Option<OwnedMutexGuard<()>> {
        if self.config.serialize_per_printer {
            Some(self.locks.acquire(addr).await)
        } else {
            None
        }
    }
}

/// CORS layer granting the allow-listed origins `GET`, `POST`, `OPTIONS`
/// with `Content-Type` and `Authorization`.
fn build_cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /`: decode the submission and forward it to the printer.
async fn handle_print(
    State(bridge): State<PrinterBridge>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(status = %rejection.status(), error = %rejection, "rejecting unreadable request body");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    let submission: PrintSubmission = match serde_json::from_slice(&body) {
        Ok(submission) => submission,
        Err(e) => {
            warn!(error = %e, "rejecting malformed print submission");
            return error_response(StatusCode::BAD_REQUEST, BridgeError::RequestFormat.to_string());
        }
    };
    debug!(bytes = submission.data.len(), "print submission received");

    let prefs = match bridge.current_preferences().await {
        Ok(prefs) => prefs,
        Err(e) => {
            error!(error = %e, "failed to read printer preferences");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to get preferences: {e}"),
            );
        }
    };

    if let Err(e) = bridge.forward(&prefs, &submission.data).await {
        error!(error = %e, "failed to forward print submission");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to send data: {e}"),
        );
    }

    (
        StatusCode::OK,
        Json(StatusBody {
            status: "Data sent successfully",
        }),
    )
        .into_response()
}
