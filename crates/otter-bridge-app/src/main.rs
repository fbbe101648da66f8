// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Otter Order printer bridge
//
// Entry point. Initialises logging and backend services, starts the print
// bridge under supervision, and shuts it down gracefully on Ctrl-C.

mod services;

use std::process::ExitCode;

use otter_bridge_core::BridgeConfig;

use services::app_services::AppServices;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Otter bridge starting");

    let config = BridgeConfig::from_env();
    let svc = match AppServices::init(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "backend services failed to initialise");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(path = %svc.config_path().display(), "preferences file");

    // Warm the store so a broken config directory shows up in the log now
    // rather than on the first print job.
    match svc.get_preferences() {
        Ok(prefs) if prefs.is_usable() => {
            tracing::info!(printer = %prefs.printer_address(), "printer configured");
        }
        Ok(_) => tracing::warn!("no printer configured yet"),
        Err(e) => tracing::error!(error = %e, "could not read preferences"),
    }

    svc.start_bridge();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }

    tracing::info!(status = %svc.server_status().status_message(), "shutting down");
    svc.shutdown().await;
    tracing::info!("Otter bridge stopped");
    ExitCode::SUCCESS
}
