// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw TCP print client (JetDirect, port 9100).
//
// Open a socket, dump the bytes, close it.  Nothing is read back from the
// printer.  One connection per submission; no pooling.  Both the handshake
// and the write are bounded by deadlines.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use otter_bridge_core::BridgeConfig;
use otter_bridge_core::error::{BridgeError, Result};
use otter_bridge_core::types::join_host_port;

/// Write granularity, for progress logging only.
const CHUNK_SIZE: usize = 8192;

/// Deadlines applied to one printer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTimeouts {
    pub connect: Duration,
    pub write: Duration,
}

impl Default for LinkTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            write: Duration::from_secs(10),
        }
    }
}

impl From<&BridgeConfig> for LinkTimeouts {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            write: config.write_timeout(),
        }
    }
}

/// Send `data` to `ip:port` over a fresh TCP connection.
pub async fn forward_to_printer(
    ip: &str,
    port: &str,
    data: &[u8],
    timeouts: &LinkTimeouts,
) -> Result<()> {
    let addr = join_host_port(ip, port);
    let stream = connect(&addr, timeouts.connect).await?;
    write_and_close(stream, &addr, data, timeouts.write).await
}

/// Dial the printer, failing with [`BridgeError::Connect`] on refusal or
/// when the handshake outlives `timeout`.
pub async fn connect(addr: &str, timeout: Duration) -> Result<TcpStream> {
    debug!(addr = %addr, "connecting via raw TCP");

    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| BridgeError::Connect {
            addr: addr.to_owned(),
            reason: format!("timed out after {}s", timeout.as_secs()),
        })?
        .map_err(|e| BridgeError::Connect {
            addr: addr.to_owned(),
            reason: e.to_string(),
        })?;

    debug!(addr = %addr, "raw TCP connection established");
    Ok(stream)
}

/// Write the whole payload within `timeout`, then close the connection.
pub async fn write_and_close(
    mut stream: TcpStream,
    addr: &str,
    data: &[u8],
    timeout: Duration,
) -> Result<()> {
    let write_all = async {
        let mut sent = 0usize;
        for chunk in data.chunks(CHUNK_SIZE) {
            stream.write_all(chunk).await?;
            sent += chunk.len();
            debug!(sent, total = data.len(), "raw TCP progress");
        }
        stream.flush().await?;
        Ok::<_, std::io::Error>(())
    };

    tokio::time::timeout(timeout, write_all)
        .await
        .map_err(|_| BridgeError::Write {
            addr: addr.to_owned(),
            reason: format!("write deadline of {}s exceeded", timeout.as_secs()),
        })?
        .map_err(|e| BridgeError::Write {
            addr: addr.to_owned(),
            reason: e.to_string(),
        })?;

    // The payload is already on the wire; a failed FIN is not worth reporting.
    if let Err(e) = stream.shutdown().await {
        debug!(addr = %addr, error = %e, "raw TCP shutdown failed");
    }

    info!(addr = %addr, bytes = data.len(), "raw TCP payload sent");
    Ok(())
}
