// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-destination write locks.
//
// Two submissions to the same printer would otherwise race on separate
// sockets and may interleave on paper.  Holding the lock for `ip:port` from
// connect to close keeps them in arrival order.  Different printers never
// block each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Registry of one async mutex per printer address.
#[derive(Debug, Clone, Default)]
pub struct PrinterLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl PrinterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other job holds `addr`, then hold it until the guard drops.
    pub async fn acquire(&self, addr: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(addr.to_owned()).or_default())
        };
        debug!(addr = %addr, "waiting for printer lock");
        lock.lock_owned().await
    }

    /// Number of printer addresses seen so far.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_address_is_exclusive() {
        let locks = PrinterLocks::new();
        let held = locks.acquire("10.0.0.5:9100").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("10.0.0.5:9100").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("lock released")
            .unwrap();
    }

    #[tokio::test]
    async fn different_addresses_do_not_block() {
        let locks = PrinterLocks::new();
        let _a = locks.acquire("10.0.0.5:9100").await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire("10.0.0.6:9100")).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
