// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Otter Bridge Print — HTTP listener that forwards receipt-printer command
// streams to a raw TCP printer, plus the ESC/POS self-test page.  Builds on
// the preferences store and error types from `otter-bridge-core`.

pub mod bridge_server;
pub mod printer_locks;
pub mod raw_client;
pub mod test_page;

pub use bridge_server::{PrintSubmission, PrinterBridge, SharedStore};
pub use printer_locks::PrinterLocks;
pub use raw_client::{LinkTimeouts, forward_to_printer};
