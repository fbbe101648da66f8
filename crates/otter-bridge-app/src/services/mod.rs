// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend service layer — wires the preferences store, print bridge, and
// bridge supervisor together for the application shell.

pub mod app_services;
pub mod supervisor;
