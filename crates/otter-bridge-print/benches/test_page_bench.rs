// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for ESC/POS test page rendering and the base64
// submission decode path in the otter-bridge-print crate.

use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use otter_bridge_core::Preferences;
use otter_bridge_print::PrintSubmission;
use otter_bridge_print::test_page::{Align, EscPosBuilder, render_test_page};

fn bench_render_test_page(c: &mut Criterion) {
    let prefs = Preferences::new("192.168.1.120", "9100");
    let stamp = NaiveDate::from_ymd_opt(2026, 1, 2)
        .and_then(|d| d.and_hms_opt(3, 4, 5))
        .expect("valid timestamp");

    c.bench_function("render_test_page", |b| {
        b.iter(|| render_test_page(black_box(&prefs), black_box(stamp)))
    });
}

fn bench_builder_long_receipt(c: &mut Criterion) {
    c.bench_function("escpos_builder_200_lines", |b| {
        b.iter(|| {
            let mut builder = EscPosBuilder::new();
            builder.initialize().align(Align::Left);
            for i in 0..200 {
                builder.line(black_box(&format!("1x Item {i:<24} 9.99")));
            }
            builder.cut().build()
        })
    });
}

fn bench_decode_submission(c: &mut Criterion) {
    // ~36 KiB receipt, roughly a raster logo plus text.
    let payload = "G0AbYQEdVgEK".repeat(4096);
    let body = format!("{{\"data\": \"{payload}\"}}");

    c.bench_function("decode_submission_36k", |b| {
        b.iter(|| {
            let submission: PrintSubmission =
                serde_json::from_str(black_box(&body)).expect("valid submission");
            submission.data.len()
        })
    });
}

criterion_group!(
    benches,
    bench_render_test_page,
    bench_builder_long_receipt,
    bench_decode_submission
);
criterion_main!(benches);
