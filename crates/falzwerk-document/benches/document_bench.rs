// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the falzwerk-document crate: page-range parsing and
// merging generated PDFs.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use falzwerk_core::{PageRangeParser, StagedFile, ToolKind, ToolOptions};
use falzwerk_document::{PdfWriter, TransformationEngine};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Parse a long mixed expression against a 500-page document.
fn bench_page_range_parse(c: &mut Criterion) {
    let expression = (0..50)
        .map(|i| format!("{}-{},{}", i * 10 + 1, i * 10 + 5, i * 10 + 8))
        .collect::<Vec<_>>()
        .join(",");

    c.bench_function("page_range_parse (100 parts)", |b| {
        b.iter(|| PageRangeParser::parse(black_box(&expression), black_box(500)))
    });
}

/// Merge three text PDFs of roughly three pages each.
fn bench_merge(c: &mut Criterion) {
    let text = (0..100)
        .map(|i| format!("Line {i} of the benchmark document"))
        .collect::<Vec<_>>()
        .join("\n");
    let pdf = PdfWriter::a4()
        .create_from_text(&text)
        .expect("generate benchmark PDF");
    let files: Vec<StagedFile> = (0..3)
        .map(|i| StagedFile::new(format!("part{i}.pdf"), pdf.clone()))
        .collect();
    let engine = TransformationEngine::new(&Default::default());

    c.bench_function("merge (3 x 3 pages)", |b| {
        b.iter(|| {
            engine
                .execute(ToolKind::Merge, black_box(&files), &ToolOptions::Merge)
                .expect("merge")
        })
    });
}

criterion_group!(benches, bench_page_range_parse, bench_merge);
criterion_main!(benches);
