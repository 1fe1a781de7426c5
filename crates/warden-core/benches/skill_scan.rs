// SPDX-License-Identifier: Apache-2.0

//! Benchmark for skill scanning performance.
//!
//! Pattern matching over a 500-line component should stay well under 10ms.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use tokio_util::sync::CancellationToken;
use warden_core::skills::{PatternEngine, SkillContext};
use warden_core::{FileSet, SkillRegistry};

/// A ~500 line React component with no findings.
fn generate_safe_component() -> String {
    let mut code = String::from("import React from 'react';\n\n");
    for i in 0..100 {
        code.push_str(&format!("export function Row{i}({{ item }}) {{\n"));
        code.push_str("  const label = item.label.trim();\n");
        code.push_str("  return <li className=\"row\">{label}</li>;\n");
        code.push_str("}\n\n");
    }
    code
}

/// The same component with a handful of sinks in the middle.
fn generate_vulnerable_component() -> String {
    let safe = generate_safe_component();
    let (head, tail) = safe.split_at(safe.len() / 2);
    let mut code = head.to_string();
    code.push_str("\nexport function Unsafe({ html, token }) {\n");
    code.push_str("  localStorage.setItem('authToken', token);\n");
    code.push_str("  const apiKey = \"sk_live_0123456789abcdef\";\n");
    code.push_str("  eval(html);\n");
    code.push_str("  return <div dangerouslySetInnerHTML={{__html: html}} />;\n");
    code.push_str("}\n");
    code.push_str(tail);
    code
}

fn bench_pattern_scan(c: &mut Criterion) {
    let engine = PatternEngine::global();
    let safe = FileSet::from_sources([("src/Rows.jsx", generate_safe_component())]);
    let vulnerable = FileSet::from_sources([("src/Rows.jsx", generate_vulnerable_component())]);

    c.bench_function("xss_scan_safe_500_lines", |b| {
        b.iter(|| engine.scan(black_box("xssScanner"), black_box(&safe.files()[0])));
    });
    c.bench_function("xss_scan_vulnerable_500_lines", |b| {
        b.iter(|| engine.scan(black_box("xssScanner"), black_box(&vulnerable.files()[0])));
    });
}

fn bench_all_skills(c: &mut Criterion) {
    let registry = SkillRegistry::with_builtin();
    let files = Arc::new(FileSet::from_sources([
        ("src/Rows.jsx", generate_vulnerable_component()),
        ("src/Other.tsx", generate_safe_component()),
    ]));
    let ctx = SkillContext::new(files, CancellationToken::new());

    c.bench_function("all_builtin_skills_two_files", |b| {
        b.iter(|| {
            registry
                .list(None)
                .map(|skill| skill.run(black_box(&ctx)).map_or(0, |f| f.len()))
                .sum::<usize>()
        });
    });
}

criterion_group!(benches, bench_pattern_scan, bench_all_skills);
criterion_main!(benches);
