// SPDX-License-Identifier: Apache-2.0

//! Standalone HTML rendering of an envelope.

use std::fmt::Write;

use crate::aggregate::AgentOutput;
use crate::finding::Severity;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:4px 8px}\
.critical{color:#b00020}.high{color:#d35400}.medium{color:#b7950b}\
.low{color:#2471a3}.info{color:#555}code{background:#f4f4f4}";

pub(super) fn render(output: &AgentOutput) -> String {
    let mut html = String::new();
    let title = escape(&format!("Security Report: {}", output.execution.workflow_name));
    let counts = output.severity_counts();

    let _ = writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>"
    );
    let _ = writeln!(html, "<h1>{title}</h1>");
    let _ = writeln!(
        html,
        "<p>{} {} &middot; {} &middot; {} ms</p>",
        escape(&output.agent.name),
        escape(&output.agent.version),
        escape(&output.execution.timestamp),
        output.execution.duration_ms
    );
    if let Some(score) = output.score() {
        let _ = writeln!(html, "<p>Score: <strong>{score}/100</strong></p>");
    }

    html.push_str("<table>\n<tr><th>Severity</th><th>Count</th></tr>\n");
    for severity in Severity::ALL {
        let _ = writeln!(
            html,
            "<tr><td class=\"{severity}\">{severity}</td><td>{}</td></tr>",
            counts.get(severity)
        );
    }
    html.push_str("</table>\n");

    if counts.total > 0 {
        html.push_str("<h2>Findings</h2>\n<table>\n<tr><th>Severity</th><th>Category</th><th>Location</th><th>Description</th><th>Snippet</th></tr>\n");
        for f in output.findings.iter() {
            let _ = writeln!(
                html,
                "<tr><td class=\"{sev}\">{sev}</td><td>{}</td><td>{}:{}</td><td>{}</td><td><code>{}</code></td></tr>",
                escape(&f.category),
                escape(&f.location.path),
                f.location.line,
                escape(&f.description),
                escape(&f.snippet),
                sev = f.severity,
            );
        }
        html.push_str("</table>\n");
    }

    if !output.recommendations.is_empty() {
        html.push_str("<h2>Recommendations</h2>\n<ul>\n");
        for rec in &output.recommendations {
            let _ = writeln!(html, "<li>{}</li>", escape(rec));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
