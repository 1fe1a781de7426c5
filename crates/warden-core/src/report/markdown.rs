// SPDX-License-Identifier: Apache-2.0

//! Markdown rendering of an envelope.

use std::fmt::Write;

use crate::aggregate::AgentOutput;
use crate::finding::{Finding, Severity};

pub(super) fn render(output: &AgentOutput) -> String {
    let mut md = String::new();
    let counts = output.severity_counts();

    let _ = writeln!(md, "# Security Report: {}\n", output.execution.workflow_name);
    let _ = writeln!(
        md,
        "- **Agent:** {} {}",
        output.agent.name, output.agent.version
    );
    let _ = writeln!(md, "- **Started:** {}", output.execution.timestamp);
    let _ = writeln!(md, "- **Duration:** {} ms", output.execution.duration_ms);
    let _ = writeln!(md, "- **Status:** {}", output.execution.status);
    if let Some(score) = output.score() {
        let _ = writeln!(md, "- **Score:** {score}/100");
    }

    md.push_str("\n## Summary\n\n| Severity | Count |\n|---|---|\n");
    for severity in Severity::ALL {
        let _ = writeln!(md, "| {severity} | {} |", counts.get(severity));
    }
    let _ = writeln!(md, "| **total** | **{}** |", counts.total);

    section(&mut md, "Issues", &output.findings.issues);
    section(&mut md, "Warnings", &output.findings.warnings);
    section(&mut md, "Info", &output.findings.info);

    if !output.recommendations.is_empty() {
        md.push_str("\n## Recommendations\n\n");
        for rec in &output.recommendations {
            let _ = writeln!(md, "- {rec}");
        }
    }
    md
}

fn section(md: &mut String, title: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    let _ = writeln!(md, "\n## {title}\n");
    for f in findings {
        let _ = write!(
            md,
            "- **[{}] {}** `{}`",
            f.severity, f.category, f.location
        );
        if let Some(id) = &f.standard_identifier {
            let _ = write!(md, " ({id})");
        }
        let _ = writeln!(md, "\n  {}", f.description);
        if !f.snippet.is_empty() {
            let _ = writeln!(md, "  > `{}`", f.snippet.replace('`', "'"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_output;

    #[test]
    fn test_markdown_sections() {
        let md = render(&sample_output());
        assert!(md.starts_with("# Security Report: security-audit"));
        assert!(md.contains("| critical | 1 |"));
        assert!(md.contains("## Issues"));
        assert!(!md.contains("## Warnings"));
        assert!(md.contains("`src/App.jsx:10` (CWE-79)"));
        assert!(md.contains("- **Score:** 90/100"));
        assert!(md.contains("- **Status:** success"));
    }
}
