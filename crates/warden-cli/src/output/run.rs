// SPDX-License-Identifier: Apache-2.0

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use serde_json::Value;
use std::io::{self, Write};
use warden_core::report::render as render_report;
use warden_core::{ExecutionStatus, Finding, ReportFormat, Severity};

use crate::cli::OutputContext;
use crate::commands::types::RunResult;

use super::Renderable;

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::DarkRed,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Cyan,
        Severity::Info => Color::Grey,
    }
}

fn styled_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Success => style(status).green().to_string(),
        ExecutionStatus::Partial => style(status).yellow().to_string(),
        ExecutionStatus::Failed => style(status).red().to_string(),
    }
}

fn counts_table(result: &RunResult) -> Table {
    let counts = result.envelope.severity_counts();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Severity", "Count"]);
    for severity in Severity::ALL {
        table.add_row(vec![
            Cell::new(severity).fg(severity_color(severity)),
            Cell::new(counts.get(severity)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("total"),
        Cell::new(counts.total).set_alignment(CellAlignment::Right),
    ]);
    table
}

fn findings_table<'a>(findings: impl Iterator<Item = &'a Finding>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Severity", "Category", "Location", "Description"]);
    for finding in findings {
        table.add_row(vec![
            Cell::new(finding.severity).fg(severity_color(finding.severity)),
            Cell::new(&finding.category),
            Cell::new(&finding.location),
            Cell::new(&finding.description),
        ]);
    }
    table
}

fn skill_errors(data: &Value) -> Vec<(String, String)> {
    data.get("skillErrors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    let field = |key| e.get(key).and_then(Value::as_str).unwrap_or_default();
                    (field("skillName").to_string(), field("message").to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

impl Renderable for RunResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        let envelope = &self.envelope;
        writeln!(w)?;
        writeln!(
            w,
            "{} {}  {} {}  {} {}ms",
            style("Workflow:").bold(),
            style(&envelope.execution.workflow_name).cyan(),
            style("status:").dim(),
            styled_status(envelope.execution.status),
            style("duration:").dim(),
            envelope.execution.duration_ms
        )?;
        if let Some(score) = envelope.score() {
            writeln!(w, "{} {}/100", style("Score:").bold(), score)?;
        }
        writeln!(w)?;
        writeln!(w, "{}", counts_table(self))?;

        let shown: Vec<&Finding> = if ctx.verbose {
            envelope.findings.iter().collect()
        } else {
            envelope
                .findings
                .issues
                .iter()
                .chain(&envelope.findings.warnings)
                .collect()
        };
        if !shown.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", findings_table(shown.into_iter()))?;
        }

        let errors = skill_errors(&envelope.results.data);
        if !errors.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", style("Skill errors:").yellow().bold())?;
            for (skill, message) in errors {
                writeln!(w, "  {} {}", style(skill).yellow(), message)?;
            }
        }

        if !envelope.recommendations.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", style("Recommendations:").bold())?;
            for recommendation in &envelope.recommendations {
                writeln!(w, "  - {recommendation}")?;
            }
        }

        if !self.validation_errors.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", style("Envelope validation errors:").red().bold())?;
            for error in &self.validation_errors {
                writeln!(w, "  {error}")?;
            }
        }

        let written = envelope
            .results
            .artifacts
            .iter()
            .filter(|a| !self.report_failures.iter().any(|f| f.path == a.path));
        writeln!(w)?;
        for artifact in written {
            writeln!(
                w,
                "{} {}",
                style(format!("{:<9}", artifact.format.as_str())).dim(),
                style(&artifact.path).cyan()
            )?;
        }
        for failure in &self.report_failures {
            writeln!(w, "{} {failure}", style("failed").red())?;
        }
        if let Some((to, id)) = &self.sent {
            writeln!(w, "{} {to} ({id})", style("Sent envelope to").dim())?;
        }
        writeln!(w)?;
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let markdown = render_report(ReportFormat::Markdown, &self.envelope)
            .map_err(|e| io::Error::other(e.to_string()))?;
        w.write_all(markdown.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use serde_json::json;

    #[test]
    fn test_skill_errors_from_data() {
        let data = json!({
            "skillErrors": [
                {"skillName": "csrfValidator", "kind": "timeout", "message": "timed out"}
            ]
        });
        assert_eq!(
            skill_errors(&data),
            vec![("csrfValidator".to_string(), "timed out".to_string())]
        );
        assert!(skill_errors(&json!({})).is_empty());
    }

    #[test]
    fn test_counts_table_lists_every_severity() {
        let envelope: warden_core::AgentOutput = serde_json::from_value(json!({
            "schemaVersion": "1.0.0",
            "agent": {"name": "security-agent", "version": "0.3.2", "category": "security"},
            "execution": {
                "timestamp": "2026-03-04T05:06:07+00:00",
                "durationMs": 3,
                "status": "success",
                "workflowName": "security-audit"
            },
            "context": {"input": {}, "metadata": {}},
            "results": {"data": {"score": 100}, "artifacts": [], "metrics": {}},
            "findings": {"issues": [], "warnings": [], "info": []},
            "recommendations": [],
            "nextActions": {"suggestedAgents": [], "requiredSkills": []}
        }))
        .unwrap();
        let result = RunResult {
            envelope,
            validation_errors: Vec::new(),
            report_failures: Vec::new(),
            sent: None,
            failed: false,
        };

        let table = counts_table(&result).to_string();
        for severity in Severity::ALL {
            assert!(table.contains(severity.as_str()));
        }

        let ctx = OutputContext {
            format: OutputFormat::Text,
            quiet: true,
            verbose: false,
            is_tty: false,
        };
        let mut buf = Vec::new();
        result.render_text(&mut buf, &ctx).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("security-audit"));
        assert!(text.contains("100/100"));
    }
}
