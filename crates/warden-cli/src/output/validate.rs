// SPDX-License-Identifier: Apache-2.0

use console::style;
use std::io::{self, Write};

use crate::cli::OutputContext;
use crate::commands::types::ValidateResult;

use super::Renderable;

impl Renderable for ValidateResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        if self.ok {
            writeln!(
                w,
                "{} {} ({})",
                style("valid").green().bold(),
                self.file,
                style(&self.schema).dim()
            )?;
            return Ok(());
        }
        writeln!(
            w,
            "{} {} ({}): {} error(s)",
            style("invalid").red().bold(),
            self.file,
            style(&self.schema).dim(),
            self.errors.len()
        )?;
        for error in &self.errors {
            writeln!(w, "  {error}")?;
        }
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let verdict = if self.ok { "valid" } else { "invalid" };
        writeln!(w, "**{}** is {verdict} against `{}`", self.file, self.schema)?;
        for error in &self.errors {
            writeln!(w, "- `{error}`")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    #[test]
    fn test_invalid_lists_errors() {
        let result = ValidateResult {
            file: "out.json".to_string(),
            schema: "agent-output-schema".to_string(),
            ok: false,
            errors: vec!["/schemaVersion: required field 'schemaVersion' missing".to_string()],
        };
        let ctx = OutputContext {
            format: OutputFormat::Text,
            quiet: false,
            verbose: false,
            is_tty: false,
        };
        let mut buf = Vec::new();
        result.render_text(&mut buf, &ctx).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("1 error(s)"));
        assert!(text.contains("/schemaVersion"));
    }
}
