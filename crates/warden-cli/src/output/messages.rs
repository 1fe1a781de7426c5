// SPDX-License-Identifier: Apache-2.0

use console::style;
use std::io::{self, Write};

use crate::cli::OutputContext;
use crate::commands::types::{MessagesResult, SentResult};

use super::Renderable;

impl Renderable for SentResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        match &self.to_agent {
            Some(to) => writeln!(
                w,
                "{} {} {}",
                style("Sent to").green(),
                style(to).cyan(),
                style(&self.message_id).dim()
            ),
            None => writeln!(
                w,
                "{} {}",
                style("Replied").green(),
                style(&self.message_id).dim()
            ),
        }
    }
}

impl Renderable for MessagesResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        if self.messages.is_empty() {
            writeln!(w, "{}", style("No messages").dim())?;
            return Ok(());
        }
        for message in &self.messages {
            writeln!(
                w,
                "{} {} {} {}",
                style(message.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
                style(format!("{:<12}", message.message_type.as_str())).yellow(),
                style(&message.from_agent).cyan(),
                style(message.message_id).dim()
            )?;
            if let Some(correlation) = &message.correlation_id {
                writeln!(w, "  {} {correlation}", style("in reply to").dim())?;
            }
            if ctx.verbose {
                let payload = serde_json::to_string_pretty(&message.payload)
                    .map_err(io::Error::other)?;
                for line in payload.lines() {
                    writeln!(w, "  {line}")?;
                }
            }
        }
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w, "## Messages\n")?;
        for message in &self.messages {
            writeln!(
                w,
                "- `{}` **{}** from `{}` at {}",
                message.message_id,
                message.message_type,
                message.from_agent,
                message.timestamp.to_rfc3339()
            )?;
        }
        Ok(())
    }
}
