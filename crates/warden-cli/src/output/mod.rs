// SPDX-License-Identifier: Apache-2.0

//! Presentation of command results.
//!
//! Handlers return serializable data; JSON and YAML come straight from serde,
//! text and Markdown from each type's [`Renderable`] impl.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{OutputContext, OutputFormat};

/// A command result with human-readable views.
pub trait Renderable: Serialize {
    /// Writes the terminal view.
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()>;

    /// Writes the Markdown view; the terminal view unless overridden.
    fn render_markdown(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        self.render_text(w, ctx)
    }
}

/// Renders `result` to stdout in the selected format.
pub fn render<T: Renderable>(result: &T, ctx: &OutputContext) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_to(result, ctx, &mut stdout)?;
    stdout.flush().context("Failed to flush stdout")
}

fn write_to<T: Renderable>(result: &T, ctx: &OutputContext, w: &mut dyn Write) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, result).context("Failed to encode JSON")?;
            writeln!(w)?;
        }
        OutputFormat::Yaml => {
            let yaml = serde_saphyr::to_string(result).context("Failed to encode YAML")?;
            w.write_all(yaml.as_bytes())?;
        }
        OutputFormat::Markdown => result
            .render_markdown(w, ctx)
            .context("Failed to write Markdown")?,
        OutputFormat::Text => result.render_text(w, ctx).context("Failed to write text")?,
    }
    Ok(())
}

mod catalog;
mod messages;
mod run;
mod validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Greeting {
        name: &'static str,
    }

    impl Renderable for Greeting {
        fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
            writeln!(w, "hello {}", self.name)
        }
    }

    fn rendered(format: OutputFormat) -> String {
        let ctx = OutputContext {
            format,
            quiet: true,
            verbose: false,
            is_tty: false,
        };
        let mut buf = Vec::new();
        write_to(&Greeting { name: "warden" }, &ctx, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_formats() {
        assert_eq!(rendered(OutputFormat::Text), "hello warden\n");
        assert_eq!(rendered(OutputFormat::Markdown), "hello warden\n");
        assert!(rendered(OutputFormat::Yaml).contains("name: warden"));

        let json: serde_json::Value =
            serde_json::from_str(&rendered(OutputFormat::Json)).unwrap();
        assert_eq!(json["name"], "warden");
    }
}
