// SPDX-License-Identifier: Apache-2.0

use console::style;
use std::io::{self, Write};

use crate::cli::OutputContext;
use crate::commands::types::{SkillsResult, WorkflowsResult};

use super::Renderable;

impl Renderable for SkillsResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        writeln!(w)?;
        writeln!(w, "{}", style("Registered skills:").bold())?;
        writeln!(w)?;

        if self.skills.is_empty() {
            writeln!(w, "  {}", style("No skills found").dim())?;
        }
        for skill in &self.skills {
            writeln!(
                w,
                "  {} {} {}",
                style(format!("{:<18}", skill.name)).cyan(),
                style(format!("{:<22}", skill.category)).yellow(),
                style(&skill.description).dim()
            )?;
            if ctx.verbose && !skill.required_capabilities.is_empty() {
                writeln!(
                    w,
                    "  {:<18} {} {}",
                    "",
                    style("needs:").dim(),
                    skill.required_capabilities.join(", ")
                )?;
            }
        }

        writeln!(w)?;
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w, "## Skills\n")?;
        writeln!(w, "| Name | Category | Description |")?;
        writeln!(w, "|---|---|---|")?;
        for skill in &self.skills {
            writeln!(
                w,
                "| {} | {} | {} |",
                skill.name, skill.category, skill.description
            )?;
        }
        Ok(())
    }
}

impl Renderable for WorkflowsResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w)?;
        writeln!(w, "{}", style("Available workflows:").bold())?;
        writeln!(w)?;

        for workflow in &self.workflows {
            let mode = if workflow.config.parallel {
                "parallel"
            } else {
                "sequential"
            };
            writeln!(
                w,
                "  {} {} {}",
                style(format!("{:<16}", workflow.name)).cyan(),
                style(format!("{mode:<11}")).yellow(),
                style(&workflow.description).dim()
            )?;
            writeln!(
                w,
                "  {:<16} {}",
                "",
                style(workflow.skill_names.join(" -> ")).dim()
            )?;
        }

        writeln!(w)?;
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w, "## Workflows\n")?;
        for workflow in &self.workflows {
            writeln!(
                w,
                "- **{}** - {} (`{}`)",
                workflow.name,
                workflow.description,
                workflow.skill_names.join("`, `")
            )?;
        }
        Ok(())
    }
}
