// SPDX-License-Identifier: Apache-2.0

//! List skills and workflows commands.

use anyhow::{Context, Result};
use warden_core::{AppConfig, list_skills, list_workflows};

use super::types::{SkillsResult, WorkflowsResult};

/// Registered skills, optionally filtered by category.
pub fn skills(category: Option<&str>) -> SkillsResult {
    SkillsResult {
        skills: list_skills(category),
    }
}

/// Built-in and configured workflows.
pub fn workflows(config: &AppConfig) -> Result<WorkflowsResult> {
    let workflows = list_workflows(config).context("Failed to load workflows")?;
    Ok(WorkflowsResult {
        workflows: workflows.iter().map(|w| (**w).clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_filtered_by_category() {
        let result = skills(Some("xss"));
        assert_eq!(result.skills.len(), 1);
        assert_eq!(result.skills[0].name, "xssScanner");
    }

    #[test]
    fn test_builtin_workflows_listed() {
        let mut config = AppConfig::default();
        config.workflows.dir = None;
        let result = workflows(&config).unwrap();
        let names: Vec<_> = result.workflows.iter().map(|w| w.name.as_str()).collect();
        assert!(names.contains(&"security-audit"));
        assert!(names.contains(&"xss-audit"));
    }
}
