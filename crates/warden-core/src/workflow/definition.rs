// SPDX-License-Identifier: Apache-2.0

//! Declarative workflow documents.
//!
//! Workflows are parsed once at startup, checked against the skill registry,
//! and never change during a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::WardenError;
use crate::report::ReportFormat;
use crate::skills::SkillRegistry;

const BUILTIN_WORKFLOWS: [(&str, &str); 3] = [
    (
        "builtin/security-audit.yaml",
        include_str!("builtin/security-audit.yaml"),
    ),
    (
        "builtin/xss-audit.yaml",
        include_str!("builtin/xss-audit.yaml"),
    ),
    (
        "builtin/full-audit.yaml",
        include_str!("builtin/full-audit.yaml"),
    ),
];

/// Execution settings of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Per-skill budget; the configured default applies when absent.
    pub timeout_ms: Option<u64>,
    /// Artifact formats written after the run.
    pub report_formats: Vec<ReportFormat>,
    /// Exit non-zero when any critical finding exists.
    pub exit_on_critical: bool,
    /// Run skills concurrently on the bounded worker pool.
    pub parallel: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            report_formats: vec![ReportFormat::Json],
            exit_on_critical: false,
            parallel: false,
        }
    }
}

/// A named, ordered composition of skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Unique workflow name.
    pub name: String,
    /// One-line summary.
    #[serde(default)]
    pub description: String,
    /// Skills in execution order.
    #[serde(alias = "skills")]
    pub skill_names: Vec<String>,
    /// Execution settings.
    #[serde(default)]
    pub config: WorkflowConfig,
}

impl Workflow {
    /// Parses a workflow document; the format follows the file extension
    /// (`.yaml`/`.yml`, `.toml`, `.json`).
    ///
    /// # Errors
    ///
    /// Returns `WardenError::WorkflowLoad` for unsupported extensions and
    /// malformed documents.
    pub fn parse(path: &Path, text: &str) -> Result<Self, WardenError> {
        let load_err = |message: String| WardenError::WorkflowLoad {
            path: path.to_path_buf(),
            message,
        };

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let workflow: Workflow = match ext.as_deref() {
            Some("yaml" | "yml") => {
                serde_saphyr::from_str(text).map_err(|e| load_err(e.to_string()))?
            }
            Some("toml") => toml::from_str(text).map_err(|e| load_err(e.to_string()))?,
            Some("json") => serde_json::from_str(text).map_err(|e| load_err(e.to_string()))?,
            _ => return Err(load_err("unsupported workflow document type".to_string())),
        };

        if workflow.name.trim().is_empty() {
            return Err(load_err("workflow name must not be empty".to_string()));
        }
        if workflow.skill_names.is_empty() {
            return Err(load_err(format!(
                "workflow {} lists no skills",
                workflow.name
            )));
        }
        Ok(workflow)
    }

    /// Loads and parses one workflow file.
    pub fn load(path: &Path) -> Result<Self, WardenError> {
        let text = std::fs::read_to_string(path).map_err(|e| WardenError::WorkflowLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &text)
    }

    /// Checks that every referenced skill is registered.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::UnknownSkill` for the first missing skill.
    pub fn check_skills(&self, registry: &SkillRegistry) -> Result<(), WardenError> {
        match self.skill_names.iter().find(|n| !registry.contains(n)) {
            Some(missing) => Err(WardenError::UnknownSkill {
                name: missing.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// All workflows known to this process, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct WorkflowCatalog {
    workflows: BTreeMap<String, Arc<Workflow>>,
}

impl WorkflowCatalog {
    /// Loads the built-in workflows, then every document in `dir` (if it
    /// exists). A document in `dir` replaces a built-in of the same name;
    /// two documents in `dir` may not share a name.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed document or unknown skill reference.
    pub fn load(dir: Option<&Path>, registry: &SkillRegistry) -> Result<Self, WardenError> {
        let mut catalog = Self::default();

        for (name, text) in BUILTIN_WORKFLOWS {
            catalog.insert(Workflow::parse(Path::new(name), text)?, registry)?;
        }

        if let Some(dir) = dir.filter(|d| d.is_dir()) {
            let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
            for path in workflow_files(dir)? {
                let workflow = Workflow::load(&path)?;
                if let Some(first) = seen.get(&workflow.name) {
                    return Err(WardenError::WorkflowLoad {
                        message: format!(
                            "workflow '{}' is already defined in {}",
                            workflow.name,
                            first.display()
                        ),
                        path,
                    });
                }
                debug!(workflow = %workflow.name, path = %path.display(), "Loaded workflow");
                seen.insert(workflow.name.clone(), path);
                catalog.insert(workflow, registry)?;
            }
        }

        info!(workflows = catalog.workflows.len(), "Workflow catalog ready");
        Ok(catalog)
    }

    /// Adds or replaces a workflow after checking its skills.
    pub fn insert(
        &mut self,
        workflow: Workflow,
        registry: &SkillRegistry,
    ) -> Result<(), WardenError> {
        workflow.check_skills(registry)?;
        self.workflows
            .insert(workflow.name.clone(), Arc::new(workflow));
        Ok(())
    }

    /// Looks up a workflow by name.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::UnknownWorkflow` if absent.
    pub fn get(&self, name: &str) -> Result<Arc<Workflow>, WardenError> {
        self.workflows
            .get(name)
            .cloned()
            .ok_or_else(|| WardenError::UnknownWorkflow {
                name: name.to_string(),
            })
    }

    /// All workflows in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Workflow>> {
        self.workflows.values()
    }
}

fn workflow_files(dir: &Path) -> Result<Vec<PathBuf>, WardenError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e, "yaml" | "yml" | "toml" | "json"))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = WorkflowCatalog::load(None, &SkillRegistry::with_builtin()).unwrap();
        let names: Vec<_> = catalog.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["full-audit", "security-audit", "xss-audit"]);

        let audit = catalog.get("security-audit").unwrap();
        assert!(audit.config.parallel);
        assert!(audit.config.exit_on_critical);
        assert_eq!(
            audit.config.report_formats,
            vec![ReportFormat::Json, ReportFormat::Markdown]
        );
    }

    #[test]
    fn test_parse_formats() {
        let yaml = "name: quick\nskills: [xssScanner]\n";
        let wf = Workflow::parse(Path::new("quick.yml"), yaml).unwrap();
        assert_eq!(wf.skill_names, vec!["xssScanner"]);
        assert_eq!(wf.config, WorkflowConfig::default());

        let toml_doc = "name = \"quick\"\nskillNames = [\"corsChecker\"]\n[config]\ntimeoutMs = 500\nparallel = true\n";
        let wf = Workflow::parse(Path::new("quick.toml"), toml_doc).unwrap();
        assert_eq!(wf.config.timeout_ms, Some(500));
        assert!(wf.config.parallel);

        let json = r#"{"name":"quick","skillNames":["xssScanner"],"config":{"reportFormats":["sarif"]}}"#;
        let wf = Workflow::parse(Path::new("quick.json"), json).unwrap();
        assert_eq!(wf.config.report_formats, vec![ReportFormat::Sarif]);
    }

    #[test]
    fn test_unknown_report_format_is_load_error() {
        let json = r#"{"name":"q","skillNames":["xssScanner"],"config":{"reportFormats":["pdf"]}}"#;
        let err = Workflow::parse(Path::new("q.json"), json).expect_err("bad format");
        assert!(matches!(err, WardenError::WorkflowLoad { .. }));
    }

    #[test]
    fn test_unknown_skill_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("broken.yaml"),
            "name: broken\nskillNames: [xssScanner, doesNotExist]\n",
        )
        .unwrap();

        let err = WorkflowCatalog::load(Some(dir.path()), &SkillRegistry::with_builtin())
            .expect_err("unknown skill");
        assert!(matches!(err, WardenError::UnknownSkill { name } if name == "doesNotExist"));
    }

    #[test]
    fn test_directory_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("xss.json"),
            r#"{"name":"xss-audit","skillNames":["xssScanner"]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog =
            WorkflowCatalog::load(Some(dir.path()), &SkillRegistry::with_builtin()).unwrap();
        assert_eq!(
            catalog.get("xss-audit").unwrap().skill_names,
            vec!["xssScanner"]
        );
        assert!(matches!(
            catalog.get("nope"),
            Err(WardenError::UnknownWorkflow { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_in_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.yaml"),
            "name: api-audit\nskillNames: [corsChecker]\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{"name":"api-audit","skillNames":["injectionScanner"]}"#,
        )
        .unwrap();

        let err = WorkflowCatalog::load(Some(dir.path()), &SkillRegistry::with_builtin())
            .expect_err("duplicate workflow name");
        match err {
            WardenError::WorkflowLoad { path, message } => {
                assert!(path.ends_with("b.json"));
                assert!(message.contains("api-audit"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_skill_list_rejected() {
        let err = Workflow::parse(Path::new("e.yaml"), "name: e\nskillNames: []\n")
            .expect_err("empty");
        assert!(matches!(err, WardenError::WorkflowLoad { .. }));
    }
}
