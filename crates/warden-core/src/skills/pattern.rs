// SPDX-License-Identifier: Apache-2.0

//! Skills backed entirely by regex signatures.

use std::collections::BTreeMap;

use serde_json::Value;

use super::patterns::PatternEngine;
use super::{Skill, SkillContext};
use crate::error::WardenError;
use crate::finding::Finding;

/// A skill that reports every signature it owns in [`PatternEngine`].
#[derive(Debug)]
pub struct PatternSkill {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    engine: &'static PatternEngine,
}

impl PatternSkill {
    /// Creates a skill over the global engine's signatures for `name`.
    #[must_use]
    pub fn new(name: &'static str, description: &'static str, category: &'static str) -> Self {
        Self {
            name,
            description,
            category,
            engine: PatternEngine::global(),
        }
    }
}

impl Skill for PatternSkill {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn category(&self) -> &str {
        self.category
    }

    fn config(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([(
            "signatures".to_string(),
            Value::from(self.engine.pattern_count(self.name)),
        )])
    }

    fn run(&self, ctx: &SkillContext) -> Result<Vec<Finding>, WardenError> {
        let mut findings = Vec::new();
        for file in ctx.files().files() {
            ctx.checkpoint()?;
            findings.extend(self.engine.scan(self.name, file));
        }
        Ok(findings)
    }
}
