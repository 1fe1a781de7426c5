// SPDX-License-Identifier: Apache-2.0

//! Skill registry.
//!
//! Populated once at startup from an explicit registration table and treated
//! as read-only afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{Skill, builtin_skills};
use crate::error::WardenError;

/// Skills keyed by name.
#[derive(Debug, Default, Clone)]
pub struct SkillRegistry {
    skills: BTreeMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in skill.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for skill in builtin_skills() {
            let name = skill.name().to_string();
            registry.skills.insert(name, skill);
        }
        registry
    }

    /// Adds a skill.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::DuplicateSkill` if the name is taken.
    pub fn register(&mut self, skill: Arc<dyn Skill>) -> Result<(), WardenError> {
        let name = skill.name().to_string();
        if self.skills.contains_key(&name) {
            return Err(WardenError::DuplicateSkill { name });
        }
        debug!(skill = %name, "Registered skill");
        self.skills.insert(name, skill);
        Ok(())
    }

    /// Looks up a skill by name.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::UnknownSkill` if no skill has that name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Skill>, WardenError> {
        self.skills
            .get(name)
            .cloned()
            .ok_or_else(|| WardenError::UnknownSkill {
                name: name.to_string(),
            })
    }

    /// Returns true if a skill with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    /// Lazily iterates registered skills in name order, optionally filtered by
    /// category. The iterator is `Clone`, so it can be restarted.
    pub fn list<'a>(
        &'a self,
        category: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Arc<dyn Skill>> + Clone + 'a {
        self.skills
            .values()
            .filter(move |skill| category.is_none_or(|c| skill.category() == c))
    }

    /// Number of registered skills.
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Returns true when no skill is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Finding;
    use crate::skills::SkillContext;

    struct Dummy(&'static str, &'static str);

    impl Skill for Dummy {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "dummy"
        }
        fn category(&self) -> &str {
            self.1
        }
        fn run(&self, _ctx: &SkillContext) -> Result<Vec<Finding>, WardenError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = SkillRegistry::new();
        registry.register(Arc::new(Dummy("a", "xss"))).unwrap();

        assert_eq!(registry.get("a").unwrap().name(), "a");
        assert!(matches!(
            registry.get("b"),
            Err(WardenError::UnknownSkill { name }) if name == "b"
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = SkillRegistry::new();
        registry.register(Arc::new(Dummy("a", "xss"))).unwrap();
        let err = registry
            .register(Arc::new(Dummy("a", "cors")))
            .expect_err("duplicate");
        assert!(matches!(err, WardenError::DuplicateSkill { name } if name == "a"));
        assert_eq!(registry.get("a").unwrap().category(), "xss");
    }

    #[test]
    fn test_list_is_filtered_and_restartable() {
        let mut registry = SkillRegistry::new();
        for (name, category) in [("c", "xss"), ("a", "xss"), ("b", "cors")] {
            registry.register(Arc::new(Dummy(name, category))).unwrap();
        }

        let xss = registry.list(Some("xss"));
        let first: Vec<_> = xss.clone().map(|s| s.name().to_string()).collect();
        let second: Vec<_> = xss.map(|s| s.name().to_string()).collect();
        assert_eq!(first, vec!["a", "c"]);
        assert_eq!(first, second);
        assert_eq!(registry.list(None).count(), 3);
    }

    #[test]
    fn test_builtin_registry() {
        let registry = SkillRegistry::with_builtin();
        assert_eq!(registry.len(), 9);
        for name in [
            "xssScanner",
            "secretScanner",
            "storageScanner",
            "corsChecker",
            "mobileScanner",
            "injectionScanner",
            "csrfValidator",
            "cspValidator",
            "reactStandards",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }
}
