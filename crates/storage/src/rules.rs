use crate::models::ArchiveRule;
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<ArchiveRule>,
}

/// Loads and saves user-authored archive rules.
///
/// Rules mutate only through [`RulesStore::add`], [`RulesStore::update`] and
/// [`RulesStore::delete`]; classification reads a snapshot via
/// [`RulesStore::load`] and never writes.
pub trait RulesStore: Send + Sync {
    fn load(&self) -> Vec<ArchiveRule>;
    fn save(&self, rules: &[ArchiveRule]) -> Result<(), StoreError>;

    fn add(&self, rule: ArchiveRule) -> Result<(), StoreError> {
        let mut rules = self.load();
        rules.push(rule);
        self.save(&rules)
    }

    fn update(&self, rule: ArchiveRule) -> Result<(), StoreError> {
        let mut rules = self.load();
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(slot) => *slot = rule,
            None => rules.push(rule),
        }
        self.save(&rules)
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut rules = self.load();
        rules.retain(|r| r.id != id);
        self.save(&rules)
    }
}

/// Rules as a single TOML file with a `[[rules]]` array.
pub struct TomlRulesStore {
    path: PathBuf,
}

impl TomlRulesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RulesStore for TomlRulesStore {
    fn load(&self) -> Vec<ArchiveRule> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return Vec::new(),
        };
        match toml::from_str::<RuleFile>(&data) {
            Ok(file) => file.rules,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unreadable rules file, treating as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, rules: &[ArchiveRule]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = RuleFile {
            rules: rules.to_vec(),
        };
        let data = toml::to_string_pretty(&file).map_err(|e| StoreError::Encode(e.to_string()))?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RuleAction, RulePredicate};
    use tempfile::tempdir;

    fn sample_rule(name: &str) -> ArchiveRule {
        ArchiveRule {
            id: Uuid::new_v4(),
            name: name.to_string(),
            priority: 10,
            enabled: true,
            when: RulePredicate {
                contains_tokens: vec!["invoice".to_string()],
                metadata: Default::default(),
                minimum_confidence: Some(0.8),
            },
            then: RuleAction {
                destination_relative_path: "/Invoices".to_string(),
                filename_template: None,
            },
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = TomlRulesStore::new(dir.path().join("rules.toml"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn add_update_delete_round_trip() {
        let dir = tempdir().unwrap();
        let store = TomlRulesStore::new(dir.path().join("rules.toml"));

        let mut rule = sample_rule("Invoices");
        store.add(rule.clone()).unwrap();
        assert_eq!(store.load(), vec![rule.clone()]);

        rule.priority = 99;
        store.update(rule.clone()).unwrap();
        assert_eq!(store.load()[0].priority, 99);

        store.delete(rule.id).unwrap();
        assert!(store.load().is_empty());
    }
}
