//! Storage layer: file-backed stores for user-owned state.
//!
//! Preferences, archive rules and archive roots are persisted outside the
//! classification core. Every store yields a zero-value default when its
//! backing file is absent or corrupt, so a fresh install needs no setup.

use thiserror::Error;

pub mod models;
pub mod prefs;
pub mod roots;
pub mod rules;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode store file: {0}")]
    Encode(String),
}

pub use models::{ArchiveRule, RuleAction, RulePredicate, UserPreferences};
pub use prefs::{JsonPreferencesStore, PreferencesStore};
pub use roots::{RootStore, TomlRootStore};
pub use rules::{RulesStore, TomlRulesStore};
