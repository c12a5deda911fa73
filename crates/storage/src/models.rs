use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A user-authored filing rule. Matching is conjunctive: every token in
/// `when.contains_tokens` must appear in the document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRule {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    pub when: RulePredicate,
    pub then: RuleAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePredicate {
    #[serde(default)]
    pub contains_tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_confidence: Option<f64>,
    // Kept last: scalar values must precede tables in the TOML rendering.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub destination_relative_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_template: Option<String>,
}

fn enabled_default() -> bool {
    true
}

/// Process-wide classification preferences. Loaded once per request and
/// treated as an immutable snapshot for the duration of that request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub system_message: String,
    pub naming_template: String,
    pub use_local_model: bool,
    pub use_remote_model: bool,
    pub remote_model: String,
    /// Name of the environment variable holding the remote API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_key_ref: Option<String>,
    pub confidence_threshold: f64,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            system_message: String::new(),
            naming_template: "yyyy-MM-dd__Vendor__DocType__Amount".to_string(),
            use_local_model: true,
            use_remote_model: false,
            remote_model: "gpt-4o-mini".to_string(),
            remote_key_ref: None,
            confidence_threshold: 0.65,
        }
    }
}
