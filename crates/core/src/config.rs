use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stores: StoreConfig,
    pub catalog: CatalogConfig,
    pub embedding: EmbeddingConfig,
    pub local_model: LocalModelConfig,
    pub remote_model: RemoteModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub preferences_path: String,
    pub rules_path: String,
    pub roots_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            preferences_path: "archivist/preferences.json".to_string(),
            rules_path: "archivist/rules.toml".to_string(),
            roots_path: "archivist/roots.toml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub max_depth: usize,
    pub exclude: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// JSON word-vector lexicon; without one every embedding is empty and
    /// classification leans on rules and model backends.
    pub lexicon_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    /// Base URL of an OpenAI-compatible local server; unset disables the tier.
    pub base_url: Option<String>,
    pub model: String,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "local-filing".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteModelConfig {
    pub base_url: String,
}

impl Default for RemoteModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
