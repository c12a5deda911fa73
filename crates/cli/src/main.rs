use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use archivist_core::catalog::{flatten, CatalogBuilder};
use archivist_core::config::{self, AppConfig};
use archivist_core::embedding::{LexiconEmbedder, TextEmbedder};
use archivist_core::extract::{DocumentKind, FileTextExtractor};
use archivist_core::heuristic::HeuristicClassifier;
use archivist_core::pipeline::ClassificationPipeline;
use backends::lmstudio::{LmStudioBackend, LmStudioConfig};
use backends::openai::{OpenAiBackend, OpenAiConfig};
use backends::ModelBackend;
use cli::mover;
use storage::{
    ArchiveRule, JsonPreferencesStore, PreferencesStore, RootStore, RuleAction, RulePredicate,
    RulesStore, TomlRootStore, TomlRulesStore,
};

#[derive(Parser)]
#[command(name = "archivist", about = "Classifies documents into archive folders")]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a document and print the proposal
    Classify {
        path: PathBuf,
        /// Extra instruction appended to the document text
        #[arg(long)]
        instruction: Option<String>,
        #[arg(long)]
        json: bool,
        /// Move the document to the proposed destination afterwards
        #[arg(long)]
        apply: bool,
    },
    /// Print the flattened destination catalog
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Manage archive rules
    Rules {
        #[command(subcommand)]
        command: RuleCommands,
    },
    /// Manage archive roots
    Roots {
        #[command(subcommand)]
        command: RootCommands,
    },
    /// Show or edit classification preferences
    Prefs {
        #[command(subcommand)]
        command: PrefCommands,
    },
    /// Move a file into a destination folder, auto-renaming on collision
    File {
        source: PathBuf,
        destination: PathBuf,
        name: String,
    },
}

#[derive(Subcommand)]
enum RuleCommands {
    List,
    Add {
        name: String,
        /// Tokens that must all appear in the document text
        #[arg(long, required = true, value_delimiter = ',')]
        tokens: Vec<String>,
        #[arg(long)]
        destination: String,
        #[arg(long, default_value_t = 0)]
        priority: i32,
        #[arg(long)]
        confidence: Option<f64>,
        #[arg(long)]
        template: Option<String>,
    },
    Remove {
        id: uuid::Uuid,
    },
}

#[derive(Subcommand)]
enum RootCommands {
    List,
    Add { key: String, path: PathBuf },
    Remove { key: String },
}

#[derive(Subcommand)]
enum PrefCommands {
    Show,
    Set {
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        use_local: Option<bool>,
        #[arg(long)]
        use_remote: Option<bool>,
        #[arg(long)]
        remote_model: Option<String>,
        /// Environment variable holding the remote API key
        #[arg(long)]
        remote_key_ref: Option<String>,
        #[arg(long)]
        system_message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify {
            path,
            instruction,
            json,
            apply,
        } => run_classify(cfg, path, instruction.as_deref(), json, apply).await,
        Commands::Catalog { json } => run_catalog(cfg, json).await,
        Commands::Rules { command } => run_rules(cfg, command),
        Commands::Roots { command } => run_roots(cfg, command),
        Commands::Prefs { command } => run_prefs(cfg, command),
        Commands::File {
            source,
            destination,
            name,
        } => {
            let target = mover::move_item(&source, &destination, &name).context("move failed")?;
            println!("{}", target.display());
            Ok(())
        }
    }
}

async fn run_classify(
    cfg: AppConfig,
    path: PathBuf,
    instruction: Option<&str>,
    json: bool,
    apply: bool,
) -> Result<()> {
    let prefs_store = Arc::new(JsonPreferencesStore::new(&cfg.stores.preferences_path));
    let roots = Arc::new(TomlRootStore::new(&cfg.stores.roots_path));
    let embedder = build_embedder(&cfg)?;
    let (local, remote) = build_backends(&cfg, prefs_store.as_ref());

    let pipeline = ClassificationPipeline::new(
        Arc::new(FileTextExtractor),
        HeuristicClassifier::new(Arc::clone(&embedder)),
        CatalogBuilder::new(
            Arc::clone(&embedder),
            cfg.catalog.max_depth,
            &cfg.catalog.exclude,
        )?,
        prefs_store,
        Arc::new(TomlRulesStore::new(&cfg.stores.rules_path)),
        Arc::clone(&roots) as Arc<dyn RootStore>,
        local,
        remote,
    );

    let kind = DocumentKind::from_path(&path);
    let result = pipeline.classify(&path, kind, instruction).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("destination: {}", result.destination_relative_path);
        println!("filename:    {}", result.proposed_filename);
        println!("confidence:  {:.2}", result.confidence);
        println!("rationale:   {}", result.rationale);
    }

    if apply {
        let folder = resolve_destination(roots.as_ref(), &result.destination_relative_path)
            .context("destination is not under a registered root")?;
        let target = mover::move_item(&path, &folder, &result.proposed_filename)?;
        println!("moved to:    {}", target.display());
    }
    Ok(())
}

async fn run_catalog(cfg: AppConfig, json: bool) -> Result<()> {
    let embedder = build_embedder(&cfg)?;
    let roots = TomlRootStore::new(&cfg.stores.roots_path);
    let builder = CatalogBuilder::new(embedder, cfg.catalog.max_depth, &cfg.catalog.exclude)?;
    let nodes = flatten(&builder.build(&roots.all()).await);
    for node in &nodes {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "path": node.relative_path,
                    "name": node.display_name,
                    "embedded": !node.embedding.is_empty(),
                })
            );
        } else {
            println!("{}", node.relative_path);
        }
    }
    Ok(())
}

fn run_rules(cfg: AppConfig, command: RuleCommands) -> Result<()> {
    let store = TomlRulesStore::new(&cfg.stores.rules_path);
    match command {
        RuleCommands::List => {
            for rule in store.load() {
                println!(
                    "{}  [{}] {} -> {} (priority {})",
                    rule.id,
                    if rule.enabled { "on " } else { "off" },
                    rule.name,
                    rule.then.destination_relative_path,
                    rule.priority
                );
            }
            Ok(())
        }
        RuleCommands::Add {
            name,
            tokens,
            destination,
            priority,
            confidence,
            template,
        } => {
            let rule = ArchiveRule {
                id: uuid::Uuid::new_v4(),
                name,
                priority,
                enabled: true,
                when: RulePredicate {
                    contains_tokens: tokens,
                    metadata: Default::default(),
                    minimum_confidence: confidence,
                },
                then: RuleAction {
                    destination_relative_path: destination,
                    filename_template: template,
                },
            };
            println!("{}", rule.id);
            store.add(rule)?;
            Ok(())
        }
        RuleCommands::Remove { id } => {
            store.delete(id)?;
            Ok(())
        }
    }
}

fn run_roots(cfg: AppConfig, command: RootCommands) -> Result<()> {
    let store = TomlRootStore::new(&cfg.stores.roots_path);
    match command {
        RootCommands::List => {
            for (key, path) in store.all() {
                println!("{key}  {}", path.display());
            }
            Ok(())
        }
        RootCommands::Add { key, path } => {
            let path = path.canonicalize().context("root path must exist")?;
            store.put(&key, path)?;
            Ok(())
        }
        RootCommands::Remove { key } => {
            store.remove(&key)?;
            Ok(())
        }
    }
}

fn run_prefs(cfg: AppConfig, command: PrefCommands) -> Result<()> {
    let store = JsonPreferencesStore::new(&cfg.stores.preferences_path);
    match command {
        PrefCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&store.load())?);
            Ok(())
        }
        PrefCommands::Set {
            template,
            threshold,
            use_local,
            use_remote,
            remote_model,
            remote_key_ref,
            system_message,
        } => {
            let mut prefs = store.load();
            if let Some(template) = template {
                prefs.naming_template = template;
            }
            if let Some(threshold) = threshold {
                prefs.confidence_threshold = threshold;
            }
            if let Some(use_local) = use_local {
                prefs.use_local_model = use_local;
            }
            if let Some(use_remote) = use_remote {
                prefs.use_remote_model = use_remote;
            }
            if let Some(remote_model) = remote_model {
                prefs.remote_model = remote_model;
            }
            if let Some(remote_key_ref) = remote_key_ref {
                prefs.remote_key_ref = Some(remote_key_ref);
            }
            if let Some(system_message) = system_message {
                prefs.system_message = system_message;
            }
            store.save(&prefs)?;
            Ok(())
        }
    }
}

fn build_embedder(cfg: &AppConfig) -> Result<Arc<dyn TextEmbedder>> {
    match &cfg.embedding.lexicon_path {
        Some(path) => {
            let embedder = LexiconEmbedder::load(Path::new(path))
                .with_context(|| format!("loading embedding lexicon {path}"))?;
            Ok(Arc::new(embedder))
        }
        None => Ok(Arc::new(LexiconEmbedder::new(Default::default()))),
    }
}

/// Backends are resolved once at startup; a tier without configuration
/// simply does not exist for the pipeline.
fn build_backends(
    cfg: &AppConfig,
    prefs_store: &dyn PreferencesStore,
) -> (Option<Arc<dyn ModelBackend>>, Option<Arc<dyn ModelBackend>>) {
    let local = cfg.local_model.base_url.as_ref().map(|base| {
        Arc::new(LmStudioBackend::new(LmStudioConfig {
            base_url: base.clone(),
            model: cfg.local_model.model.clone(),
        })) as Arc<dyn ModelBackend>
    });

    let prefs = prefs_store.load();
    let api_key = prefs
        .remote_key_ref
        .as_ref()
        .and_then(|var| std::env::var(var).ok());
    let remote = Some(Arc::new(OpenAiBackend::new(OpenAiConfig {
        api_key,
        base_url: cfg.remote_model.base_url.clone(),
        model: prefs.remote_model.clone(),
    })) as Arc<dyn ModelBackend>);

    (local, remote)
}

/// Resolves `/RootKey/sub/dir` against the registered roots.
fn resolve_destination(roots: &dyn RootStore, relative: &str) -> Option<PathBuf> {
    let mut parts = relative.trim_start_matches('/').split('/');
    let key = parts.next()?;
    let mut path = roots.root(key)?;
    for part in parts {
        if !part.is_empty() {
            path.push(part);
        }
    }
    Some(path)
}
