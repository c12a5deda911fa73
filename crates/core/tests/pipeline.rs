use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use archivist_core::catalog::CatalogBuilder;
use archivist_core::embedding::LexiconEmbedder;
use archivist_core::error::ClassifyError;
use archivist_core::extract::{DocumentKind, FileTextExtractor};
use archivist_core::heuristic::HeuristicClassifier;
use archivist_core::pipeline::ClassificationPipeline;
use backends::mock::{FailingBackend, FailureKind, StaticBackend};
use backends::{ClassificationHints, ModelBackend};
use storage::{
    ArchiveRule, JsonPreferencesStore, PreferencesStore, RootStore, RuleAction, RulePredicate,
    RulesStore, TomlRootStore, TomlRulesStore, UserPreferences,
};
use tempfile::TempDir;

fn lexicon(entries: &[(&str, &[f32])]) -> Arc<LexiconEmbedder> {
    let vectors: HashMap<String, Vec<f32>> = entries
        .iter()
        .map(|(word, v)| (word.to_string(), v.to_vec()))
        .collect();
    Arc::new(LexiconEmbedder::new(vectors))
}

fn invoice_rule() -> ArchiveRule {
    ArchiveRule {
        id: uuid::Uuid::new_v4(),
        name: "Invoices".to_string(),
        priority: 100,
        enabled: true,
        when: RulePredicate {
            contains_tokens: vec!["invoice".to_string()],
            metadata: Default::default(),
            minimum_confidence: None,
        },
        then: RuleAction {
            destination_relative_path: "/Invoices".to_string(),
            filename_template: None,
        },
    }
}

struct Setup {
    temp: TempDir,
    prefs: Arc<JsonPreferencesStore>,
    rules: Arc<TomlRulesStore>,
    roots: Arc<TomlRootStore>,
}

impl Setup {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        Self {
            prefs: Arc::new(JsonPreferencesStore::new(temp.path().join("prefs.json"))),
            rules: Arc::new(TomlRulesStore::new(temp.path().join("rules.toml"))),
            roots: Arc::new(TomlRootStore::new(temp.path().join("roots.toml"))),
            temp,
        }
    }

    fn write_doc(&self, name: &str, text: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn pipeline(
        &self,
        embedder: Arc<LexiconEmbedder>,
        local: Option<Arc<dyn ModelBackend>>,
        remote: Option<Arc<dyn ModelBackend>>,
    ) -> ClassificationPipeline {
        ClassificationPipeline::new(
            Arc::new(FileTextExtractor),
            HeuristicClassifier::new(embedder.clone()),
            CatalogBuilder::new(embedder, 6, &[]).unwrap(),
            self.prefs.clone(),
            self.rules.clone(),
            self.roots.clone(),
            local,
            remote,
        )
    }
}

#[tokio::test]
async fn rule_match_end_to_end() {
    let setup = Setup::new();
    setup.rules.save(&[invoice_rule()]).unwrap();
    let doc = setup.write_doc("doc.txt", "Invoice");

    let pipeline = setup.pipeline(lexicon(&[]), None, None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();

    assert_eq!(result.destination_relative_path, "/Invoices");
    assert_eq!(result.confidence, 0.9);
    assert_eq!(result.rationale, "Rule Invoices matched");
}

#[tokio::test]
async fn rule_confidence_comes_from_the_rule_when_set() {
    let setup = Setup::new();
    let mut rule = invoice_rule();
    rule.when.minimum_confidence = Some(0.75);
    setup.rules.save(&[rule]).unwrap();
    let doc = setup.write_doc("doc.txt", "Invoice");

    let pipeline = setup.pipeline(lexicon(&[]), None, None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();
    assert_eq!(result.confidence, 0.75);
}

#[tokio::test]
async fn heuristic_picks_nearest_folder() {
    let setup = Setup::new();
    let archive = setup.temp.path().join("archive");
    fs::create_dir_all(archive.join("invoice")).unwrap();
    fs::create_dir_all(archive.join("photos")).unwrap();
    setup.roots.put("Archive", archive).unwrap();

    let embedder = lexicon(&[("invoice", &[1.0, 0.0]), ("photos", &[0.0, 1.0])]);
    let doc = setup.write_doc("doc.txt", "invoice from acme");

    let pipeline = setup.pipeline(embedder, None, None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();

    assert_eq!(result.destination_relative_path, "/Archive/invoice");
    assert_eq!(result.rationale, "Embedding similarity heuristic");
    assert!(result.confidence >= 0.65);
    assert!(result.proposed_filename.ends_with(".txt"));
}

#[tokio::test]
async fn instruction_is_appended_to_document_text() {
    let setup = Setup::new();
    setup.rules.save(&[invoice_rule()]).unwrap();
    let doc = setup.write_doc("doc.txt", "an unremarkable note");

    let pipeline = setup.pipeline(lexicon(&[]), None, None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, Some("file this invoice"))
        .await
        .unwrap();
    assert_eq!(result.destination_relative_path, "/Invoices");
}

#[tokio::test]
async fn local_model_accepted_above_threshold() {
    let setup = Setup::new();
    let local: Arc<dyn ModelBackend> = Arc::new(StaticBackend::new(ClassificationHints {
        path: "/Taxes/2024".to_string(),
        filename: String::new(),
        confidence: 0.9,
        reason: "matched prior filings".to_string(),
    }));
    let doc = setup.write_doc("doc.txt", "Invoice 2024-03-01 Acme Tools GmbH USD 129.99");

    let pipeline = setup.pipeline(lexicon(&[]), Some(local), None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();

    assert_eq!(result.destination_relative_path, "/Taxes/2024");
    assert_eq!(result.rationale, "matched prior filings");
    // Empty hint filename falls back to synthesis from extracted fields.
    assert!(result.proposed_filename.contains("Acme"));
    assert!(result.proposed_filename.contains("2024-03-01"));
    assert!(result.proposed_filename.ends_with(".txt"));
}

#[tokio::test]
async fn local_model_filename_hint_wins_when_present() {
    let setup = Setup::new();
    let local: Arc<dyn ModelBackend> = Arc::new(StaticBackend::new(ClassificationHints {
        path: "/Taxes/2024".to_string(),
        filename: "2024_acme_invoice.pdf".to_string(),
        confidence: 0.9,
        reason: "".to_string(),
    }));
    let doc = setup.write_doc("doc.txt", "Invoice");

    let pipeline = setup.pipeline(lexicon(&[]), Some(local), None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();
    assert_eq!(result.proposed_filename, "2024_acme_invoice.pdf");
}

#[tokio::test]
async fn local_model_below_threshold_falls_through() {
    let setup = Setup::new();
    setup.rules.save(&[invoice_rule()]).unwrap();
    let local: Arc<dyn ModelBackend> = Arc::new(StaticBackend::new(ClassificationHints {
        path: "/Wrong".to_string(),
        filename: String::new(),
        confidence: 0.2,
        reason: "unsure".to_string(),
    }));
    let doc = setup.write_doc("doc.txt", "Invoice");

    let pipeline = setup.pipeline(lexicon(&[]), Some(local), None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();
    assert_eq!(result.destination_relative_path, "/Invoices");
}

#[tokio::test]
async fn local_model_failure_is_a_decline_not_fatal() {
    let setup = Setup::new();
    setup.rules.save(&[invoice_rule()]).unwrap();
    let local: Arc<dyn ModelBackend> = Arc::new(FailingBackend(FailureKind::Unavailable));
    let doc = setup.write_doc("doc.txt", "Invoice");

    let pipeline = setup.pipeline(lexicon(&[]), Some(local), None);
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();
    assert_eq!(result.destination_relative_path, "/Invoices");
}

#[tokio::test]
async fn remote_model_is_trusted_unconditionally() {
    let setup = Setup::new();
    setup
        .prefs
        .save(&UserPreferences {
            use_local_model: false,
            use_remote_model: true,
            ..UserPreferences::default()
        })
        .unwrap();
    let remote: Arc<dyn ModelBackend> = Arc::new(StaticBackend::new(ClassificationHints {
        path: "/Misc".to_string(),
        filename: String::new(),
        confidence: 0.1,
        reason: "best effort".to_string(),
    }));
    let doc = setup.write_doc("doc.txt", "unclassifiable scribbles");

    let pipeline = setup.pipeline(lexicon(&[]), None, Some(remote));
    let result = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap();
    assert_eq!(result.destination_relative_path, "/Misc");
    assert_eq!(result.confidence, 0.1);
}

#[tokio::test]
async fn remote_model_failure_is_the_request_failure() {
    let setup = Setup::new();
    setup
        .prefs
        .save(&UserPreferences {
            use_local_model: false,
            use_remote_model: true,
            ..UserPreferences::default()
        })
        .unwrap();
    let remote: Arc<dyn ModelBackend> = Arc::new(FailingBackend(FailureKind::Transport));
    let doc = setup.write_doc("doc.txt", "anything");

    let pipeline = setup.pipeline(lexicon(&[]), None, Some(remote));
    let err = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::BackendTransport(_)));
}

#[tokio::test]
async fn every_tier_declined_is_no_classification() {
    let setup = Setup::new();
    let archive = setup.temp.path().join("archive");
    fs::create_dir_all(archive.join("somewhere")).unwrap();
    setup.roots.put("Archive", archive).unwrap();
    let doc = setup.write_doc("doc.txt", "nothing matches anything");

    // Empty lexicon: every candidate embedding is empty, no rules, no models.
    let pipeline = setup.pipeline(lexicon(&[]), None, None);
    let err = pipeline
        .classify(&doc, DocumentKind::PlainText, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::NoClassificationAvailable));
}

#[tokio::test]
async fn missing_document_is_an_extraction_failure() {
    let setup = Setup::new();
    let pipeline = setup.pipeline(lexicon(&[]), None, None);
    let err = pipeline
        .classify(
            Path::new("/definitely/not/here.txt"),
            DocumentKind::PlainText,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::Extraction(_)));
}
