//! Top-level classification policy.
//!
//! One request runs extract -> local model -> heuristic -> remote model in
//! fixed order, short-circuiting on the first tier that clears the
//! confidence threshold. Preferences, rules and the folder catalog are
//! loaded once per request and treated as immutable snapshots; backends
//! are resolved once at construction.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use backends::{ClassificationHints, ClassifyRequest, ModelBackend};
use storage::{PreferencesStore, RootStore, RulesStore, UserPreferences};

use crate::catalog::{flatten, CatalogBuilder, DirectoryNode};
use crate::error::ClassifyError;
use crate::extract::{DocumentKind, TextExtractor};
use crate::filename;
use crate::heuristic::HeuristicClassifier;
use crate::models::ClassificationResult;
use crate::signals::{DocumentSignals, SignalExtractor};

/// Longest document prefix forwarded to the local model.
const LOCAL_SNIPPET_CHARS: usize = 4000;
/// Longest document prefix forwarded to the remote model.
const REMOTE_SNIPPET_CHARS: usize = 1200;

pub struct ClassificationPipeline {
    extractor: Arc<dyn TextExtractor>,
    signal_extractor: SignalExtractor,
    heuristic: HeuristicClassifier,
    catalog: CatalogBuilder,
    preferences: Arc<dyn PreferencesStore>,
    rules: Arc<dyn RulesStore>,
    roots: Arc<dyn RootStore>,
    local_model: Option<Arc<dyn ModelBackend>>,
    remote_model: Option<Arc<dyn ModelBackend>>,
}

impl ClassificationPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        heuristic: HeuristicClassifier,
        catalog: CatalogBuilder,
        preferences: Arc<dyn PreferencesStore>,
        rules: Arc<dyn RulesStore>,
        roots: Arc<dyn RootStore>,
        local_model: Option<Arc<dyn ModelBackend>>,
        remote_model: Option<Arc<dyn ModelBackend>>,
    ) -> Self {
        Self {
            extractor,
            signal_extractor: SignalExtractor::new(),
            heuristic,
            catalog,
            preferences,
            rules,
            roots,
            local_model,
            remote_model,
        }
    }

    pub async fn classify(
        &self,
        path: &Path,
        kind: DocumentKind,
        instruction: Option<&str>,
    ) -> Result<ClassificationResult, ClassifyError> {
        let text = self.extractor.extract(path, kind).await?;
        let document_text = match instruction {
            Some(instruction) => format!("{text}\n{instruction}"),
            None => text,
        };
        let signals = self.signal_extractor.analyze(&document_text);

        // Immutable snapshots for the rest of this request.
        let preferences = self.preferences.load();
        let rules = self.rules.load();
        let candidates = flatten(&self.catalog.build(&self.roots.all()).await);
        debug!(
            candidates = candidates.len(),
            rules = rules.len(),
            language = %signals.language,
            "catalog refreshed"
        );

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        if preferences.use_local_model {
            if let Some(backend) = &self.local_model {
                let snippet: String = document_text.chars().take(LOCAL_SNIPPET_CHARS).collect();
                match self
                    .attempt_model(
                        backend.as_ref(),
                        snippet,
                        &signals,
                        &candidates,
                        &preferences,
                        extension,
                    )
                    .await
                {
                    Ok(result) if result.confidence >= preferences.confidence_threshold => {
                        info!(
                            destination = %result.destination_relative_path,
                            confidence = result.confidence,
                            "local model classification accepted"
                        );
                        return Ok(result);
                    }
                    Ok(result) => {
                        let decline = ClassifyError::ConfidenceBelowThreshold {
                            confidence: result.confidence,
                            threshold: preferences.confidence_threshold,
                        };
                        debug!(%decline, "local model tier declined");
                    }
                    Err(err) => warn!(%err, "local model tier declined"),
                }
            }
        }

        if let Some(result) = self.heuristic.classify(
            &document_text,
            &signals,
            &candidates,
            &rules,
            &preferences.naming_template,
            extension,
        ) {
            if result.confidence >= preferences.confidence_threshold {
                info!(
                    destination = %result.destination_relative_path,
                    confidence = result.confidence,
                    "heuristic classification accepted"
                );
                return Ok(result);
            }
            let decline = ClassifyError::ConfidenceBelowThreshold {
                confidence: result.confidence,
                threshold: preferences.confidence_threshold,
            };
            debug!(%decline, "heuristic tier declined");
        }

        if preferences.use_remote_model {
            if let Some(backend) = &self.remote_model {
                let snippet: String = document_text.chars().take(REMOTE_SNIPPET_CHARS).collect();
                // Last resort: accepted unconditionally, and its failures
                // are the request's failures.
                let result = self
                    .attempt_model(
                        backend.as_ref(),
                        snippet,
                        &signals,
                        &candidates,
                        &preferences,
                        extension,
                    )
                    .await?;
                info!(
                    destination = %result.destination_relative_path,
                    "remote model classification accepted"
                );
                return Ok(result);
            }
        }

        Err(ClassifyError::NoClassificationAvailable)
    }

    async fn attempt_model(
        &self,
        backend: &dyn ModelBackend,
        snippet: String,
        signals: &DocumentSignals,
        candidates: &[DirectoryNode],
        preferences: &UserPreferences,
        extension: &str,
    ) -> Result<ClassificationResult, ClassifyError> {
        let request = build_request(snippet, signals, candidates, preferences);
        let hints = backend.classify(&request).await?;
        Ok(result_from_hints(hints, signals, preferences, extension))
    }
}

fn build_request(
    snippet: String,
    signals: &DocumentSignals,
    candidates: &[DirectoryNode],
    preferences: &UserPreferences,
) -> ClassifyRequest {
    ClassifyRequest {
        snippet,
        language: signals.language.clone(),
        vendor_candidates: signals.vendor_candidates.iter().cloned().collect(),
        doc_type_hints: signals.doc_type_hints.iter().cloned().collect(),
        reference_tokens: signals.reference_tokens.iter().cloned().collect(),
        folders: candidates.iter().map(|c| c.relative_path.clone()).collect(),
        naming_template: preferences.naming_template.clone(),
        system_message: preferences.system_message.clone(),
        metadata: BTreeMap::new(),
    }
}

fn result_from_hints(
    hints: ClassificationHints,
    signals: &DocumentSignals,
    preferences: &UserPreferences,
    extension: &str,
) -> ClassificationResult {
    let fields = signals.to_fields();
    let proposed_filename = if hints.filename.is_empty() {
        let extension = if extension.is_empty() { "pdf" } else { extension };
        filename::synthesize(&preferences.naming_template, &fields, extension)
    } else {
        hints.filename
    };
    ClassificationResult {
        destination_relative_path: hints.path,
        proposed_filename,
        confidence: hints.confidence,
        rationale: hints.reason,
        fields,
    }
}
