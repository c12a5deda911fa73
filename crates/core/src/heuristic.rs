//! On-device classifier: rule engine first, nearest-folder embedding
//! similarity second.

use std::sync::Arc;

use crate::catalog::DirectoryNode;
use crate::embedding::{cosine_similarity, TextEmbedder};
use crate::filename;
use crate::models::{ClassificationResult, ExtractedFields};
use crate::rules::match_rules;
use crate::signals::DocumentSignals;
use storage::ArchiveRule;

pub struct HeuristicClassifier {
    embedder: Arc<dyn TextEmbedder>,
}

impl HeuristicClassifier {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }

    /// Returns `None` when no rule matches and no candidate scores above
    /// zero with a non-empty embedding.
    pub fn classify(
        &self,
        text: &str,
        signals: &DocumentSignals,
        candidates: &[DirectoryNode],
        rules: &[ArchiveRule],
        template: &str,
        file_extension: &str,
    ) -> Option<ClassificationResult> {
        let extension = if file_extension.is_empty() {
            "pdf"
        } else {
            file_extension
        };

        if let Some(matched) = match_rules(text, rules) {
            // Rule hits deliberately carry no extracted fields.
            let template = matched
                .rule
                .then
                .filename_template
                .as_deref()
                .unwrap_or(template);
            let fields = ExtractedFields::default();
            let proposed = filename::synthesize(template, &fields, extension);
            return Some(ClassificationResult {
                destination_relative_path: matched.rule.then.destination_relative_path.clone(),
                proposed_filename: proposed,
                confidence: matched.confidence,
                rationale: matched.rationale,
                fields,
            });
        }

        let text_embedding = self.embedder.embed(&text.to_lowercase());
        let mut best_score = 0.0f64;
        let mut best_node: Option<&DirectoryNode> = None;
        for node in candidates {
            if node.embedding.is_empty() {
                continue;
            }
            let score = cosine_similarity(&text_embedding, &node.embedding);
            // Strict comparison: the first maximum wins on ties.
            if score > best_score {
                best_score = score;
                best_node = Some(node);
            }
        }

        let chosen = best_node?;
        let fields = signals.to_fields();
        let proposed = filename::synthesize(template, &fields, extension);
        Some(ClassificationResult {
            destination_relative_path: chosen.relative_path.clone(),
            proposed_filename: proposed,
            confidence: best_score,
            rationale: "Embedding similarity heuristic".to_string(),
            fields,
        })
    }
}
