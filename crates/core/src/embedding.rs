//! Token-averaged word embeddings over a fixed lexicon, plus the cosine
//! similarity used for nearest-folder matching.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Maps a string to a fixed-length vector. Empty when no token resolves.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Mean-of-word-vectors embedder over a JSON lexicon of the form
/// `{"invoice": [0.1, 0.2, ...], ...}`. Every vector shares one
/// dimensionality; entries that disagree with the first are dropped on load.
pub struct LexiconEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimensions: usize,
}

impl LexiconEmbedder {
    pub fn new(vectors: HashMap<String, Vec<f32>>) -> Self {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for v in vectors.values() {
            *counts.entry(v.len()).or_insert(0) += 1;
        }
        let dimensions = counts
            .into_iter()
            .max_by_key(|(len, n)| (*n, *len))
            .map(|(len, _)| len)
            .unwrap_or(0);
        let vectors = vectors
            .into_iter()
            .filter(|(_, v)| v.len() == dimensions)
            .map(|(word, v)| (word.to_lowercase(), v))
            .collect();
        Self {
            vectors,
            dimensions,
        }
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(data)?))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(Self::from_json(&data)?)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl TextEmbedder for LexiconEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let tokens: Vec<String> = text.split_whitespace().map(|t| t.to_lowercase()).collect();
        let mut accumulator: Vec<f32> = Vec::new();
        for token in &tokens {
            let Some(vector) = self.vectors.get(token) else {
                continue;
            };
            if accumulator.is_empty() {
                accumulator = vector.clone();
            } else {
                for (slot, component) in accumulator.iter_mut().zip(vector) {
                    *slot += component;
                }
            }
        }
        if !accumulator.is_empty() {
            // Divisor is the full token count, resolved or not.
            let count = tokens.len() as f32;
            for slot in accumulator.iter_mut() {
                *slot /= count;
            }
        }
        accumulator
    }
}

/// Cosine similarity guarded against empty, mismatched-length and zero-norm
/// input; returns 0 in all of those cases and never NaN.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f64 {
    if lhs.is_empty() || lhs.len() != rhs.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut lhs_norm = 0.0f64;
    let mut rhs_norm = 0.0f64;
    for (a, b) in lhs.iter().zip(rhs) {
        dot += f64::from(*a) * f64::from(*b);
        lhs_norm += f64::from(*a) * f64::from(*a);
        rhs_norm += f64::from(*b) * f64::from(*b);
    }
    if lhs_norm <= 0.0 || rhs_norm <= 0.0 {
        return 0.0;
    }
    dot / (lhs_norm.sqrt() * rhs_norm.sqrt())
}
