//! Deterministic template-driven filename synthesis.

use uuid::Uuid;

use crate::models::ExtractedFields;

const INVALID: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];
const DATE_PLACEHOLDER: &str = "yyyy-MM-dd";

/// Pure and total: always returns a non-empty stem plus the extension.
/// Placeholders for absent fields are left untouched.
pub fn synthesize(template: &str, fields: &ExtractedFields, original_extension: &str) -> String {
    let mut filename = template.to_string();
    if let Some(date) = fields.date {
        filename = filename.replace(DATE_PLACEHOLDER, &date.format("%Y-%m-%d").to_string());
    }
    if let Some(vendor) = &fields.vendor {
        filename = filename.replace("Vendor", &sanitize(vendor));
    }
    if let Some(doc_type) = &fields.doc_type {
        filename = filename.replace("DocType", &sanitize(doc_type));
    }
    if let Some(amount) = fields.amount {
        filename = filename.replace("Amount", &amount.to_string());
    }
    if let Some(currency) = &fields.currency {
        filename = filename.replace("Currency", &sanitize(currency));
    }
    filename = filename.replace("__", "_");
    filename = filename.replace(' ', "_");
    let mut filename = filename.trim_matches(&['.', '_'][..]).to_string();
    if filename.is_empty() {
        filename = Uuid::new_v4().to_string();
    }
    let sanitized = sanitize(&filename);
    let truncated: String = sanitized.chars().take(200).collect();
    format!("{truncated}.{original_extension}")
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if INVALID.contains(&c) { '_' } else { c })
        .collect()
}
