//! Mines structured signals out of free document text: dates, monetary
//! amounts, vendor names, document-type hints, reference numbers and the
//! dominant language.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use regex::Regex;
use unicode_script::{Script, UnicodeScript};

use crate::models::ExtractedFields;

/// A monetary amount with an optional 3-letter currency code.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    pub value: f64,
    pub currency: Option<String>,
}

/// Structured facts mined from one document's text. Produced once per
/// classification attempt and immutable thereafter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSignals {
    pub language: String,
    /// In order of detection in the text, not chronological.
    pub dates: Vec<NaiveDate>,
    pub amounts: Vec<Amount>,
    pub vendor_candidates: BTreeSet<String>,
    pub doc_type_hints: BTreeSet<String>,
    pub reference_tokens: BTreeSet<String>,
}

impl DocumentSignals {
    /// Single best-guess projection: first candidates, latest date.
    /// Empty signals yield every field `None`.
    pub fn to_fields(&self) -> ExtractedFields {
        ExtractedFields {
            vendor: self.vendor_candidates.iter().next().cloned(),
            doc_type: self.doc_type_hints.iter().next().cloned(),
            date: self.dates.iter().max().copied(),
            amount: self.amounts.first().map(|a| a.value),
            currency: self.amounts.first().and_then(|a| a.currency.clone()),
            reference: self.reference_tokens.iter().next().cloned(),
        }
    }
}

/// Currency codes excluded from the all-caps vendor heuristic.
const CURRENCY_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "CHF", "JPY", "CAD", "AUD", "NZD", "SEK", "NOK", "DKK", "PLN", "CZK",
];

/// Common document acronyms that are never vendor names.
const ACRONYM_STOPLIST: &[&str] = &[
    "PDF", "VAT", "IBAN", "BIC", "REF", "NET", "TAX", "QTY", "ID", "NO", "PO", "TOTAL", "DUE",
];

pub struct SignalExtractor {
    amount_re: Regex,
    iso_date_re: Regex,
    numeric_date_re: Regex,
    month_day_year_re: Regex,
    day_month_year_re: Regex,
    org_re: Regex,
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalExtractor {
    pub fn new() -> Self {
        Self {
            amount_re: Regex::new(r"([A-Z]{3})?\s?([0-9]+[.,][0-9]{2})")
                .expect("hard-coded regex"),
            iso_date_re: Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("hard-coded regex"),
            numeric_date_re: Regex::new(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4})\b")
                .expect("hard-coded regex"),
            month_day_year_re: Regex::new(
                r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
            )
            .expect("hard-coded regex"),
            day_month_year_re: Regex::new(
                r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\.?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{4})\b",
            )
            .expect("hard-coded regex"),
            org_re: Regex::new(
                r"\b([A-Z][A-Za-z&-]*(?:\s+[A-Z][A-Za-z&-]*)*)\s+(Inc|LLC|Ltd|GmbH|Corp|AG|Co|PLC|SA)\b",
            )
            .expect("hard-coded regex"),
        }
    }

    /// Never fails: text with no signals yields an all-empty struct.
    pub fn analyze(&self, text: &str) -> DocumentSignals {
        let mut signals = DocumentSignals {
            language: guess_language(text),
            ..DocumentSignals::default()
        };

        for raw in text.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if token.is_empty() {
                continue;
            }
            let lower = token.to_lowercase();

            if lower.contains("invoice") || lower.contains("receipt") {
                signals.doc_type_hints.insert("Invoice".to_string());
            }
            if lower.contains("contract") {
                signals.doc_type_hints.insert("Contract".to_string());
            }
            if lower.contains("policy") {
                signals.doc_type_hints.insert("Policy".to_string());
            }
            if lower.contains("ref") || lower.contains("order") {
                signals.reference_tokens.insert(token.to_string());
            }
            if is_vendor_acronym(token) {
                signals.vendor_candidates.insert(token.to_string());
            }
        }

        for caps in self.org_re.captures_iter(text) {
            signals
                .vendor_candidates
                .insert(format!("{} {}", &caps[1], &caps[2]));
        }

        signals.dates = self.detect_dates(text);
        signals.amounts = self.detect_amounts(text);
        signals
    }

    fn detect_dates(&self, text: &str) -> Vec<NaiveDate> {
        let mut found: Vec<(usize, NaiveDate)> = Vec::new();

        for caps in self.iso_date_re.captures_iter(text) {
            let (Ok(y), Ok(m), Ok(d)) = (
                caps[1].parse::<i32>(),
                caps[2].parse::<u32>(),
                caps[3].parse::<u32>(),
            ) else {
                continue;
            };
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                found.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }

        for caps in self.numeric_date_re.captures_iter(text) {
            let (Ok(first), Ok(second), Ok(y)) =
                (caps[1].parse::<u32>(), caps[2].parse::<u32>(), caps[3].parse::<i32>())
            else {
                continue;
            };
            // Month-first wins when both readings are valid.
            let date = NaiveDate::from_ymd_opt(y, first, second)
                .or_else(|| NaiveDate::from_ymd_opt(y, second, first));
            if let Some(date) = date {
                found.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }

        for caps in self.month_day_year_re.captures_iter(text) {
            let (Some(m), Ok(d), Ok(y)) = (
                month_number(&caps[1]),
                caps[2].parse::<u32>(),
                caps[3].parse::<i32>(),
            ) else {
                continue;
            };
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                found.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }

        for caps in self.day_month_year_re.captures_iter(text) {
            let (Ok(d), Some(m), Ok(y)) = (
                caps[1].parse::<u32>(),
                month_number(&caps[2]),
                caps[3].parse::<i32>(),
            ) else {
                continue;
            };
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                found.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }

        found.sort_by_key(|(start, _)| *start);
        found.dedup_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, date)| date).collect()
    }

    fn detect_amounts(&self, text: &str) -> Vec<Amount> {
        self.amount_re
            .captures_iter(text)
            .filter_map(|caps| {
                let raw = caps.get(2)?.as_str().replace(',', ".");
                // Unparseable matches are dropped silently.
                let value: f64 = raw.parse().ok()?;
                Some(Amount {
                    value,
                    currency: caps.get(1).map(|c| c.as_str().to_string()),
                })
            })
            .collect()
    }
}

fn is_vendor_acronym(token: &str) -> bool {
    token.len() >= 2
        && token.len() <= 12
        && token.chars().all(|c| c.is_ascii_uppercase())
        && !CURRENCY_CODES.contains(&token)
        && !ACRONYM_STOPLIST.contains(&token)
}

fn month_number(prefix: &str) -> Option<u32> {
    match prefix.to_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Dominant-script language guess, falling back to the process locale and
/// finally to English.
fn guess_language(text: &str) -> String {
    match dominant_script(text) {
        Some(Script::Latin) => latin_language(text),
        Some(Script::Han) => "zh".to_string(),
        Some(Script::Hiragana) | Some(Script::Katakana) => "ja".to_string(),
        Some(Script::Hangul) => "ko".to_string(),
        Some(Script::Cyrillic) => "ru".to_string(),
        Some(Script::Arabic) => "ar".to_string(),
        Some(Script::Hebrew) => "he".to_string(),
        Some(Script::Greek) => "el".to_string(),
        Some(Script::Devanagari) => "hi".to_string(),
        Some(Script::Thai) => "th".to_string(),
        _ => system_language().unwrap_or_else(|| "en".to_string()),
    }
}

/// Single pass over alphabetic characters, most frequent script wins.
fn dominant_script(text: &str) -> Option<Script> {
    let mut counts: std::collections::HashMap<Script, usize> = std::collections::HashMap::new();
    for ch in text.chars() {
        if !ch.is_alphabetic() {
            continue;
        }
        *counts.entry(ch.script()).or_insert(0) += 1;
    }
    counts.into_iter().max_by_key(|(_, n)| *n).map(|(s, _)| s)
}

fn latin_language(text: &str) -> String {
    const STOPWORDS: &[(&str, &[&str])] = &[
        ("en", &["the", "and", "of", "is", "to", "for"]),
        ("de", &["der", "die", "und", "das", "nicht", "mit"]),
        ("fr", &["le", "la", "les", "et", "des", "une"]),
        ("es", &["el", "los", "las", "una", "por", "para"]),
    ];

    let mut best: Option<(&str, usize)> = None;
    for &(code, words) in STOPWORDS {
        let hits = text
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|t| words.contains(&t.as_str()))
            .count();
        if hits > 0 && best.map_or(true, |(_, n)| hits > n) {
            best = Some((code, hits));
        }
    }
    match best {
        Some((code, _)) => code.to_string(),
        None => system_language().unwrap_or_else(|| "en".to_string()),
    }
}

/// Language code from the process locale, e.g. `en_US.UTF-8` -> `en`.
fn system_language() -> Option<String> {
    let lang = std::env::var("LANG").ok()?;
    let code: String = lang
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if (2..=3).contains(&code.len()) {
        Some(code.to_lowercase())
    } else {
        None
    }
}
