//! Category Mapper: deterministic, total mapping from detector labels to
//! WEEE categories.
//!
//! Every possible label resolves to a category or `Unknown`; mapping one
//! label never depends on what else was detected. When several keywords
//! match the same label, the longest keyword wins; equal lengths fall back
//! to the fixed category preference order.

use weee_types::{DetectionCandidate, WeeeCategory};

use crate::rules::{RuleEntry, NON_EEE_KEYWORDS, RULES};

/// Outcome of mapping one label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMapping {
    pub category: WeeeCategory,
    /// Scoring weight; 0.0 for `Unknown`
    pub weight: f64,
    /// Keyword that fired, for the rationale trail
    pub keyword: Option<&'static str>,
}

impl LabelMapping {
    pub fn unknown() -> Self {
        Self {
            category: WeeeCategory::Unknown,
            weight: 0.0,
            keyword: None,
        }
    }
}

/// A candidate together with its rule-table mapping
#[derive(Debug, Clone, PartialEq)]
pub struct MappedCandidate {
    pub candidate: DetectionCandidate,
    pub mapping: LabelMapping,
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn better_of<'a>(a: &'a RuleEntry, b: &'a RuleEntry) -> &'a RuleEntry {
    if b.keyword.len() > a.keyword.len() {
        return b;
    }
    if b.keyword.len() == a.keyword.len()
        && b.category.preference_rank() < a.category.preference_rank()
    {
        return b;
    }
    a
}

/// Map a single label to `(category, weight)`. Total: unmapped labels
/// yield `Unknown` with weight 0.
pub fn map_label(label: &str) -> LabelMapping {
    let text = normalize(label);
    let mut best: Option<&RuleEntry> = None;
    for entry in RULES {
        if text.contains(entry.keyword) {
            best = Some(match best {
                Some(current) => better_of(current, entry),
                None => entry,
            });
        }
    }
    match best {
        Some(entry) => LabelMapping {
            category: entry.category,
            weight: entry.weight,
            keyword: Some(entry.keyword),
        },
        None => LabelMapping::unknown(),
    }
}

/// Map an ordered candidate list, preserving order.
pub fn map_candidates(candidates: &[DetectionCandidate]) -> Vec<MappedCandidate> {
    candidates
        .iter()
        .map(|candidate| MappedCandidate {
            candidate: candidate.clone(),
            mapping: map_label(&candidate.label),
        })
        .collect()
}

/// Count non-EEE keyword hits in a free-text blob (labels + captions).
pub fn non_eee_hits(text: &str) -> usize {
    let text = normalize(text);
    NON_EEE_KEYWORDS.iter().filter(|k| text.contains(*k)).count()
}

/// Non-EEE filter: only fires when there is no category signal at all,
/// and even then requires two independent non-EEE hits.
pub fn is_non_eee(text: &str, has_category_signal: bool) -> bool {
    if has_category_signal {
        return false;
    }
    non_eee_hits(text) >= 2
}
