//! Confidence Aggregator: merges mapped candidates into per-category
//! scores and decides whether the rule-based signal is conclusive.

use serde::{Deserialize, Serialize};
use weee_types::{BoundingBox, CategoryScore, Signal, WeeeCategory};

use crate::service::mapper::MappedCandidate;

/// Thresholds governing when a rule-based result counts as unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbiguityPolicy {
    /// Minimum lead of the top score over the runner-up
    pub margin: f64,
    /// Minimum absolute top score
    pub floor: f64,
}

impl Default for AmbiguityPolicy {
    fn default() -> Self {
        Self {
            margin: 0.15,
            floor: 0.30,
        }
    }
}

/// Aggregated scores plus the ambiguity verdict
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOutcome {
    /// One entry per category with score > 0, sorted descending by score.
    /// Exact score ties sort by category preference rank; this fixes the
    /// presentation order only, the tie itself stays ambiguous.
    pub scores: Vec<CategoryScore>,
    pub signal: Signal,
}

impl AggregationOutcome {
    pub fn top(&self) -> Option<&CategoryScore> {
        self.scores.first()
    }

    pub fn total_score(&self) -> f64 {
        self.scores.iter().map(|s| s.score).sum()
    }
}

/// Sum `confidence x weight` per category and classify the signal.
///
/// Candidates mapped to `Unknown` (weight 0) never contribute. A tie at
/// the top is always ambiguous; it is never broken by label or insertion
/// order.
pub fn aggregate(mapped: &[MappedCandidate], policy: &AmbiguityPolicy) -> AggregationOutcome {
    let mut scores: Vec<CategoryScore> = Vec::new();

    for entry in mapped {
        let category = entry.mapping.category;
        if category == WeeeCategory::Unknown || entry.mapping.weight <= 0.0 {
            continue;
        }
        let contribution = entry.candidate.confidence * entry.mapping.weight;
        if contribution <= 0.0 {
            continue;
        }
        match scores.iter_mut().find(|s| s.category == category) {
            Some(score) => {
                score.score += contribution;
                score.contributing_labels.push(entry.candidate.label.clone());
            }
            None => scores.push(CategoryScore {
                category,
                score: contribution,
                contributing_labels: vec![entry.candidate.label.clone()],
            }),
        }
    }

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.preference_rank().cmp(&b.category.preference_rank()))
    });

    let signal = classify_signal(&scores, policy);

    AggregationOutcome { scores, signal }
}

fn classify_signal(scores: &[CategoryScore], policy: &AmbiguityPolicy) -> Signal {
    let Some(top) = scores.first() else {
        return Signal::NoSignal;
    };
    let runner_up = scores.get(1).map(|s| s.score).unwrap_or(0.0);

    // An exact tie at the top is never conclusive, not even with a zero
    // margin; a tie resolved by presentation order would be arbitrary.
    if scores.len() > 1 && top.score == runner_up {
        return Signal::Ambiguous;
    }

    if top.score - runner_up >= policy.margin && top.score >= policy.floor {
        Signal::Unambiguous
    } else {
        Signal::Ambiguous
    }
}

/// Fraction of the image covered by a detection region.
pub fn size_ratio(region: &BoundingBox, image_size: (u32, u32)) -> f64 {
    let (w, h) = image_size;
    let image_area = (w.max(1) as u64 * h.max(1) as u64) as f64;
    region.area().max(1) as f64 / image_area
}

/// Size-bucket fallback category: large when the object dominates the
/// frame, small otherwise. Only consulted when the keyword table produced
/// no signal and the caller opted in.
pub fn size_bucket_category(ratio: f64) -> WeeeCategory {
    if ratio >= 0.20 {
        WeeeCategory::LargeEquipment
    } else {
        WeeeCategory::SmallEquipment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::mapper::map_candidates;
    use weee_types::DetectionCandidate;

    fn mapped(pairs: &[(&str, f64)]) -> Vec<MappedCandidate> {
        let candidates: Vec<DetectionCandidate> = pairs
            .iter()
            .map(|(label, conf)| DetectionCandidate::new(*label, *conf))
            .collect();
        map_candidates(&candidates)
    }

    #[test]
    fn test_clear_winner_is_unambiguous() {
        // smartphone -> small_it 0.9, cable -> small_equipment 0.4
        let outcome = aggregate(
            &mapped(&[("smartphone", 0.9), ("cable", 0.4)]),
            &AmbiguityPolicy::default(),
        );
        assert_eq!(outcome.signal, Signal::Unambiguous);
        assert_eq!(outcome.scores.len(), 2);
        assert_eq!(outcome.scores[0].category, WeeeCategory::SmallIt);
        assert!((outcome.scores[0].score - 0.9).abs() < 1e-9);
        assert_eq!(outcome.scores[1].category, WeeeCategory::SmallEquipment);
        assert!((outcome.scores[1].score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_narrow_margin_is_ambiguous() {
        // lamp 0.5 vs monitor 0.45: margin 0.05 < 0.15
        let outcome = aggregate(
            &mapped(&[("lamp", 0.5), ("monitor", 0.45)]),
            &AmbiguityPolicy::default(),
        );
        assert_eq!(outcome.signal, Signal::Ambiguous);
        assert_eq!(outcome.scores[0].category, WeeeCategory::Lamps);
    }

    #[test]
    fn test_exact_tie_is_always_ambiguous() {
        let outcome = aggregate(
            &mapped(&[("lamp", 0.6), ("monitor", 0.6)]),
            &AmbiguityPolicy::default(),
        );
        assert_eq!(outcome.signal, Signal::Ambiguous);
        // Presentation order is deterministic (preference rank), but the
        // tie itself is reported, not silently broken.
        assert_eq!(outcome.scores[0].category, WeeeCategory::ScreensMonitors);
        assert_eq!(outcome.scores[0].score, outcome.scores[1].score);
    }

    #[test]
    fn test_exact_tie_is_ambiguous_even_with_zero_margin() {
        let policy = AmbiguityPolicy {
            margin: 0.0,
            floor: 0.0,
        };
        let outcome = aggregate(&mapped(&[("lamp", 0.6), ("monitor", 0.6)]), &policy);
        assert_eq!(outcome.signal, Signal::Ambiguous);
    }

    #[test]
    fn test_below_floor_is_ambiguous() {
        // Single category but top score 0.2 < floor 0.3
        let outcome = aggregate(&mapped(&[("lamp", 0.2)]), &AmbiguityPolicy::default());
        assert_eq!(outcome.signal, Signal::Ambiguous);
    }

    #[test]
    fn test_unmapped_labels_give_no_signal() {
        let outcome = aggregate(
            &mapped(&[("banana", 0.9), ("sunset", 0.8)]),
            &AmbiguityPolicy::default(),
        );
        assert_eq!(outcome.signal, Signal::NoSignal);
        assert!(outcome.scores.is_empty());
    }

    #[test]
    fn test_empty_candidates_give_no_signal() {
        let outcome = aggregate(&[], &AmbiguityPolicy::default());
        assert_eq!(outcome.signal, Signal::NoSignal);
        assert!(outcome.top().is_none());
    }

    #[test]
    fn test_same_category_contributions_sum() {
        let outcome = aggregate(
            &mapped(&[("smartphone", 0.5), ("phone", 0.3)]),
            &AmbiguityPolicy::default(),
        );
        assert_eq!(outcome.scores.len(), 1);
        assert!((outcome.scores[0].score - 0.8).abs() < 1e-9);
        assert_eq!(
            outcome.scores[0].contributing_labels,
            vec!["smartphone".to_string(), "phone".to_string()]
        );
    }

    #[test]
    fn test_monotonicity_of_dominant_category() {
        // Raising the dominant candidate's confidence never lowers its
        // category score and cannot flip the winner.
        let base = aggregate(
            &mapped(&[("smartphone", 0.6), ("cable", 0.4)]),
            &AmbiguityPolicy::default(),
        );
        let raised = aggregate(
            &mapped(&[("smartphone", 0.9), ("cable", 0.4)]),
            &AmbiguityPolicy::default(),
        );
        assert!(raised.scores[0].score >= base.scores[0].score);
        assert_eq!(base.scores[0].category, raised.scores[0].category);
    }

    #[test]
    fn test_size_bucket_cut() {
        assert_eq!(size_bucket_category(0.25), WeeeCategory::LargeEquipment);
        assert_eq!(size_bucket_category(0.19), WeeeCategory::SmallEquipment);
        let region = BoundingBox { x: 0, y: 0, w: 50, h: 50 };
        assert!((size_ratio(&region, (100, 100)) - 0.25).abs() < 1e-9);
    }
}
