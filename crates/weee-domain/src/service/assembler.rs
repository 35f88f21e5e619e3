//! Decision Assembler: combines the aggregation outcome and the optional
//! arbitration outcome into the final `ClassificationResult`.

use weee_types::{ClassificationResult, DetectionCandidate, Method, WeeeCategory};

use crate::service::aggregator::AggregationOutcome;

/// What happened with arbitration for this request
#[derive(Debug, Clone, PartialEq)]
pub enum ArbitrationOutcome {
    /// Signal was conclusive (or no arbiter configured) and nothing forced it
    NotInvoked,
    /// The oracle picked a category
    Chose {
        category: WeeeCategory,
        justification: Option<String>,
    },
    /// The oracle answered but explicitly could not decide
    Declined,
    /// Unavailable, timed out, or unparseable; message goes to the rationale
    Failed(String),
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Assemble the final result.
///
/// Selection policy: a successful arbitration wins with
/// `method = llm_arbiter`; anything else falls back to the top rule-based
/// category with `method = rule`. Arbitration failures degrade gracefully,
/// they never fail the request.
pub fn assemble(
    outcome: &AggregationOutcome,
    arbitration: &ArbitrationOutcome,
    disagreement_discount: f64,
    raw_candidates: Vec<DetectionCandidate>,
    mut rationale: Vec<String>,
) -> ClassificationResult {
    let total = outcome.total_score();
    let rule_top = outcome.top();
    let rule_confidence = rule_top
        .map(|top| clamp_unit(top.score / total))
        .unwrap_or(0.0);

    let (category, confidence, method) = match arbitration {
        ArbitrationOutcome::Chose {
            category,
            justification,
        } => {
            match justification {
                Some(text) => rationale.push(format!("arbiter chose {}: {}", category, text)),
                None => rationale.push(format!("arbiter chose {}", category)),
            }
            let confidence = match rule_top {
                Some(top) if top.category == *category => rule_confidence,
                Some(_) => {
                    rationale.push(format!(
                        "arbiter disagrees with rule-based top; confidence discounted by {:.2}",
                        disagreement_discount
                    ));
                    clamp_unit(rule_confidence * disagreement_discount)
                }
                // No rule signal at all: fall back to the strongest raw
                // detection, discounted, since no keyword supported it.
                None => {
                    let top_raw = raw_candidates
                        .iter()
                        .map(|c| c.confidence)
                        .fold(0.0, f64::max);
                    clamp_unit(top_raw * disagreement_discount)
                }
            };
            (*category, confidence, Method::LlmArbiter)
        }
        other => {
            match other {
                ArbitrationOutcome::Declined => rationale
                    .push("arbiter declined to decide; falling back to rule-based result".into()),
                ArbitrationOutcome::Failed(reason) => rationale.push(format!(
                    "arbitration failed ({}); falling back to rule-based result",
                    reason
                )),
                _ => {}
            }
            match rule_top {
                Some(top) => (top.category, rule_confidence, Method::Rule),
                None => (WeeeCategory::Unknown, 0.0, Method::Rule),
            }
        }
    };

    rationale.push(format!(
        "final: {} via {} (confidence {:.2})",
        category, method, confidence
    ));

    ClassificationResult {
        category,
        confidence,
        method,
        rationale,
        raw_candidates,
    }
}
