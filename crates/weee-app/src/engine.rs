//! The classification decision engine.
//!
//! One request flows strictly Normalizer -> Mapper -> Aggregator ->
//! [Arbiter] -> Assembler. The engine holds no mutable state; concurrent
//! requests only share the static rule table. The arbiter call is the
//! single suspension point and is bounded by the configured or
//! per-request timeout; dropping the returned future aborts an in-flight
//! arbitration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use weee_domain::service::aggregator::{size_bucket_category, size_ratio};
use weee_domain::{
    aggregate, assemble, is_non_eee, map_candidates, map_label, AmbiguityPolicy,
    ArbitrationOutcome, LabelMapping, MappedCandidate,
};
use weee_types::{
    ArbiterError, ArbitrationRequest, ClassificationResult, DetectionCandidate, Method, Result,
    Signal, WeeeCategory,
};
use weee_vision::{normalize, Arbiter};

use crate::config::EngineConfig;

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Bypass the ambiguity check and always invoke the arbiter
    /// (the `llm=true` override at the serving boundary)
    pub force_arbitration: bool,
    /// Per-request arbiter timeout; wins over the engine configuration
    pub timeout: Option<Duration>,
}

impl ClassifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_arbitration(mut self, force: bool) -> Self {
        self.force_arbitration = force;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Stateless classification engine. Cheap to share behind an `Arc`.
pub struct ClassificationEngine {
    config: EngineConfig,
    arbiter: Option<Arc<dyn Arbiter>>,
}

impl ClassificationEngine {
    /// Validates the configuration; a misconfigured engine never runs.
    pub fn new(config: EngineConfig, arbiter: Option<Arc<dyn Arbiter>>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, arbiter })
    }

    /// Classify one detector payload into exactly one
    /// `ClassificationResult`.
    ///
    /// Never fails for ambiguous or low-confidence input; the only
    /// user-visible errors are malformed payloads. Arbitration problems
    /// degrade to the rule-based result and are recorded in the
    /// rationale.
    pub async fn classify(
        &self,
        payload: &Value,
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult> {
        let detections = normalize(payload)?;
        let mut rationale = detections.notes.clone();

        if detections.candidates.is_empty() {
            rationale.push("no candidates after normalization".into());
        } else {
            let listing: Vec<String> = detections
                .candidates
                .iter()
                .map(|c| format!("{} ({:.2})", c.label, c.confidence))
                .collect();
            rationale.push(format!(
                "{} candidate(s) after normalization: {}",
                detections.candidates.len(),
                listing.join(", ")
            ));
        }

        let mut mapped = map_candidates(&detections.candidates);
        for entry in &mapped {
            if entry.mapping.category == WeeeCategory::Unknown {
                rationale.push(format!(
                    "label '{}' has no category mapping",
                    entry.candidate.label
                ));
            }
        }

        let policy = AmbiguityPolicy {
            margin: self.config.margin,
            floor: self.config.floor,
        };
        let mut outcome = aggregate(&mapped, &policy);

        // Non-EEE short-circuit: no keyword signal anywhere (labels AND
        // captions) and the text clearly describes something that is not
        // e-waste. An EEE keyword that only appears in a caption still
        // counts as signal and disables the filter. The force flag still
        // sends such photos to the arbiter.
        let combined_text = detections.combined_text();
        let text_signal =
            map_label(&combined_text).category != WeeeCategory::Unknown;
        if outcome.scores.is_empty()
            && !options.force_arbitration
            && is_non_eee(&combined_text, text_signal)
        {
            rationale.push(
                "non-EEE content detected (two or more non-EEE terms, no category signal)".into(),
            );
            let confidence = detections
                .candidates
                .first()
                .map(|c| c.confidence)
                .unwrap_or(0.0);
            rationale.push(format!(
                "final: {} via {} (confidence {:.2})",
                WeeeCategory::Unknown,
                Method::Rule,
                confidence
            ));
            return Ok(ClassificationResult {
                category: WeeeCategory::Unknown,
                confidence,
                method: Method::Rule,
                rationale,
                raw_candidates: detections.candidates,
            });
        }

        // Opt-in size-bucket fallback: no keyword signal, but the top
        // detection's footprint in the frame hints at a size class.
        if self.config.size_fallback && outcome.signal == Signal::NoSignal {
            if let (Some(image_size), Some(top)) =
                (detections.image_size, detections.candidates.first())
            {
                if let Some(ref region) = top.region {
                    let ratio = size_ratio(region, image_size);
                    let hint = size_bucket_category(ratio);
                    rationale.push(format!(
                        "size fallback: top region covers {:.0}% of the image, hinting {}",
                        ratio * 100.0,
                        hint
                    ));
                    mapped.push(MappedCandidate {
                        candidate: DetectionCandidate::new(top.label.clone(), top.confidence),
                        mapping: LabelMapping {
                            category: hint,
                            weight: 0.5,
                            keyword: None,
                        },
                    });
                    outcome = aggregate(&mapped, &policy);
                }
            }
        }

        if !outcome.scores.is_empty() {
            let listing: Vec<String> = outcome
                .scores
                .iter()
                .map(|s| format!("{} {:.2} ({})", s.category, s.score, s.contributing_labels.join(", ")))
                .collect();
            rationale.push(format!("category scores: {}", listing.join("; ")));
        }

        match outcome.signal {
            Signal::Unambiguous => {
                let top = outcome.scores[0].score;
                let runner_up = outcome.scores.get(1).map(|s| s.score).unwrap_or(0.0);
                rationale.push(format!(
                    "unambiguous: top {:.2} leads runner-up {:.2} by {:.2} (margin {:.2}, floor {:.2})",
                    top,
                    runner_up,
                    top - runner_up,
                    self.config.margin,
                    self.config.floor
                ));
            }
            Signal::Ambiguous => {
                let top = outcome.scores[0].score;
                let runner_up = outcome.scores.get(1).map(|s| s.score).unwrap_or(0.0);
                rationale.push(format!(
                    "ambiguous: top {:.2} leads runner-up {:.2} by only {:.2} (margin {:.2}, floor {:.2})",
                    top,
                    runner_up,
                    top - runner_up,
                    self.config.margin,
                    self.config.floor
                ));
            }
            Signal::NoSignal => {
                rationale.push(format!(
                    "no category signal from {} candidate(s)",
                    detections.candidates.len()
                ));
            }
        }

        // With an empty candidate set there is nothing for an oracle to
        // look at; no-signal escalates only when candidates exist.
        let should_arbitrate = options.force_arbitration
            || (outcome.signal.escalates() && !detections.candidates.is_empty());

        let arbitration = if !should_arbitrate {
            ArbitrationOutcome::NotInvoked
        } else {
            match self.arbiter {
                None => {
                    rationale.push(
                        "arbitration wanted but no arbiter configured; falling back to rule-based result"
                            .into(),
                    );
                    ArbitrationOutcome::NotInvoked
                }
                Some(ref arbiter) => {
                    rationale.push(if options.force_arbitration {
                        "arbitration forced by caller".into()
                    } else {
                        format!("arbitration invoked: {} rule signal", outcome.signal)
                    });
                    let request = ArbitrationRequest::new(
                        detections.candidates.clone(),
                        outcome.scores.clone(),
                        outcome.top().map(|s| s.category),
                        detections.image_caption.clone(),
                    );
                    self.run_arbitration(arbiter.as_ref(), &request, options).await
                }
            }
        };

        Ok(assemble(
            &outcome,
            &arbitration,
            self.config.disagreement_discount,
            detections.candidates,
            rationale,
        ))
    }

    async fn run_arbitration(
        &self,
        arbiter: &dyn Arbiter,
        request: &ArbitrationRequest,
        options: &ClassifyOptions,
    ) -> ArbitrationOutcome {
        let limit = options.timeout.or(self.config.arbiter_timeout);
        let call = arbiter.arbitrate(request);

        let result = match limit {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(inner) => inner,
                Err(_) => Err(ArbiterError::Unavailable(format!(
                    "timed out after {:.1}s",
                    limit.as_secs_f64()
                ))),
            },
            None => call.await,
        };

        match result {
            Ok(response) => match response.category {
                Some(category) => ArbitrationOutcome::Chose {
                    category,
                    justification: response.justification,
                },
                None => ArbitrationOutcome::Declined,
            },
            Err(e) => ArbitrationOutcome::Failed(e.to_string()),
        }
    }
}
