//! Arbitration prompt construction.
//!
//! The prompt enumerates the six categories, the normalized candidates
//! with their rule-based scores, and the rule suggestion, and pins the
//! expected answer shape so the response parser has something to hold on
//! to. English throughout; category names are the directive names.

use std::fmt::Write;
use weee_types::{ArbitrationRequest, WeeeCategory};

/// Build the prompt for one arbitration call.
pub fn build_arbitration_prompt(request: &ArbitrationRequest) -> String {
    let mut prompt = String::from(
        "You are an arbiter that assigns a photographed e-waste item to exactly ONE of the six WEEE categories.\n\n\
         Categories:\n",
    );

    for category in WeeeCategory::CATEGORIES {
        // id() is Some for all six proper categories
        if let Some(id) = category.id() {
            let _ = writeln!(prompt, "  {} - {}", id, category.name());
        }
    }

    match request.rule_choice {
        Some(choice) => {
            let _ = writeln!(
                prompt,
                "\nRule-based suggestion: {} - {}",
                choice.id().map(|id| id.to_string()).unwrap_or_default(),
                choice.name()
            );
        }
        None => {
            let _ = writeln!(prompt, "\nRule-based suggestion: none (no keyword signal)");
        }
    }

    let _ = writeln!(prompt, "\nDetected candidates:");
    if request.candidates.is_empty() {
        let _ = writeln!(prompt, "  (none)");
    }
    for candidate in &request.candidates {
        let _ = writeln!(
            prompt,
            "  - {} (confidence {:.2})",
            candidate.label, candidate.confidence
        );
    }

    if !request.scores.is_empty() {
        let _ = writeln!(prompt, "\nCategory scores:");
        for score in &request.scores {
            let _ = writeln!(
                prompt,
                "  - {}: {:.2} ({})",
                score.category,
                score.score,
                score.contributing_labels.join(", ")
            );
        }
    }

    if let Some(ref caption) = request.image_caption {
        let _ = writeln!(prompt, "\nImage caption: {}", caption);
    }

    let _ = write!(
        prompt,
        "\nAnswer with the category id (1-6) and the category name, followed by a brief justification.\n\
         If the item cannot be placed in any category, answer exactly: cannot decide\n\
         Request: {}\n",
        request.request_id
    );

    prompt
}
