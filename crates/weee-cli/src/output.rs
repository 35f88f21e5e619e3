//! Output formatting module

use weee_types::{ClassificationResult, OutputFormat, Result, WeeeCategory};

pub fn output_result(output_format: OutputFormat, result: &ClassificationResult) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(result)?;
        println!("{}", content);
    } else {
        println!("\nClassification Result");
        println!("=====================");
        match result.category.id() {
            Some(id) => println!("Category:    {} - {}", id, result.category.name()),
            None => println!("Category:    {}", result.category.name()),
        }
        println!("Confidence:  {:.0}%", result.confidence * 100.0);
        println!("Method:      {}", result.method);

        if !result.raw_candidates.is_empty() {
            println!("\nCandidates:");
            for candidate in &result.raw_candidates {
                println!("  {:<24} {:.2}", candidate.label, candidate.confidence);
            }
        }

        println!("\nRationale:");
        for line in &result.rationale {
            println!("  - {}", line);
        }
    }

    Ok(())
}

/// One line per category for the batch summary
pub fn category_summary(counts: &[(WeeeCategory, usize)]) -> String {
    let mut summary = String::new();
    for (category, count) in counts {
        if *count == 0 {
            continue;
        }
        summary.push_str(&format!("  {:<24} {}\n", category.code(), count));
    }
    summary
}
