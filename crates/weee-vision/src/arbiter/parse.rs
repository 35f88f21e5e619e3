//! Arbiter response parsing: free text in, categorical answer out.
//!
//! Accepts a category id (1-6) as a standalone token, a category name, or
//! a short alias; an explicit decline ("cannot decide") is a valid answer,
//! not an error. Categories are tried in id order, so an answer that
//! mentions several resolves to the first.

use weee_types::{ArbiterError, ArbitrationResponse, WeeeCategory};

const DECLINE_MARKERS: &[&str] = &["cannot decide", "can't decide", "undecided", "unable to classify"];

fn aliases(category: WeeeCategory) -> &'static [&'static str] {
    match category {
        WeeeCategory::TemperatureExchange => &["temperature exchange", "temperature_exchange"],
        WeeeCategory::ScreensMonitors => &["screens and monitors", "screens_monitors", "screens", "monitor"],
        WeeeCategory::Lamps => &["lamps", "lamp"],
        WeeeCategory::LargeEquipment => &["large equipment", "large_equipment"],
        WeeeCategory::SmallEquipment => &["small equipment", "small_equipment"],
        WeeeCategory::SmallIt => &["small it", "small_it", "telecommunication"],
        WeeeCategory::Unknown => &[],
    }
}

/// True when `text` contains `digit` as a standalone token ("3", "3 -",
/// "(3)"), not as part of a larger number or word.
fn contains_digit_token(text: &str, digit: char) -> bool {
    let bytes: Vec<char> = text.chars().collect();
    for (i, &c) in bytes.iter().enumerate() {
        if c != digit {
            continue;
        }
        let before_ok = i == 0 || !bytes[i - 1].is_alphanumeric();
        let after_ok = i + 1 == bytes.len() || !bytes[i + 1].is_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

/// Parse the oracle's free-text answer into an `ArbitrationResponse`.
pub fn parse_arbiter_response(text: &str) -> Result<ArbitrationResponse, ArbiterError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ArbiterError::InvalidResponse("empty response".into()));
    }
    let lowered = trimmed.to_lowercase();

    if DECLINE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Ok(ArbitrationResponse {
            category: None,
            justification: Some(trimmed.to_string()),
        });
    }

    for category in WeeeCategory::CATEGORIES {
        let by_name = aliases(category)
            .iter()
            .any(|alias| lowered.contains(alias));
        let by_id = category
            .id()
            .map(|id| contains_digit_token(&lowered, char::from(b'0' + id)))
            .unwrap_or(false);
        if by_name || by_id {
            return Ok(ArbitrationResponse {
                category: Some(category),
                justification: Some(trimmed.to_string()),
            });
        }
    }

    let preview: String = trimmed.chars().take(120).collect();
    Err(ArbiterError::InvalidResponse(preview))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_id_token() {
        let response = parse_arbiter_response("3 - Lamps, fluorescent tube visible").unwrap();
        assert_eq!(response.category, Some(WeeeCategory::Lamps));
        assert!(response.justification.unwrap().contains("fluorescent"));
    }

    #[test]
    fn test_parse_by_name() {
        let response = parse_arbiter_response("This is clearly Small IT equipment.").unwrap();
        assert_eq!(response.category, Some(WeeeCategory::SmallIt));
    }

    #[test]
    fn test_parse_by_code() {
        let response = parse_arbiter_response("category: screens_monitors").unwrap();
        assert_eq!(response.category, Some(WeeeCategory::ScreensMonitors));
    }

    #[test]
    fn test_id_must_be_standalone_token() {
        // "10" and "x3y" must not count as ids 1 or 3
        assert!(parse_arbiter_response("around 10 percent sure of nothing").is_err());
        assert!(parse_arbiter_response("model x3y says hi").is_err());
        // "(2)" does count
        let response = parse_arbiter_response("best fit (2)").unwrap();
        assert_eq!(response.category, Some(WeeeCategory::ScreensMonitors));
    }

    #[test]
    fn test_decline_is_a_valid_answer() {
        let response = parse_arbiter_response("I cannot decide between lamps and screens").unwrap();
        assert_eq!(response.category, None);
    }

    #[test]
    fn test_garbage_is_invalid_response() {
        let err = parse_arbiter_response("lorem ipsum dolor").unwrap_err();
        assert!(matches!(err, ArbiterError::InvalidResponse(_)));
        assert!(parse_arbiter_response("   ").is_err());
    }

    #[test]
    fn test_first_category_in_id_order_wins() {
        let response = parse_arbiter_response("either lamps or small equipment").unwrap();
        assert_eq!(response.category, Some(WeeeCategory::Lamps));
    }
}
