//! Detection Normalizer: converts the raw vision-detector payload into a
//! uniform candidate list.
//!
//! The detector payload is loosely schema'd JSON: an `objects` array
//! (name/label, confidence, optional bounding box, optional per-object
//! caption), an image-level `tags` array, or both, plus an optional
//! whole-image caption and image dimensions. Entry-level defects are
//! dropped with a note; a payload carrying neither `objects` nor `tags`
//! is malformed and fails the request.

use serde::Deserialize;
use serde_json::Value;
use weee_types::{BoundingBox, DetectionCandidate, Error, Result};

/// Two same-label regions overlapping at least this much are duplicates.
const DEDUP_IOU: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    schema: Option<String>,
    #[serde(default, alias = "caption")]
    image_caption: Option<String>,
    #[serde(default, alias = "imageWidth", alias = "width")]
    image_width: Option<u32>,
    #[serde(default, alias = "imageHeight", alias = "height")]
    image_height: Option<u32>,
    #[serde(default)]
    objects: Option<Vec<RawObject>>,
    #[serde(default)]
    tags: Option<Vec<RawTag>>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(default, alias = "label")]
    name: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "boundingBox", alias = "bounding_box")]
    bbox: Option<RawBox>,
    #[serde(default)]
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBox {
    x: i64,
    y: i64,
    #[serde(alias = "width")]
    w: i64,
    #[serde(alias = "height")]
    h: i64,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(default, alias = "label")]
    name: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl RawBox {
    fn to_bounding_box(&self) -> Option<BoundingBox> {
        if self.w <= 0 || self.h <= 0 {
            return None;
        }
        Some(BoundingBox {
            x: self.x.max(0) as u32,
            y: self.y.max(0) as u32,
            w: self.w as u32,
            h: self.h as u32,
        })
    }
}

/// Uniform normalizer output: deduplicated candidates sorted descending
/// by confidence, plus the context the engine and the arbiter care about.
#[derive(Debug, Clone, Default)]
pub struct NormalizedDetections {
    pub candidates: Vec<DetectionCandidate>,
    pub image_caption: Option<String>,
    pub image_size: Option<(u32, u32)>,
    /// Per-object captions, in input order
    pub captions: Vec<String>,
    /// Normalization notes (dropped entries, dedup), fed into the rationale
    pub notes: Vec<String>,
}

impl NormalizedDetections {
    /// Labels + captions + image caption joined into one text blob, the
    /// way the non-EEE filter consumes it.
    pub fn combined_text(&self) -> String {
        let mut parts: Vec<&str> = self.candidates.iter().map(|c| c.label.as_str()).collect();
        parts.extend(self.captions.iter().map(|c| c.as_str()));
        if let Some(ref caption) = self.image_caption {
            parts.push(caption);
        }
        parts.join(" | ")
    }
}

fn validate_entry(
    kind: &str,
    index: usize,
    label: Option<String>,
    confidence: Option<f64>,
    notes: &mut Vec<String>,
) -> Option<(String, f64)> {
    let label = match label {
        Some(l) if !l.trim().is_empty() => l.trim().to_string(),
        _ => {
            notes.push(format!("dropped {} #{}: missing label", kind, index));
            return None;
        }
    };
    let confidence = match confidence {
        Some(c) if c.is_finite() && (0.0..=1.0).contains(&c) => c,
        Some(c) => {
            notes.push(format!(
                "dropped {} #{} ('{}'): confidence {} outside [0, 1]",
                kind, index, label, c
            ));
            return None;
        }
        None => {
            notes.push(format!(
                "dropped {} #{} ('{}'): missing confidence",
                kind, index, label
            ));
            return None;
        }
    };
    Some((label, confidence))
}

fn is_duplicate(a: &DetectionCandidate, b: &DetectionCandidate) -> bool {
    if !a.label.eq_ignore_ascii_case(&b.label) {
        return false;
    }
    match (&a.region, &b.region) {
        (Some(ra), Some(rb)) => ra.iou(rb) > DEDUP_IOU,
        (None, None) => true,
        _ => false,
    }
}

/// Normalize a raw detector payload.
///
/// Fails with `MalformedDetectorOutput` when the payload is not a JSON
/// object, does not decode, or carries neither `objects` nor `tags`. An
/// empty candidate list is a valid result (no objects detected) and is
/// distinct from malformed input.
pub fn normalize(payload: &Value) -> Result<NormalizedDetections> {
    if !payload.is_object() {
        return Err(Error::MalformedDetectorOutput(
            "detector payload is not a JSON object".into(),
        ));
    }

    let raw: RawPayload = serde_json::from_value(payload.clone())
        .map_err(|e| Error::MalformedDetectorOutput(format!("undecodable payload: {}", e)))?;

    if let Some(ref schema) = raw.schema {
        if schema != "v1" {
            return Err(Error::MalformedDetectorOutput(format!(
                "unsupported detector schema '{}'",
                schema
            )));
        }
    }

    if raw.objects.is_none() && raw.tags.is_none() {
        return Err(Error::MalformedDetectorOutput(
            "payload carries neither 'objects' nor 'tags'".into(),
        ));
    }

    let mut notes = Vec::new();
    let mut captions = Vec::new();
    let mut candidates: Vec<DetectionCandidate> = Vec::new();

    for (index, object) in raw.objects.unwrap_or_default().into_iter().enumerate() {
        if let Some(caption) = object.caption {
            if !caption.trim().is_empty() {
                captions.push(caption.trim().to_string());
            }
        }
        let Some((label, confidence)) =
            validate_entry("object", index, object.name, object.confidence, &mut notes)
        else {
            continue;
        };
        let mut candidate = DetectionCandidate::new(label, confidence);
        if let Some(region) = object.bbox.as_ref().and_then(RawBox::to_bounding_box) {
            candidate = candidate.with_region(region);
        }
        candidates.push(candidate);
    }

    for (index, tag) in raw.tags.unwrap_or_default().into_iter().enumerate() {
        let Some((label, confidence)) =
            validate_entry("tag", index, tag.name, tag.confidence, &mut notes)
        else {
            continue;
        };
        candidates.push(DetectionCandidate::new(label, confidence));
    }

    // Dedup by (label, roughly-equal region), keeping the higher confidence
    let mut deduped: Vec<DetectionCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match deduped.iter_mut().find(|kept| is_duplicate(kept, &candidate)) {
            Some(kept) => {
                notes.push(format!(
                    "deduplicated '{}' (kept confidence {:.2})",
                    candidate.label,
                    kept.confidence.max(candidate.confidence)
                ));
                if candidate.confidence > kept.confidence {
                    *kept = candidate;
                }
            }
            None => deduped.push(candidate),
        }
    }

    deduped.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let image_size = match (raw.image_width, raw.image_height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    };

    Ok(NormalizedDetections {
        candidates: deduped,
        image_caption: raw.image_caption,
        image_size,
        captions,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_objects_schema_normalizes_and_sorts() {
        let payload = json!({
            "image_caption": "electronics on a table",
            "image_width": 800,
            "image_height": 600,
            "objects": [
                {"name": "cable", "confidence": 0.4, "bbox": {"x": 0, "y": 0, "w": 100, "h": 50}},
                {"name": "smartphone", "confidence": 0.9, "bbox": {"x": 200, "y": 100, "w": 120, "h": 240}}
            ]
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.candidates.len(), 2);
        assert_eq!(normalized.candidates[0].label, "smartphone");
        assert_eq!(normalized.candidates[1].label, "cable");
        assert_eq!(normalized.image_size, Some((800, 600)));
        assert_eq!(normalized.image_caption.as_deref(), Some("electronics on a table"));
        assert!(normalized.notes.is_empty());
    }

    #[test]
    fn test_tags_schema_is_accepted() {
        let payload = json!({
            "tags": [
                {"name": "lamp", "confidence": 0.7},
                {"name": "monitor", "confidence": 0.8}
            ]
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.candidates[0].label, "monitor");
        assert!(normalized.candidates[0].region.is_none());
    }

    #[test]
    fn test_label_alias_is_accepted() {
        let payload = json!({
            "objects": [{"label": "fridge", "confidence": 0.6}]
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.candidates[0].label, "fridge");
    }

    #[test]
    fn test_empty_objects_is_valid_no_detection() {
        let normalized = normalize(&json!({"objects": []})).unwrap();
        assert!(normalized.candidates.is_empty());
        assert!(normalized.notes.is_empty());
    }

    #[test]
    fn test_payload_without_objects_or_tags_is_malformed() {
        let err = normalize(&json!({"image_caption": "nothing"})).unwrap_err();
        assert!(matches!(err, Error::MalformedDetectorOutput(_)));
    }

    #[test]
    fn test_non_object_payload_is_malformed() {
        assert!(matches!(
            normalize(&json!([1, 2, 3])),
            Err(Error::MalformedDetectorOutput(_))
        ));
        assert!(matches!(
            normalize(&json!("text")),
            Err(Error::MalformedDetectorOutput(_))
        ));
    }

    #[test]
    fn test_unsupported_schema_version_is_malformed() {
        let err = normalize(&json!({"schema": "v9", "objects": []})).unwrap_err();
        assert!(matches!(err, Error::MalformedDetectorOutput(_)));
    }

    #[test]
    fn test_defective_entries_drop_with_notes() {
        let payload = json!({
            "objects": [
                {"confidence": 0.9},
                {"name": "lamp"},
                {"name": "monitor", "confidence": 1.7},
                {"name": "cable", "confidence": 0.4}
            ]
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.candidates.len(), 1);
        assert_eq!(normalized.candidates[0].label, "cable");
        assert_eq!(normalized.notes.len(), 3);
        assert!(normalized.notes[0].contains("missing label"));
        assert!(normalized.notes[1].contains("missing confidence"));
        assert!(normalized.notes[2].contains("outside [0, 1]"));
    }

    #[test]
    fn test_all_entries_defective_degrades_to_empty() {
        // Distinct from malformed: the payload decodes, every entry is bad.
        let payload = json!({
            "objects": [{"confidence": 0.9}, {"name": "lamp", "confidence": -0.1}]
        });
        let normalized = normalize(&payload).unwrap();
        assert!(normalized.candidates.is_empty());
        assert_eq!(normalized.notes.len(), 2);
    }

    #[test]
    fn test_overlapping_same_label_detections_dedup() {
        let payload = json!({
            "objects": [
                {"name": "monitor", "confidence": 0.6, "bbox": {"x": 0, "y": 0, "w": 100, "h": 100}},
                {"name": "Monitor", "confidence": 0.8, "bbox": {"x": 5, "y": 5, "w": 100, "h": 100}},
                {"name": "monitor", "confidence": 0.5, "bbox": {"x": 400, "y": 400, "w": 80, "h": 80}}
            ]
        });
        let normalized = normalize(&payload).unwrap();
        // First two overlap heavily -> one survivor with the higher
        // confidence; the third is a distinct region.
        assert_eq!(normalized.candidates.len(), 2);
        assert_eq!(normalized.candidates[0].confidence, 0.8);
        assert!(normalized.notes.iter().any(|n| n.contains("deduplicated")));
    }

    #[test]
    fn test_duplicate_tags_without_regions_dedup() {
        let payload = json!({
            "tags": [
                {"name": "lamp", "confidence": 0.5},
                {"name": "lamp", "confidence": 0.7}
            ]
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.candidates.len(), 1);
        assert_eq!(normalized.candidates[0].confidence, 0.7);
    }

    #[test]
    fn test_combined_text_joins_labels_and_captions() {
        let payload = json!({
            "image_caption": "a dog on the beach",
            "objects": [
                {"name": "dog", "confidence": 0.9, "caption": "a brown dog"}
            ]
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.combined_text(), "dog | a brown dog | a dog on the beach");
    }
}
