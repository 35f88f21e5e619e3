//! Data model for the classification decision engine

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The six WEEE directive disposal categories, plus `Unknown` for labels
/// and results that match none of them.
///
/// Kept as a closed enum so category handling is exhaustiveness-checked;
/// `Unknown` never contributes to scoring and is only a terminal verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeeeCategory {
    /// 1 - Temperature exchange equipment (fridges, freezers, AC units)
    TemperatureExchange,
    /// 2 - Screens and monitors (> 100 cm²)
    ScreensMonitors,
    /// 3 - Lamps
    Lamps,
    /// 4 - Large equipment (dimension > 50 cm)
    LargeEquipment,
    /// 5 - Small equipment (dimension <= 50 cm)
    SmallEquipment,
    /// 6 - Small IT and telecommunication equipment (<= 50 cm)
    SmallIt,
    /// Not classifiable as e-waste
    Unknown,
}

impl WeeeCategory {
    /// The six proper categories, in directive order.
    pub const CATEGORIES: [WeeeCategory; 6] = [
        WeeeCategory::TemperatureExchange,
        WeeeCategory::ScreensMonitors,
        WeeeCategory::Lamps,
        WeeeCategory::LargeEquipment,
        WeeeCategory::SmallEquipment,
        WeeeCategory::SmallIt,
    ];

    /// Directive category id (1..=6), `None` for `Unknown`.
    pub fn id(self) -> Option<u8> {
        match self {
            WeeeCategory::TemperatureExchange => Some(1),
            WeeeCategory::ScreensMonitors => Some(2),
            WeeeCategory::Lamps => Some(3),
            WeeeCategory::LargeEquipment => Some(4),
            WeeeCategory::SmallEquipment => Some(5),
            WeeeCategory::SmallIt => Some(6),
            WeeeCategory::Unknown => None,
        }
    }

    /// Short machine-readable code (matches the serde representation).
    pub fn code(self) -> &'static str {
        match self {
            WeeeCategory::TemperatureExchange => "temperature_exchange",
            WeeeCategory::ScreensMonitors => "screens_monitors",
            WeeeCategory::Lamps => "lamps",
            WeeeCategory::LargeEquipment => "large_equipment",
            WeeeCategory::SmallEquipment => "small_equipment",
            WeeeCategory::SmallIt => "small_it",
            WeeeCategory::Unknown => "unknown",
        }
    }

    /// Human-readable category name.
    pub fn name(self) -> &'static str {
        match self {
            WeeeCategory::TemperatureExchange => "Temperature exchange equipment",
            WeeeCategory::ScreensMonitors => "Screens and monitors",
            WeeeCategory::Lamps => "Lamps",
            WeeeCategory::LargeEquipment => "Large equipment",
            WeeeCategory::SmallEquipment => "Small equipment",
            WeeeCategory::SmallIt => "Small IT and telecommunication equipment",
            WeeeCategory::Unknown => "Unknown",
        }
    }

    /// Preference rank used to break presentation ties deterministically.
    ///
    /// The more specific categories (1, 2, 3, 6) come before the generic
    /// size buckets (4, 5). Never used to resolve ambiguity; equal scores
    /// stay ambiguous.
    pub fn preference_rank(self) -> usize {
        match self {
            WeeeCategory::TemperatureExchange => 0,
            WeeeCategory::ScreensMonitors => 1,
            WeeeCategory::Lamps => 2,
            WeeeCategory::SmallIt => 3,
            WeeeCategory::LargeEquipment => 4,
            WeeeCategory::SmallEquipment => 5,
            WeeeCategory::Unknown => 6,
        }
    }
}

impl std::fmt::Display for WeeeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Axis-aligned bounding box in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Intersection over union with another box. 0.0 when either box or
    /// the union is degenerate.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ax2 = self.x as u64 + self.w as u64;
        let ay2 = self.y as u64 + self.h as u64;
        let bx2 = other.x as u64 + other.w as u64;
        let by2 = other.y as u64 + other.h as u64;

        let ix1 = (self.x as u64).max(other.x as u64);
        let iy1 = (self.y as u64).max(other.y as u64);
        let ix2 = ax2.min(bx2);
        let iy2 = ay2.min(by2);

        let iw = ix2.saturating_sub(ix1);
        let ih = iy2.saturating_sub(iy1);
        let inter = iw * ih;

        let union = self.area() + other.area() - inter;
        if union == 0 {
            return 0.0;
        }
        inter as f64 / union as f64
    }
}

/// A single normalized detection: one per detected object or image tag.
/// Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    pub label: String,
    /// Detector confidence, always within [0, 1]
    pub confidence: f64,
    /// Bounding box when the detection is an object; tags carry none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<BoundingBox>,
}

impl DetectionCandidate {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            region: None,
        }
    }

    pub fn with_region(mut self, region: BoundingBox) -> Self {
        self.region = Some(region);
        self
    }
}

/// Accumulated evidence for one category within a single aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: WeeeCategory,
    /// Sum of confidence x weight over contributing candidates, >= 0
    pub score: f64,
    /// Labels that contributed, in candidate order
    pub contributing_labels: Vec<String>,
}

/// How the final category was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Rule,
    LlmArbiter,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Rule => write!(f, "rule"),
            Method::LlmArbiter => write!(f, "llm_arbiter"),
        }
    }
}

/// Aggregator verdict on the rule-based signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Top category clears both the margin and the absolute floor
    Unambiguous,
    /// Competing categories too close, or top score below the floor
    Ambiguous,
    /// No category has any score
    NoSignal,
}

impl Signal {
    /// Whether this signal escalates to arbitration
    pub fn escalates(self) -> bool {
        matches!(self, Signal::Ambiguous | Signal::NoSignal)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Unambiguous => write!(f, "unambiguous"),
            Signal::Ambiguous => write!(f, "ambiguous"),
            Signal::NoSignal => write!(f, "no_signal"),
        }
    }
}

/// Terminal artifact of one classification request. Assembled once,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: WeeeCategory,
    /// Final confidence, always within [0, 1]
    pub confidence: f64,
    pub method: Method,
    /// Human-readable explanation trail: candidates considered, scores,
    /// arbitration outcome, final choice. Mandatory output.
    pub rationale: Vec<String>,
    pub raw_candidates: Vec<DetectionCandidate>,
}

/// Everything the arbitration oracle needs to pick a category.
/// Transient, scoped to one arbitration call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationRequest {
    pub request_id: Uuid,
    pub candidates: Vec<DetectionCandidate>,
    pub scores: Vec<CategoryScore>,
    /// Rule-based suggestion, if any category scored at all
    pub rule_choice: Option<WeeeCategory>,
    /// Whole-image caption from the detector, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_caption: Option<String>,
}

impl ArbitrationRequest {
    pub fn new(
        candidates: Vec<DetectionCandidate>,
        scores: Vec<CategoryScore>,
        rule_choice: Option<WeeeCategory>,
        image_caption: Option<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            candidates,
            scores,
            rule_choice,
            image_caption,
        }
    }
}

/// Parsed answer from the arbitration oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationResponse {
    /// `None` means the oracle explicitly declined to decide
    pub category: Option<WeeeCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ids_cover_directive() {
        for (i, cat) in WeeeCategory::CATEGORIES.iter().enumerate() {
            assert_eq!(cat.id(), Some(i as u8 + 1));
        }
        assert_eq!(WeeeCategory::Unknown.id(), None);
    }

    #[test]
    fn test_category_serde_code() {
        let json = serde_json::to_string(&WeeeCategory::SmallIt).unwrap();
        assert_eq!(json, "\"small_it\"");
        let back: WeeeCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WeeeCategory::SmallIt);
        assert_eq!(WeeeCategory::SmallIt.code(), "small_it");
    }

    #[test]
    fn test_iou_disjoint_and_identical() {
        let a = BoundingBox { x: 0, y: 0, w: 10, h: 10 };
        let b = BoundingBox { x: 20, y: 20, w: 10, h: 10 };
        assert_eq!(a.iou(&b), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox { x: 0, y: 0, w: 10, h: 10 };
        let b = BoundingBox { x: 5, y: 0, w: 10, h: 10 };
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_signal_escalation() {
        assert!(!Signal::Unambiguous.escalates());
        assert!(Signal::Ambiguous.escalates());
        assert!(Signal::NoSignal.escalates());
    }
}
