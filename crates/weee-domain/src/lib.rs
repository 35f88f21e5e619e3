//! Pure decision logic: keyword rules, category mapping, score
//! aggregation and final result assembly. No I/O lives here.

pub mod rules;
pub mod service;

pub use service::aggregator::{aggregate, AggregationOutcome, AmbiguityPolicy};
pub use service::assembler::{assemble, ArbitrationOutcome};
pub use service::mapper::{is_non_eee, map_candidates, map_label, LabelMapping, MappedCandidate};
