//! Vision-boundary adapters: normalization of raw detector payloads and
//! the arbitration oracle adapter.

pub mod arbiter;
pub mod normalizer;

pub use arbiter::{build_arbitration_prompt, parse_arbiter_response, Arbiter, CommandArbiter};
pub use normalizer::{normalize, NormalizedDetections};
