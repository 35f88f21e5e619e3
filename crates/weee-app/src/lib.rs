//! Application layer: engine configuration and the classification
//! entry point.

pub mod config;
pub mod engine;

pub use config::{Config, EngineConfig};
pub use engine::{ClassificationEngine, ClassifyOptions};
