#![warn(missing_docs)]
//! Benchmark suites
//!
//! Each suite is a flat list of groups. A group builds its own fixture and
//! times a naive variant against one or more optimized variants. The payload
//! functions are public and take their sizes as parameters so they can be
//! exercised on small inputs.

pub mod capabilities;
pub mod data;
pub mod systems;
pub mod vision;

pub use capabilities::{
    DEFAULT_MODEL_PATH, DETECTION_MODEL, DetectionModel, IMAGE_LIBRARY, ImageLibrary, ModelFile,
    probes,
};

use perfpair_core::Suite;

/// Suite ids in run order
pub const SUITE_IDS: [&str; 3] = ["data", "systems", "vision"];

/// Every suite, in run order
pub fn all() -> Vec<Suite> {
    vec![data::suite(), systems::suite(), vision::suite()]
}

/// Look up a suite by id
pub fn by_id(id: &str) -> Option<Suite> {
    all().into_iter().find(|s| s.id == id)
}
