//! Configuration module
//!
//! Engine settings and field registry documents, deserialized from JSON.

mod engine;
mod registry;

pub use engine::*;
pub use registry::*;
