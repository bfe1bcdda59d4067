//! Field registry module
//!
//! Describes which fields conditions may reference, their semantic types
//! and the operators each field accepts.

pub mod cache;
mod field;
mod store;

pub use cache::*;
pub use field::*;
pub use store::*;
