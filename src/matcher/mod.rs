//! Policy matching module

pub mod selector;

pub use selector::*;
