//! Condition editing module

mod reducer;


pub use reducer::*;
