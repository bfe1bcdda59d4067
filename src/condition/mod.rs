//! Condition model, coercion and evaluation module
//!
//! This module holds the condition tree, the typed operator semantics and
//! the evaluator that checks a tree against a flat record.

mod ast;
pub mod cache;
pub mod coerce;
mod evaluator;
mod operator;
pub mod parser;
mod path;
mod record;
mod validator;
mod value;


pub use ast::*;
pub use cache::*;
pub use evaluator::*;
pub use operator::*;
pub use path::*;
pub use record::*;
pub use validator::*;
pub use value::*;
