//! Small shared utilities used across every `dioc` crate: interned
//! identifiers and the compiler-wide error type.

mod errors;
mod id;

pub use errors::{DiocResult, Error};
pub use id::Id;
