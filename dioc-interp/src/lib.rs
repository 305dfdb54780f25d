//! The standalone Evaluator (§4.5): a recursive-descent parser for the
//! machine equation file format and an interpreter that steps it, shipped
//! both as this library and as the `dioc-step` binary -- the same split
//! the teacher uses for its own `interp`/`cider` crate.

pub mod eval;
pub mod parser;

pub use eval::Evaluator;
pub use parser::{parse_machine_file, parse_rhs, Line, Rhs};
