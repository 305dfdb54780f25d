//! Shared data model for the `dioc` pipeline (§3): the expression tree, the
//! F-dictionary and CSE alias table, the assignment list and schedule, and
//! the renderers that turn them into the machine equation file and the
//! human report (§6).

mod assign;
mod expr;
mod fdict;
mod poly;
pub mod printer;

pub use assign::{Assignment, AssignmentList, Schedule};
pub use expr::{BinOp, Expr};
pub use fdict::{
    alias_name, next_tick_name, opaque_input_name, parse_next_tick_name, witness_name,
    AliasTable, FDict,
};
pub use poly::{PolyEquation, PolySystem};
