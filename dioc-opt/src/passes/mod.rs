//! The four core passes (§2, §4) plus the machine-file assembly step that
//! bridges CSE's output to the Planner's input.

pub mod assemble;
pub mod cse;
pub mod flatten;
pub mod plan;
pub mod polyreduce;
