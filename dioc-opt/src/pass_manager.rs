//! Orchestration for the four core passes (§2).
//!
//! The teacher's own `PassManager` registers interchangeable transforms
//! that all share one signature (`&mut ir::Context -> CalyxResult<()>`).
//! Nothing here is interchangeable: the Flattener, CSE Extractor,
//! Polynomial Reducer and Planner each consume and produce a different
//! type, always in the same fixed order (§2 data flow). What's kept from
//! the teacher's pattern is naming every pass and logging its entry, exit
//! and elapsed time around it.

use std::time::Instant;

/// A pass identifies itself for logging and for the `dioc --until` flag.
pub trait Named {
    fn name() -> &'static str;
    fn description() -> &'static str;
}

/// The fixed pipeline order. Not user-configurable -- the four passes are
/// tightly coupled and only ever run in this sequence -- but named so
/// `dioc --list-passes` and `--until` have something to report against.
pub struct PassManager;

impl PassManager {
    pub const ORDER: [&'static str; 4] = ["flatten", "cse", "polyreduce", "plan"];

    pub fn help() -> String {
        Self::ORDER
            .iter()
            .map(|p| format!("- {p}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_known(name: &str) -> bool {
        Self::ORDER.contains(&name)
    }
}

/// Run `f`, logging `name`'s entry, exit and elapsed time (§1 "logging at
/// pass boundaries").
pub fn run_timed<T>(name: &str, f: impl FnOnce() -> T) -> T {
    log::debug!("[{name}] starting");
    let start = Instant::now();
    let out = f();
    log::debug!("[{name}] finished in {:?}", start.elapsed());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_known_names() {
        for name in PassManager::ORDER {
            assert!(PassManager::is_known(name));
        }
        assert!(!PassManager::is_known("bogus"));
    }
}
