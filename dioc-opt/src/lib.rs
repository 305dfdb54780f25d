//! The `dioc` compilation pipeline (§2, §4): runs the Flattener, the
//! Common-Subexpression Extractor, the machine-file assembler, the
//! Polynomial Reducer and the Equation Planner in sequence and bundles
//! their outputs for the root binary's renderers.

pub mod analysis;
pub mod pass_manager;
pub mod passes;

pub use pass_manager::{Named, PassManager};

use std::collections::BTreeSet;

use dioc_frontend::Program;
use dioc_ir::{AliasTable, AssignmentList, FDict, PolySystem, Schedule};
use dioc_utils::{DiocResult, Id};

use pass_manager::run_timed;
use passes::{assemble, cse, flatten, plan, polyreduce};

/// Everything the report and machine-file renderers (§6) and the §5 size
/// safeguard need, bundled from a single pipeline run.
pub struct CompileOutput {
    pub state_vars: Vec<Id>,
    pub input_vars: Vec<Id>,
    pub unoptimized: FDict,
    pub aliases: AliasTable,
    pub optimized: FDict,
    pub machine_assignments: AssignmentList,
    pub poly_system: PolySystem,
    pub schedule: Schedule,
    pub witness_count: usize,
}

/// Run the full pipeline (§2): Flatten -> CSE -> assemble -> Polynomial
/// Reduce -> Plan. The first four stages never fail on a well-formed
/// [`Program`]; only the Planner can, on a genuine dependency cycle (§7
/// `cycle`), and the Polynomial Reducer, on a `/` it cannot lower (§7
/// `internal`).
pub fn compile(program: &Program) -> DiocResult<CompileOutput> {
    let flattened = run_timed("flatten", || flatten::flatten(program));

    let cse_out = run_timed("cse", || cse::cse(&flattened.f));

    let machine_assignments =
        run_timed("assemble", || assemble::assemble(&cse_out.f, &cse_out.aliases));

    let poly_out = run_timed("polyreduce", || polyreduce::reduce(&cse_out.f, &cse_out.aliases))?;

    let schedule = run_timed("plan", || plan::plan(&machine_assignments))?;

    let state_vars: Vec<Id> = program.state_vars.iter().copied().collect();
    let input_vars: Vec<Id> = {
        let set: BTreeSet<Id> = flattened.input_vars;
        set.into_iter().collect()
    };

    Ok(CompileOutput {
        state_vars,
        input_vars,
        unoptimized: flattened.f,
        aliases: cse_out.aliases,
        optimized: cse_out.f,
        machine_assignments,
        poly_system: poly_out.system,
        schedule,
        witness_count: poly_out.witness_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioc_frontend::DiocParser;

    #[test]
    fn unconditional_counter_compiles_end_to_end() {
        let prog =
            DiocParser::parse_str("(program (state x) (loop (block (assign = x (+ x 1)))))")
                .unwrap();
        let out = compile(&prog).unwrap();
        assert_eq!(out.state_vars, vec![Id::new("x")]);
        assert_eq!(out.schedule.len(), out.machine_assignments.len());
        assert_eq!(out.poly_system.len(), 1);
        assert_eq!(out.witness_count, 0);
    }

    #[test]
    fn conditional_clamp_surfaces_an_input_variable() {
        let src = r#"(program
            (state p)
            (loop (block
                (if (&& (== k 'w') (> p 1))
                    (block (update p --))))))"#;
        let prog = DiocParser::parse_str(src).unwrap();
        let out = compile(&prog).unwrap();
        assert!(out.input_vars.contains(&Id::new("k")));
        assert!(out.witness_count > 0);
    }

    #[test]
    fn cyclic_program_is_rejected_by_the_planner() {
        // A hand-built two-state cycle: neither flatten nor the surface
        // grammar can produce one directly (each state var's Flattener
        // output only ever references *input* names or other state's
        // *current* values at the point of evaluation), so this exercises
        // the Planner's `cycle` detection against the assembled list
        // directly rather than through a source program.
        let mut list = AssignmentList::new();
        list.push(Id::new("a"), dioc_ir::Expr::var(Id::new("b")));
        list.push(Id::new("b"), dioc_ir::Expr::var(Id::new("a")));
        assert!(plan::plan(&list).is_err());
    }
}
