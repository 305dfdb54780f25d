//! Assembles the CSE'd F-dictionary and alias table into the native-op
//! assignment list the Planner and Evaluator consume (§4.4, §6).
//!
//! Not one of the four core passes (§2): it is the same bridging step the
//! source's `EquationExporter.export_optimized_for_interpreter` performs,
//! turning `(F', aliases)` into one ordered `lhs := rhs` list that still
//! carries every original operator untouched -- comparisons, booleans,
//! `if`, `neg`. The Polynomial Reducer (`passes::polyreduce`) lowers a
//! *separate* copy of this same data for the report; this list is the one
//! that actually gets scheduled and evaluated.

use dioc_ir::{next_tick_name, AliasTable, AssignmentList, FDict};
use dioc_utils::Id;

/// Aliases first, in discovery order, then state variables in sorted name
/// order -- matching the source's `sorted_defs` (numeric on `C_n`) then
/// `sorted(self.optimized_f.keys())`.
pub fn assemble(f: &FDict, aliases: &AliasTable) -> AssignmentList {
    let mut list = AssignmentList::new();
    for (name, def) in aliases.iter() {
        list.push(name, def.clone());
    }
    for v in f.sorted_vars() {
        let expr = f.get(v).cloned().unwrap_or_else(|| dioc_ir::Expr::var(v));
        list.push(Id::new(next_tick_name(v)), expr);
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioc_ir::{BinOp, Expr};

    #[test]
    fn identity_step_matches_scenario_1() {
        let mut f = FDict::new();
        f.insert(Id::new("x"), Expr::var(Id::new("x")));
        let list = assemble(&f, &AliasTable::new());
        assert_eq!(list.len(), 1);
        let a = list.iter().next().unwrap();
        assert_eq!(a.lhs, Id::new("x[t+1]"));
        assert_eq!(a.rhs, Expr::var(Id::new("x")));
    }

    #[test]
    fn aliases_precede_state_equations() {
        let mut aliases = AliasTable::new();
        aliases.push(Expr::bin(BinOp::Add, Expr::Const(1), Expr::Const(2)));
        let mut f = FDict::new();
        f.insert(Id::new("x"), Expr::var(Id::new("C_0")));
        let list = assemble(&f, &aliases);
        let names: Vec<String> = list.iter().map(|a| a.lhs.to_string()).collect();
        assert_eq!(names, vec!["C_0".to_string(), "x[t+1]".to_string()]);
    }
}
