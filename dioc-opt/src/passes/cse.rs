//! The Common-Subexpression Extractor (§4.2).

use std::collections::HashMap;

use dioc_ir::printer::expr_to_native_string;
use dioc_ir::{AliasTable, Expr, FDict};
use dioc_utils::Id;

use crate::analysis::subtree_count;
use crate::pass_manager::Named;

pub struct Cse;

impl Named for Cse {
    fn name() -> &'static str {
        "cse"
    }
    fn description() -> &'static str {
        "extract repeated subtrees into named aliases"
    }
}

/// Complexity threshold from §4.2 step 2: a conservative char count of the
/// machine-file rendering of a subtree.
const COMPLEXITY_THRESHOLD: usize = 10;

pub struct CseOutput {
    pub f: FDict,
    pub aliases: AliasTable,
}

pub fn cse(f: &FDict) -> CseOutput {
    let counted = subtree_count::count(f);

    let mut candidates: Vec<Expr> = counted
        .counts
        .into_iter()
        .filter(|(e, count)| *count >= 2 && expr_to_native_string(e).len() > COMPLEXITY_THRESHOLD)
        .map(|(e, _)| e)
        .collect();
    candidates.sort_by_key(|e| counted.first_seen[e]);

    // Phase 1: assign every candidate its alias name up front, with a
    // placeholder body -- mirrors the source building the whole `sub_map`
    // before any rewriting starts, so a candidate nested inside another
    // candidate's body can still resolve to its alias regardless of which
    // one was discovered first (§4.2 step 4).
    let mut aliases = AliasTable::new();
    let mut name_of: HashMap<Expr, Id> = HashMap::new();
    for cand in &candidates {
        let name = aliases.push(cand.clone());
        name_of.insert(cand.clone(), name);
    }

    // Phase 2: rewrite. Each alias's own body only has its *children*
    // rewritten -- not its own top-level shape, which would just replace
    // it with itself.
    for (n, cand) in candidates.iter().enumerate() {
        aliases.set(n, rewrite_children(cand, &name_of));
    }

    let optimized = f.map_exprs(|e| rewrite_node(e, &name_of));

    CseOutput {
        f: optimized,
        aliases,
    }
}

fn rewrite_node(e: &Expr, name_of: &HashMap<Expr, Id>) -> Expr {
    if let Some(&name) = name_of.get(e) {
        return Expr::var(name);
    }
    rewrite_children(e, name_of)
}

fn rewrite_children(e: &Expr, name_of: &HashMap<Expr, Id>) -> Expr {
    match e {
        Expr::Const(_) | Expr::Var(_) => e.clone(),
        Expr::Bin(op, l, r) => Expr::bin(*op, rewrite_node(l, name_of), rewrite_node(r, name_of)),
        Expr::Neg(x) => Expr::neg(rewrite_node(x, name_of)),
        Expr::If(c, t, f) => Expr::if_(
            rewrite_node(c, name_of),
            rewrite_node(t, name_of),
            rewrite_node(f, name_of),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioc_ir::BinOp;

    fn long_sub() -> Expr {
        // char count of native rendering exceeds the threshold:
        // "+(beta, gamma)" is 14 chars.
        Expr::bin(BinOp::Add, Expr::var(Id::new("beta")), Expr::var(Id::new("gamma")))
    }

    #[test]
    fn repeated_subtree_becomes_single_alias_matching_scenario_4() {
        let sub = long_sub();
        let mut f = FDict::new();
        f.insert(Id::new("b"), sub.clone());
        f.insert(Id::new("d"), sub.clone());
        let out = cse(&f);
        assert_eq!(out.aliases.len(), 1);
        assert_eq!(out.f.get(Id::new("b")), Some(&Expr::var(Id::new("C_0"))));
        assert_eq!(out.f.get(Id::new("d")), Some(&Expr::var(Id::new("C_0"))));
    }

    #[test]
    fn short_subtree_is_not_extracted() {
        let sub = Expr::bin(BinOp::Add, Expr::var(Id::new("x")), Expr::Const(1));
        let mut f = FDict::new();
        f.insert(Id::new("a"), sub.clone());
        f.insert(Id::new("b"), sub);
        let out = cse(&f);
        assert!(out.aliases.is_empty());
    }

    #[test]
    fn alias_numbering_is_stable_across_runs() {
        let sub = long_sub();
        let mut f = FDict::new();
        f.insert(Id::new("b"), sub.clone());
        f.insert(Id::new("d"), sub);
        let first = cse(&f);
        let second = cse(&f);
        assert_eq!(first.aliases.len(), second.aliases.len());
        assert_eq!(first.f.get(Id::new("b")), second.f.get(Id::new("b")));
    }
}
