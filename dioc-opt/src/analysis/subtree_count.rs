//! Structural subtree frequency counting, shared by CSE (§4.2 step 1).

use std::collections::HashMap;

use dioc_ir::{Expr, FDict};

/// The result of a full walk over an [`FDict`]: how many times each
/// distinct non-leaf subtree occurs, and the order each was first
/// encountered in.
pub struct SubtreeCounts {
    pub counts: HashMap<Expr, usize>,
    pub first_seen: HashMap<Expr, usize>,
}

/// Count every non-leaf subtree across `f`'s entries, visited in
/// lexicographic state-variable order and depth-first within each entry
/// (§4.2 step 3: "deterministic on a depth-first traversal over F visited
/// by sorted key order"). Leaves (`Const`, `Var`) are never counted --
/// matching the source, which only tracks tuple-shaped nodes.
pub fn count(f: &FDict) -> SubtreeCounts {
    let mut counts = HashMap::new();
    let mut first_seen = HashMap::new();
    let mut seq = 0usize;
    for v in f.sorted_vars() {
        visit(f.get(v).unwrap(), &mut counts, &mut first_seen, &mut seq);
    }
    SubtreeCounts { counts, first_seen }
}

fn visit(
    e: &Expr,
    counts: &mut HashMap<Expr, usize>,
    first_seen: &mut HashMap<Expr, usize>,
    seq: &mut usize,
) {
    if e.is_leaf() {
        return;
    }
    *counts.entry(e.clone()).or_insert(0) += 1;
    first_seen.entry(e.clone()).or_insert_with(|| {
        let s = *seq;
        *seq += 1;
        s
    });
    for child in e.children() {
        visit(child, counts, first_seen, seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioc_ir::BinOp;
    use dioc_utils::Id;

    #[test]
    fn repeated_subtree_is_counted_across_entries() {
        let sub = Expr::bin(BinOp::Add, Expr::var(Id::new("b")), Expr::var(Id::new("d")));
        let mut f = FDict::new();
        f.insert(Id::new("x"), sub.clone());
        f.insert(Id::new("y"), sub.clone());
        let result = count(&f);
        assert_eq!(result.counts[&sub], 2);
    }

    #[test]
    fn leaves_are_never_counted() {
        let mut f = FDict::new();
        f.insert(Id::new("x"), Expr::var(Id::new("x")));
        let result = count(&f);
        assert!(result.counts.is_empty());
    }
}
