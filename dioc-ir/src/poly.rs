//! The witness-reduced pure-arithmetic system the Polynomial Reducer emits
//! for the report (§4.3, §6). Distinct from [`crate::AssignmentList`]:
//! that type's entries are always `name := expr` definitions consumed by
//! the Planner and Evaluator, but a lowering rule like `target * (1 -
//! target) = 0` is not a definition of anything -- it is a bare polynomial
//! constraint. This system is report-only and is never scheduled or
//! evaluated.

use crate::expr::Expr;

/// One constraint `polynomial = 0` (§3 Glossary "Diophantine system"). The
/// `0` is implicit; `self.0` is the polynomial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyEquation(pub Expr);

/// An ordered system of [`PolyEquation`]s (§4.3 "Ordering of outputs").
#[derive(Debug, Clone, Default)]
pub struct PolySystem {
    pub equations: Vec<PolyEquation>,
}

impl PolySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, polynomial: Expr) {
        self.equations.push(PolyEquation(polynomial));
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolyEquation> {
        self.equations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BinOp;
    use dioc_utils::Id;

    #[test]
    fn push_and_iterate_preserves_order() {
        let mut sys = PolySystem::new();
        sys.push(Expr::var(Id::new("a")));
        sys.push(Expr::bin(BinOp::Mul, Expr::var(Id::new("b")), Expr::Const(2)));
        assert_eq!(sys.len(), 2);
        let rendered: Vec<&Expr> = sys.iter().map(|eq| &eq.0).collect();
        assert_eq!(rendered[0], &Expr::var(Id::new("a")));
    }
}
