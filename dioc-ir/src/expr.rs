//! The tagged expression tree shared by every pass in the pipeline (§3).

use dioc_utils::Id;

/// A binary operator appearing in a not-yet-reduced [`Expr`].
///
/// After the Polynomial Reducer runs, only [`BinOp::Add`], [`BinOp::Sub`]
/// and [`BinOp::Mul`] ever appear on an emitted assignment's RHS (§8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// The token this operator renders as in the machine equation file
    /// (§6): `OP(arg, arg)`.
    pub fn token(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn from_token(tok: &str) -> Option<Self> {
        Some(match tok {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "&&" => BinOp::And,
            "||" => BinOp::Or,
            _ => return None,
        })
    }

    /// True for the three operators the Polynomial Reducer leaves untouched
    /// (§8: "no comparison or boolean operator appears on any RHS").
    pub fn is_pure_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul)
    }
}

/// A node of the expression tree (§3).
///
/// Built once per compilation and never mutated after it leaves its
/// producing pass. Structural equality and hashing are derived directly, so
/// two trees compare equal iff every corresponding node and leaf compares
/// equal -- exactly the "Merkle-style, built bottom-up" equivalence CSE
/// relies on: a `HashMap<Expr, _>` hashes leaves first and combines child
/// hashes going up the tree, and any hash collision is still resolved
/// correctly by the derived `Eq` on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Const(i64),
    Var(Id),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var<S: Into<Id>>(name: S) -> Self {
        Expr::Var(name.into())
    }

    pub fn bin(op: BinOp, l: Expr, r: Expr) -> Self {
        Expr::Bin(op, Box::new(l), Box::new(r))
    }

    pub fn neg(e: Expr) -> Self {
        Expr::Neg(Box::new(e))
    }

    pub fn if_(c: Expr, t: Expr, f: Expr) -> Self {
        Expr::If(Box::new(c), Box::new(t), Box::new(f))
    }

    /// Immediate children, left to right. Used by CSE's subtree walk and by
    /// the size-estimation sink.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Const(_) | Expr::Var(_) => vec![],
            Expr::Bin(_, l, r) => vec![l, r],
            Expr::Neg(e) => vec![e],
            Expr::If(c, t, f) => vec![c, t, f],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Expr::Const(_) | Expr::Var(_))
    }

    /// Restricted to `{Const, Var, +, -, *, Neg}` (§3 Assignment list).
    pub fn is_pure_arithmetic(&self) -> bool {
        match self {
            Expr::Const(_) | Expr::Var(_) => true,
            Expr::Neg(e) => e.is_pure_arithmetic(),
            Expr::Bin(op, l, r) => {
                op.is_pure_arithmetic()
                    && l.is_pure_arithmetic()
                    && r.is_pure_arithmetic()
            }
            Expr::If(..) => false,
        }
    }

    /// Recursively replace every occurrence of `from` with `to`. Used by
    /// CSE to rewrite extracted subtrees in place (bottom-up, so nested
    /// extractions compose) and by the Flattener to resolve auxiliary
    /// bindings at finalization.
    pub fn replace(&self, from: &Expr, to: &Expr) -> Expr {
        if self == from {
            return to.clone();
        }
        match self {
            Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Bin(op, l, r) => {
                Expr::bin(*op, l.replace(from, to), r.replace(from, to))
            }
            Expr::Neg(e) => Expr::neg(e.replace(from, to)),
            Expr::If(c, t, f) => Expr::if_(
                c.replace(from, to),
                t.replace(from, to),
                f.replace(from, to),
            ),
        }
    }

    /// Substitute `Var(name)` with `to` wherever it occurs. Used by the
    /// Flattener to resolve auxiliary variable chains (§4.1 Finalization).
    pub fn substitute_var(&self, name: Id, to: &Expr) -> Expr {
        match self {
            Expr::Var(n) if *n == name => to.clone(),
            Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Bin(op, l, r) => Expr::bin(
                *op,
                l.substitute_var(name, to),
                r.substitute_var(name, to),
            ),
            Expr::Neg(e) => Expr::neg(e.substitute_var(name, to)),
            Expr::If(c, t, f) => Expr::if_(
                c.substitute_var(name, to),
                t.substitute_var(name, to),
                f.substitute_var(name, to),
            ),
        }
    }

    /// Every free `Var` name referenced transitively by this expression.
    pub fn free_vars(&self, out: &mut std::collections::BTreeSet<Id>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(n) => {
                out.insert(*n);
            }
            Expr::Bin(_, l, r) => {
                l.free_vars(out);
                r.free_vars(out);
            }
            Expr::Neg(e) => e.free_vars(out),
            Expr::If(c, t, f) => {
                c.free_vars(out);
                t.free_vars(out);
                f.free_vars(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_identity() {
        let a = Expr::bin(BinOp::Add, Expr::var("x"), Expr::Const(1));
        let b = Expr::bin(BinOp::Add, Expr::var("x"), Expr::Const(1));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_structure_is_unequal() {
        let a = Expr::bin(BinOp::Add, Expr::var("x"), Expr::Const(1));
        let b = Expr::bin(BinOp::Add, Expr::var("x"), Expr::Const(2));
        assert_ne!(a, b);
    }

    #[test]
    fn replace_rewrites_every_occurrence() {
        let sub = Expr::bin(BinOp::Add, Expr::var("b"), Expr::var("d"));
        let tree = Expr::bin(BinOp::Mul, sub.clone(), sub.clone());
        let rewritten = tree.replace(&sub, &Expr::var("C_0"));
        assert_eq!(
            rewritten,
            Expr::bin(BinOp::Mul, Expr::var("C_0"), Expr::var("C_0"))
        );
    }

    #[test]
    fn pure_arithmetic_rejects_if_and_comparisons() {
        let arith = Expr::bin(BinOp::Add, Expr::var("x"), Expr::Const(1));
        assert!(arith.is_pure_arithmetic());
        let cmp = Expr::bin(BinOp::Eq, Expr::var("x"), Expr::Const(1));
        assert!(!cmp.is_pure_arithmetic());
        let ite = Expr::if_(cmp, Expr::Const(1), Expr::Const(0));
        assert!(!ite.is_pure_arithmetic());
    }
}
