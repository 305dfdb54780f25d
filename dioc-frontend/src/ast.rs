//! The restricted syntax tree the Flattener consumes (§4.1).
//!
//! Node kinds are a direct transcription of the ones §4.1 enumerates.
//! `dioc-frontend` owns the textual surface syntax that produces trees of
//! this shape (§1); a real C front-end would produce the same tree shape
//! from actual C source.

use dioc_ir::BinOp;
use dioc_utils::Id;

/// An expression in the surface syntax. Distinct from [`dioc_ir::Expr`]:
/// this tree still has `Call`, which the Flattener resolves into a fresh
/// `Var` (§4.1) and which `dioc_ir::Expr` has no variant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Constant(i64),
    Var(Id),
    Call(Id),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    pub fn bin(op: BinOp, l: Expr, r: Expr) -> Self {
        Expr::Bin(op, Box::new(l), Box::new(r))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    AddAssign,
    SubAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Inc,
    Dec,
}

/// A statement in the loop body (§4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    Declare {
        name: Id,
        init: Option<Expr>,
    },
    Assign {
        target: Id,
        op: AssignOp,
        value: Expr,
    },
    Update {
        target: Id,
        op: UpdateOp,
    },
    /// A node kind the surface syntax can name but the Flattener does not
    /// understand, so that the §7 `unsupported-construct` path has a
    /// concrete, reachable input to exercise.
    Opaque(String),
}

/// A parsed program: the declared state variables and the loop body (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub state_vars: Vec<Id>,
    pub body: Vec<Stmt>,
}

/// Reduce a character literal to its code point (§3 `Const(i)`).
pub fn char_code_point(c: char) -> i64 {
    c as i64
}
