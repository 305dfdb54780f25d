//! Assignment list and schedule (§3, §4.4).

use dioc_utils::Id;

use crate::expr::Expr;

/// One `LHS = 0`-form equation, or equivalently `LHS := RHS`, depending on
/// which renderer consumes it (§6). `rhs` is always pure arithmetic once it
/// leaves the Polynomial Reducer (§8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub lhs: Id,
    pub rhs: Expr,
}

impl Assignment {
    pub fn new(lhs: Id, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }
}

/// The polynomial system as a whole: an ordered sequence of [`Assignment`]s
/// (§3). Order matters for readability but not for correctness until the
/// Planner produces a [`Schedule`].
#[derive(Debug, Clone, Default)]
pub struct AssignmentList {
    pub items: Vec<Assignment>,
}

impl AssignmentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, lhs: Id, rhs: Expr) {
        self.items.push(Assignment::new(lhs, rhs));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.items.iter()
    }
}

/// A permutation of an [`AssignmentList`] under which every entry's free
/// names are satisfied by prior entries, state inputs, or external inputs
/// (§3, §4.4).
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub order: Vec<Assignment>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.order.iter()
    }
}
