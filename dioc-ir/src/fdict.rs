//! The F-dictionary: next-state expression per declared state variable
//! (§3), and the CSE alias table that refines it.

use std::collections::BTreeMap;

use dioc_utils::Id;

use crate::expr::Expr;

/// Mapping from state-variable name to its next-state [`Expr`] (§3).
///
/// A `BTreeMap` keyed by `Id`'s symbol order is convenient for storage, but
/// every pass that must produce deterministic output iterates state
/// variables in *lexicographic name order* (§4.2 step 3, §4.3 "Ordering of
/// outputs"), via [`FDict::sorted_vars`].
#[derive(Debug, Clone, Default)]
pub struct FDict {
    entries: BTreeMap<Id, Expr>,
}

impl FDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: Id, expr: Expr) {
        self.entries.insert(var, expr);
    }

    pub fn get(&self, var: Id) -> Option<&Expr> {
        self.entries.get(&var)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State variables in lexicographic name order, for deterministic
    /// traversal (§9 "Sorted iteration for determinism").
    pub fn sorted_vars(&self) -> Vec<Id> {
        let mut names: Vec<Id> = self.entries.keys().copied().collect();
        names.sort_by_key(|id| id.resolve());
        names
    }

    pub fn iter_sorted(&self) -> impl Iterator<Item = (Id, &Expr)> {
        self.sorted_vars()
            .into_iter()
            .map(move |v| (v, self.entries.get(&v).unwrap()))
    }

    /// Replace every entry's expression via `f`, preserving keys.
    pub fn map_exprs(&self, mut f: impl FnMut(&Expr) -> Expr) -> FDict {
        let mut out = FDict::new();
        for (k, v) in &self.entries {
            out.insert(*k, f(v));
        }
        out
    }
}

/// An ordered mapping from CSE alias (`C_n`) to the [`Expr`] it names (§3).
///
/// Aliases are numbered in discovery order starting at 0, and never
/// reference themselves transitively (acyclic by construction, since alias
/// `C_n`'s definition can only reference aliases discovered strictly before
/// it -- see `dioc-opt::passes::cse`).
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Index `n` holds the definition of `C_n`.
    defs: Vec<Expr>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new alias definition, returning its freshly assigned name
    /// (`C_n` for the `n`-th alias discovered).
    pub fn push(&mut self, expr: Expr) -> Id {
        let n = self.defs.len();
        self.defs.push(expr);
        alias_name(n)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Definitions in discovery order, paired with their assigned names.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Expr)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(n, e)| (alias_name(n), e))
    }

    /// Overwrite the `n`-th alias's definition (used when CSE rewrites a
    /// later-discovered alias's body to reference an earlier one).
    pub fn set(&mut self, n: usize, expr: Expr) {
        self.defs[n] = expr;
    }

    pub fn get(&self, n: usize) -> Option<&Expr> {
        self.defs.get(n)
    }
}

/// The canonical alias name for the `n`-th subexpression discovered.
pub fn alias_name(n: usize) -> Id {
    Id::new(format!("C_{n}"))
}

/// The canonical existential witness name for the `n`-th witness allocated.
pub fn witness_name(n: usize) -> Id {
    Id::new(format!("e_{n}"))
}

/// The canonical input name synthesized for the `n`-th unsupported
/// construct the Flattener treats as opaque (§7 `unsupported-construct`).
pub fn opaque_input_name(n: usize) -> Id {
    Id::new(format!("opq_{n}"))
}

/// Render a state variable's next-tick name, `v[t+1]` (§3, §6).
pub fn next_tick_name(var: Id) -> String {
    format!("{var}[t+1]")
}

/// True iff `name` has the `v[t+1]` shape, returning the bare state name.
pub fn parse_next_tick_name(name: &str) -> Option<&str> {
    name.strip_suffix("[t+1]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_numbering_is_sequential_from_zero() {
        let mut t = AliasTable::new();
        let a = t.push(Expr::Const(1));
        let b = t.push(Expr::Const(2));
        assert_eq!(a.to_string(), "C_0");
        assert_eq!(b.to_string(), "C_1");
    }

    #[test]
    fn next_tick_round_trips() {
        let v = Id::new("p");
        let name = next_tick_name(v);
        assert_eq!(name, "p[t+1]");
        assert_eq!(parse_next_tick_name(&name), Some("p"));
        assert_eq!(parse_next_tick_name("C_3"), None);
    }

    #[test]
    fn sorted_vars_is_lexicographic() {
        let mut f = FDict::new();
        f.insert(Id::new("zeta"), Expr::Const(0));
        f.insert(Id::new("alpha"), Expr::Const(0));
        f.insert(Id::new("mid"), Expr::Const(0));
        let names: Vec<String> =
            f.sorted_vars().into_iter().map(|i| i.to_string()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
