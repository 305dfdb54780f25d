//! The Flattener (§4.1): symbolic execution of the restricted input
//! program, eliminating control flow by substitution.

use std::collections::{BTreeMap, BTreeSet};

use dioc_frontend::{AssignOp, Expr as AstExpr, Program, Stmt, UpdateOp};
use dioc_ir::{BinOp, Expr, FDict};
use dioc_utils::{Error, Id};

use crate::pass_manager::Named;

pub struct Flatten;

impl Named for Flatten {
    fn name() -> &'static str {
        "flatten"
    }
    fn description() -> &'static str {
        "eliminate control flow and auxiliary bindings by substitution"
    }
}

/// The F-dictionary and the set of input names the traversal discovered
/// (§4.1 "Output").
pub struct FlattenOutput {
    pub f: FDict,
    pub input_vars: BTreeSet<Id>,
}

pub fn flatten(program: &Program) -> FlattenOutput {
    let mut st = State::new(&program.state_vars);
    st.run_block(&program.body);

    let mut f = FDict::new();
    for &v in &program.state_vars {
        f.insert(v, st.finalize(v));
    }
    FlattenOutput {
        f,
        input_vars: st.inputs,
    }
}

/// `current`/`aux` state carried during traversal (§4.1).
struct State {
    current: BTreeMap<Id, Expr>,
    aux: BTreeSet<Id>,
    state_vars: BTreeSet<Id>,
    inputs: BTreeSet<Id>,
    opaque_count: usize,
}

impl State {
    fn new(state_vars: &[Id]) -> Self {
        let mut current = BTreeMap::new();
        for &v in state_vars {
            current.insert(v, Expr::var(v));
        }
        Self {
            current,
            aux: BTreeSet::new(),
            state_vars: state_vars.iter().copied().collect(),
            inputs: BTreeSet::new(),
            opaque_count: 0,
        }
    }

    /// A fresh input name for the value an unsupported construct would have
    /// produced (§7 `unsupported-construct`).
    fn synth_opaque_input(&mut self) -> Id {
        let n = self.opaque_count;
        self.opaque_count += 1;
        dioc_ir::opaque_input_name(n)
    }

    fn eval(&mut self, e: &AstExpr) -> Expr {
        match e {
            AstExpr::Constant(n) => Expr::Const(*n),
            AstExpr::Var(n) => {
                if let Some(v) = self.current.get(n) {
                    v.clone()
                } else {
                    self.inputs.insert(*n);
                    Expr::var(*n)
                }
            }
            AstExpr::Call(n) => {
                self.inputs.insert(*n);
                Expr::var(*n)
            }
            AstExpr::Bin(op, l, r) => {
                let l = self.eval(l);
                let r = self.eval(r);
                Expr::bin(*op, l, r)
            }
            AstExpr::Neg(x) => Expr::neg(self.eval(x)),
        }
    }

    fn bind(&mut self, target: Id, value: Expr) {
        if !self.state_vars.contains(&target) {
            self.aux.insert(target);
        }
        self.current.insert(target, value);
    }

    fn current_or_var(&self, name: Id) -> Expr {
        self.current.get(&name).cloned().unwrap_or_else(|| Expr::var(name))
    }

    fn run_block(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.run_stmt(stmt);
        }
    }

    fn run_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(body) => self.run_block(body),
            Stmt::Declare { name, init } => {
                let value = match init {
                    Some(e) => self.eval(e),
                    None => Expr::Const(0),
                };
                self.bind(*name, value);
            }
            Stmt::Assign { target, op, value } => {
                let v = self.eval(value);
                let new_value = match op {
                    AssignOp::Set => v,
                    AssignOp::AddAssign => Expr::bin(BinOp::Add, self.current_or_var(*target), v),
                    AssignOp::SubAssign => Expr::bin(BinOp::Sub, self.current_or_var(*target), v),
                };
                self.bind(*target, new_value);
            }
            Stmt::Update { target, op } => {
                let delta_op = match op {
                    UpdateOp::Inc => BinOp::Add,
                    UpdateOp::Dec => BinOp::Sub,
                };
                let new_value = Expr::bin(delta_op, self.current_or_var(*target), Expr::Const(1));
                self.bind(*target, new_value);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => self.run_if(cond, then_branch, else_branch.as_deref()),
            Stmt::Opaque(kind) => {
                // §7 `unsupported-construct`: warn and continue rather than
                // abort, substituting an opaque `Var` for whatever the
                // construct would have touched and recording that name as
                // an input.
                log::warn!("{}", Error::unsupported_construct(kind.clone()));
                let synthesized = self.synth_opaque_input();
                self.inputs.insert(synthesized);
                self.bind(Id::new(kind.as_str()), Expr::var(synthesized));
            }
        }
    }

    fn run_if(&mut self, cond: &AstExpr, then_branch: &[Stmt], else_branch: Option<&[Stmt]>) {
        let c_expr = self.eval(cond);
        let pre = self.current.clone();

        self.run_block(then_branch);
        let post_then = std::mem::replace(&mut self.current, pre.clone());

        if let Some(else_branch) = else_branch {
            self.run_block(else_branch);
        }
        let post_else = std::mem::replace(&mut self.current, pre.clone());

        let mut touched: BTreeSet<Id> = BTreeSet::new();
        for (name, value) in &post_then {
            if pre.get(name) != Some(value) {
                touched.insert(*name);
            }
        }
        for (name, value) in &post_else {
            if pre.get(name) != Some(value) {
                touched.insert(*name);
            }
        }

        for name in touched {
            // A name touched by only one branch but never declared before
            // the `if` has no `pre` value to fall back to; the branch that
            // didn't touch it effectively leaves it at its as-yet-unbound
            // default, `Const(0)` (§4.1 Declare-without-init convention).
            let fallback = || pre.get(&name).cloned().unwrap_or(Expr::Const(0));
            let t_val = post_then.get(&name).cloned().unwrap_or_else(fallback);
            let e_val = post_else.get(&name).cloned().unwrap_or_else(fallback);
            let merged = if t_val == e_val {
                t_val
            } else {
                Expr::if_(c_expr.clone(), t_val, e_val)
            };
            self.bind(name, merged);
        }
    }

    /// Substitute every auxiliary reference out of `current[v]` (§4.1
    /// Finalization). In practice `eval` already resolves `Var(n)` against
    /// `current` the moment `n` is referenced, so no aux name ever survives
    /// unresolved inside a bound expression; this pass is the documented
    /// safety net the spec names, not load-bearing under this traversal.
    fn finalize(&self, v: Id) -> Expr {
        let mut e = self.current_or_var(v);
        for _ in 0..=self.aux.len() {
            let mut changed = false;
            for &a in &self.aux {
                let sub = self.current.get(&a).cloned().unwrap_or(Expr::Const(0));
                let next = e.substitute_var(a, &sub);
                if next != e {
                    changed = true;
                }
                e = next;
            }
            if !changed {
                break;
            }
        }
        e
    }
}
