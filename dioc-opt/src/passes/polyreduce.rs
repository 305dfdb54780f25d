//! The Polynomial Reducer (§4.3): eliminates every non-arithmetic operator
//! by introducing existential witnesses, leaving only `+ - *` and integer
//! constants. Operates on the same `(F', aliases)` pair `passes::assemble`
//! does, but its output is report-only (§8: "no comparison or boolean
//! operator appears on any RHS" of *this* system) -- it is never scheduled
//! or evaluated.

use dioc_ir::{next_tick_name, AliasTable, BinOp, Expr, FDict, PolySystem};
use dioc_utils::{DiocResult, Error, Id};

use crate::pass_manager::Named;

pub struct PolyReduce;

impl Named for PolyReduce {
    fn name() -> &'static str {
        "polyreduce"
    }
    fn description() -> &'static str {
        "lower comparisons, booleans and conditionals to pure arithmetic"
    }
}

pub struct PolyReduceOutput {
    pub system: PolySystem,
    pub witness_count: usize,
}

/// Lower every alias (in discovery order) and every state equation (in
/// sorted name order) into the witness-reduced system (§4.3 "Ordering of
/// outputs").
pub fn reduce(f: &FDict, aliases: &AliasTable) -> DiocResult<PolyReduceOutput> {
    let mut sys = PolySystem::new();
    let mut witnesses = 0usize;

    for (name, def) in aliases.iter() {
        convert(name, def, &mut sys, &mut witnesses)?;
    }
    for v in f.sorted_vars() {
        let lhs = Id::new(next_tick_name(v));
        let expr = f.get(v).cloned().unwrap_or_else(|| Expr::var(v));
        convert(lhs, &expr, &mut sys, &mut witnesses)?;
    }

    Ok(PolyReduceOutput {
        system: sys,
        witness_count: witnesses,
    })
}

fn fresh_witness(witnesses: &mut usize) -> Id {
    let n = *witnesses;
    *witnesses += 1;
    dioc_ir::witness_name(n)
}

/// §4.3 "Operand resolution": leaves are used inline, compound operands get
/// a fresh witness lowered recursively before their name is used.
fn resolve(e: &Expr, sys: &mut PolySystem, witnesses: &mut usize) -> DiocResult<Expr> {
    if e.is_leaf() {
        return Ok(e.clone());
    }
    let w = fresh_witness(witnesses);
    convert(w, e, sys, witnesses)?;
    Ok(Expr::var(w))
}

fn sum_of_four_squares(ids: &[Id; 4]) -> Expr {
    ids.iter()
        .map(|&id| Expr::bin(BinOp::Mul, Expr::var(id), Expr::var(id)))
        .reduce(|a, b| Expr::bin(BinOp::Add, a, b))
        .unwrap()
}

fn four_fresh_witnesses(witnesses: &mut usize) -> [Id; 4] {
    [
        fresh_witness(witnesses),
        fresh_witness(witnesses),
        fresh_witness(witnesses),
        fresh_witness(witnesses),
    ]
}

/// Emit the equation(s) defining `target` in terms of `expr`, recursively
/// lowering `expr` first (§4.3 per-operator rules).
fn convert(target: Id, expr: &Expr, sys: &mut PolySystem, witnesses: &mut usize) -> DiocResult<()> {
    match expr {
        Expr::Const(_) | Expr::Var(_) => {
            sys.push(Expr::bin(BinOp::Sub, Expr::var(target), expr.clone()));
            Ok(())
        }
        Expr::Neg(x) => {
            let a = resolve(x, sys, witnesses)?;
            sys.push(Expr::bin(BinOp::Sub, Expr::var(target), Expr::neg(a)));
            Ok(())
        }
        Expr::If(c, t, f) => {
            let cc = resolve(c, sys, witnesses)?;
            let tt = resolve(t, sys, witnesses)?;
            let ff = resolve(f, sys, witnesses)?;
            let rhs = Expr::bin(
                BinOp::Add,
                Expr::bin(BinOp::Mul, cc.clone(), tt),
                Expr::bin(BinOp::Mul, Expr::bin(BinOp::Sub, Expr::Const(1), cc), ff),
            );
            sys.push(Expr::bin(BinOp::Sub, Expr::var(target), rhs));
            Ok(())
        }
        Expr::Bin(op, l, r) => lower_bin(target, *op, l, r, sys, witnesses),
    }
}

fn lower_bin(
    target: Id,
    op: BinOp,
    l: &Expr,
    r: &Expr,
    sys: &mut PolySystem,
    witnesses: &mut usize,
) -> DiocResult<()> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul => {
            let a = resolve(l, sys, witnesses)?;
            let b = resolve(r, sys, witnesses)?;
            sys.push(Expr::bin(BinOp::Sub, Expr::var(target), Expr::bin(op, a, b)));
            Ok(())
        }
        BinOp::Div => Err(Error::internal(
            "division has no Diophantine polynomial lowering",
        )),
        BinOp::Eq => {
            let a = resolve(l, sys, witnesses)?;
            let b = resolve(r, sys, witnesses)?;
            let e_inv = fresh_witness(witnesses);
            // target boolean
            sys.push(Expr::bin(
                BinOp::Mul,
                Expr::var(target),
                Expr::bin(BinOp::Sub, Expr::Const(1), Expr::var(target)),
            ));
            // target = 1 => a = b
            sys.push(Expr::bin(
                BinOp::Mul,
                Expr::var(target),
                Expr::bin(BinOp::Sub, a.clone(), b.clone()),
            ));
            // a != b => target = 0 (inverse witness trick)
            sys.push(Expr::bin(
                BinOp::Sub,
                Expr::bin(BinOp::Mul, Expr::bin(BinOp::Sub, a, b), Expr::var(e_inv)),
                Expr::bin(BinOp::Sub, Expr::Const(1), Expr::var(target)),
            ));
            Ok(())
        }
        BinOp::Le => {
            let a = resolve(l, sys, witnesses)?;
            let b = resolve(r, sys, witnesses)?;
            let sq1 = four_fresh_witnesses(witnesses);
            let sq2 = four_fresh_witnesses(witnesses);
            let sum1 = sum_of_four_squares(&sq1);
            let sum2 = sum_of_four_squares(&sq2);
            sys.push(Expr::bin(
                BinOp::Mul,
                Expr::var(target),
                Expr::bin(BinOp::Sub, Expr::Const(1), Expr::var(target)),
            ));
            sys.push(Expr::bin(
                BinOp::Mul,
                Expr::var(target),
                Expr::bin(
                    BinOp::Sub,
                    Expr::bin(BinOp::Sub, b.clone(), a.clone()),
                    sum1,
                ),
            ));
            sys.push(Expr::bin(
                BinOp::Mul,
                Expr::bin(BinOp::Sub, Expr::Const(1), Expr::var(target)),
                Expr::bin(
                    BinOp::Sub,
                    Expr::bin(BinOp::Sub, Expr::bin(BinOp::Sub, a, b), Expr::Const(1)),
                    sum2,
                ),
            ));
            Ok(())
        }
        BinOp::Ne => {
            let w = fresh_witness(witnesses);
            convert(w, &Expr::bin(BinOp::Eq, l.clone(), r.clone()), sys, witnesses)?;
            sys.push(Expr::bin(
                BinOp::Sub,
                Expr::var(target),
                Expr::bin(BinOp::Sub, Expr::Const(1), Expr::var(w)),
            ));
            Ok(())
        }
        BinOp::Lt => {
            let reduced = Expr::bin(BinOp::Le, l.clone(), Expr::bin(BinOp::Sub, r.clone(), Expr::Const(1)));
            convert(target, &reduced, sys, witnesses)
        }
        BinOp::Ge => {
            let reduced = Expr::bin(BinOp::Le, r.clone(), l.clone());
            convert(target, &reduced, sys, witnesses)
        }
        BinOp::Gt => {
            let reduced = Expr::bin(BinOp::Lt, r.clone(), l.clone());
            convert(target, &reduced, sys, witnesses)
        }
        BinOp::And => {
            let a = resolve(l, sys, witnesses)?;
            let b = resolve(r, sys, witnesses)?;
            sys.push(Expr::bin(BinOp::Sub, Expr::var(target), Expr::bin(BinOp::Mul, a, b)));
            Ok(())
        }
        BinOp::Or => {
            let a = resolve(l, sys, witnesses)?;
            let b = resolve(r, sys, witnesses)?;
            let rhs = Expr::bin(
                BinOp::Sub,
                Expr::bin(BinOp::Add, a.clone(), b.clone()),
                Expr::bin(BinOp::Mul, a, b),
            );
            sys.push(Expr::bin(BinOp::Sub, Expr::var(target), rhs));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioc_ir::printer::expr_to_native_string;

    fn find_eq_witness_equations(f: &FDict) -> PolyReduceOutput {
        reduce(f, &AliasTable::new()).unwrap()
    }

    #[test]
    fn equality_lowering_introduces_exactly_one_witness_matching_scenario_5() {
        let mut f = FDict::new();
        f.insert(
            Id::new("x"),
            Expr::bin(BinOp::Eq, Expr::var(Id::new("a")), Expr::var(Id::new("b"))),
        );
        let out = find_eq_witness_equations(&f);
        assert_eq!(out.witness_count, 1);
        assert_eq!(out.system.len(), 3);
    }

    #[test]
    fn inequality_lowering_introduces_eight_square_witnesses_matching_scenario_6() {
        let mut f = FDict::new();
        f.insert(
            Id::new("x"),
            Expr::bin(BinOp::Le, Expr::var(Id::new("a")), Expr::var(Id::new("b"))),
        );
        let out = find_eq_witness_equations(&f);
        assert_eq!(out.witness_count, 8);
        assert_eq!(out.system.len(), 3);
    }

    #[test]
    fn output_never_contains_comparison_or_boolean_operators() {
        let mut f = FDict::new();
        f.insert(
            Id::new("p"),
            Expr::if_(
                Expr::bin(
                    BinOp::And,
                    Expr::bin(BinOp::Eq, Expr::var(Id::new("k")), Expr::Const(119)),
                    Expr::bin(BinOp::Gt, Expr::var(Id::new("p")), Expr::Const(1)),
                ),
                Expr::bin(BinOp::Sub, Expr::var(Id::new("p")), Expr::Const(1)),
                Expr::var(Id::new("p")),
            ),
        );
        let out = reduce(&f, &AliasTable::new()).unwrap();
        for eq in out.system.iter() {
            let rendered = expr_to_native_string(&eq.0);
            for forbidden in ["==", "!=", "<=", ">=", "&&", "||", "if("] {
                assert!(!rendered.contains(forbidden), "found `{forbidden}` in `{rendered}`");
            }
        }
    }

    #[test]
    fn division_is_rejected() {
        let mut f = FDict::new();
        f.insert(
            Id::new("x"),
            Expr::bin(BinOp::Div, Expr::var(Id::new("x")), Expr::Const(2)),
        );
        assert!(reduce(&f, &AliasTable::new()).is_err());
    }
}
