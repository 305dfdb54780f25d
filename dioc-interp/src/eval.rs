//! The Evaluator (§4.5): interprets a loaded machine equation file against
//! a current-state and per-step inputs mapping.
//!
//! `dioc-step` treats `equations.dio` as an opaque text artifact with no
//! access to the compiler's in-memory [`dioc_ir::Schedule`] -- exactly the
//! boundary the source's own `EquationEngine` crosses, rebuilding its own
//! execution plan from the file it loads rather than trusting any ordering
//! already present in the text. So this module keeps its own small Kahn's
//! pass over the parsed lines instead of depending on `dioc-opt`.

use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use dioc_utils::{DiocResult, Error, Id};

use crate::parser::{parse_machine_file, Line, Rhs};

/// A loaded, scheduled machine equation file, ready to be stepped (§4.5).
pub struct Evaluator {
    schedule: Vec<(Id, Rhs)>,
    state_vars: BTreeSet<Id>,
}

impl Evaluator {
    /// Load and schedule a machine equation file's contents.
    pub fn load(content: &str) -> DiocResult<Self> {
        let lines = parse_machine_file(content)?;
        Self::from_lines(lines)
    }

    fn from_lines(lines: Vec<Line>) -> DiocResult<Self> {
        let position: HashMap<Id, usize> =
            lines.iter().enumerate().map(|(i, l)| (l.lhs, i)).collect();
        let defined: BTreeSet<Id> = lines.iter().map(|l| l.lhs).collect();

        let mut successors: HashMap<Id, Vec<Id>> = HashMap::new();
        let mut in_degree: HashMap<Id, usize> = HashMap::new();
        for l in &lines {
            in_degree.entry(l.lhs).or_insert(0);
            let mut free = BTreeSet::new();
            l.rhs.free_vars(&mut free);
            let mut deps = 0;
            for dep in free {
                if defined.contains(&dep) && dep != l.lhs {
                    successors.entry(dep).or_default().push(l.lhs);
                    deps += 1;
                }
            }
            *in_degree.entry(l.lhs).or_insert(0) = deps;
        }

        let mut ready: BinaryHeap<std::cmp::Reverse<(usize, Id)>> = BinaryHeap::new();
        for (&name, &deg) in &in_degree {
            if deg == 0 {
                ready.push(std::cmp::Reverse((position[&name], name)));
            }
        }

        let by_name: HashMap<Id, &Line> = lines.iter().map(|l| (l.lhs, l)).collect();
        let mut order = Vec::with_capacity(lines.len());
        while let Some(std::cmp::Reverse((_, name))) = ready.pop() {
            order.push(name);
            if let Some(succs) = successors.get(&name) {
                for &succ in succs {
                    let deg = in_degree.get_mut(&succ).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(std::cmp::Reverse((position[&succ], succ)));
                    }
                }
            }
        }

        if order.len() != defined.len() {
            let resolved: BTreeSet<Id> = order.iter().copied().collect();
            let unresolved: Vec<Id> = defined.difference(&resolved).copied().collect();
            return Err(Error::cycle(unresolved));
        }

        let schedule = order
            .into_iter()
            .map(|name| (name, by_name[&name].rhs.clone()))
            .collect();

        let state_vars = defined
            .into_iter()
            .filter_map(|name| strip_next_tick(&name.resolve()).map(Id::new))
            .collect();

        Ok(Self { schedule, state_vars })
    }

    /// The bare state-variable names this file declares (derived from every
    /// `name[t+1]` LHS seen).
    pub fn state_vars(&self) -> &BTreeSet<Id> {
        &self.state_vars
    }

    /// Run one step: seed a context with `current` and `inputs`, execute the
    /// schedule in order, and project the `name[t+1]` bindings back out
    /// keyed by `name` (§4.5).
    pub fn step(
        &self,
        current: &BTreeMap<Id, i64>,
        inputs: &BTreeMap<Id, i64>,
    ) -> DiocResult<BTreeMap<Id, i64>> {
        let mut context: BTreeMap<Id, i64> = current.clone();
        context.extend(inputs.iter().map(|(&k, &v)| (k, v)));

        for (lhs, rhs) in &self.schedule {
            let value = eval_rhs(rhs, &context)?;
            context.insert(*lhs, value);
        }

        let mut next = BTreeMap::new();
        for &v in &self.state_vars {
            let key = Id::new(next_tick_name(v));
            if let Some(&value) = context.get(&key) {
                next.insert(v, value);
            }
        }
        Ok(next)
    }

    /// Run the schedule repeatedly, feeding each step's next-state mapping
    /// back in as the following step's current state (§4.5 "Multi-step
    /// simulation"). Returns the state after each step, in order.
    pub fn simulate(
        &self,
        initial: BTreeMap<Id, i64>,
        input_sequence: &[BTreeMap<Id, i64>],
    ) -> DiocResult<Vec<BTreeMap<Id, i64>>> {
        let mut current = initial;
        let mut trace = Vec::with_capacity(input_sequence.len());
        for inputs in input_sequence {
            let next = self.step(&current, inputs)?;
            current = next.clone();
            trace.push(next);
        }
        Ok(trace)
    }
}

fn next_tick_name(v: Id) -> String {
    format!("{v}[t+1]")
}

fn strip_next_tick(name: &str) -> Option<&str> {
    name.strip_suffix("[t+1]")
}

/// Evaluate a parsed RHS against a context (§4.5): truncating division,
/// C-like comparisons/booleans (true = 1, false = 0), strict ternary `if`.
pub fn eval_rhs(rhs: &Rhs, context: &BTreeMap<Id, i64>) -> DiocResult<i64> {
    match rhs {
        Rhs::Const(n) => Ok(*n),
        Rhs::Var(name) => context
            .get(name)
            .copied()
            .ok_or_else(|| Error::evaluation(format!("undefined name `{name}`"))),
        Rhs::Call(op, args) => {
            let vals: Result<Vec<i64>, Error> =
                args.iter().map(|a| eval_rhs(a, context)).collect();
            let vals = vals?;
            apply_op(op, &vals)
        }
    }
}

fn apply_op(op: &str, args: &[i64]) -> DiocResult<i64> {
    let arity_error = |want: usize| {
        Error::evaluation(format!(
            "operator `{op}` expects {want} argument(s), got {}",
            args.len()
        ))
    };
    match (op, args) {
        ("+", [a, b]) => Ok(a + b),
        ("-", [a, b]) => Ok(a - b),
        ("*", [a, b]) => Ok(a * b),
        ("/", [a, b]) => {
            if *b == 0 {
                Err(Error::evaluation("division by zero"))
            } else {
                Ok(a / b)
            }
        }
        ("neg", [a]) => Ok(-a),
        ("==", [a, b]) => Ok((a == b) as i64),
        ("!=", [a, b]) => Ok((a != b) as i64),
        ("<", [a, b]) => Ok((a < b) as i64),
        ("<=", [a, b]) => Ok((a <= b) as i64),
        (">", [a, b]) => Ok((a > b) as i64),
        (">=", [a, b]) => Ok((a >= b) as i64),
        ("&&", [a, b]) => Ok(((*a != 0) && (*b != 0)) as i64),
        ("||", [a, b]) => Ok(((*a != 0) || (*b != 0)) as i64),
        ("if", [c, t, f]) => Ok(if *c != 0 { *t } else { *f }),
        ("+" | "-" | "*" | "/" | "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||", _) => {
            Err(arity_error(2))
        }
        ("neg", _) => Err(arity_error(1)),
        ("if", _) => Err(arity_error(3)),
        _ => Err(Error::evaluation(format!("unknown operator `{op}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, i64)]) -> BTreeMap<Id, i64> {
        pairs.iter().map(|&(k, v)| (Id::new(k), v)).collect()
    }

    #[test]
    fn identity_step_matches_scenario_1() {
        let ev = Evaluator::load("x[t+1] := x\n").unwrap();
        let next = ev.step(&ctx(&[("x", 7)]), &BTreeMap::new()).unwrap();
        assert_eq!(next[&Id::new("x")], 7);
    }

    #[test]
    fn unconditional_counter_sweeps_matching_scenario_2() {
        let ev = Evaluator::load("x[t+1] := +(x, 1)\n").unwrap();
        let steps: Vec<BTreeMap<Id, i64>> = (0..5).map(|_| BTreeMap::new()).collect();
        let trace = ev.simulate(ctx(&[("x", 0)]), &steps).unwrap();
        let xs: Vec<i64> = trace.iter().map(|s| s[&Id::new("x")]).collect();
        assert_eq!(xs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn conditional_clamp_matches_scenario_3() {
        let ev = Evaluator::load("p[t+1] := if(&&(==(k, 119), >(p, 1)), -(p, 1), p)\n").unwrap();
        let next = ev.step(&ctx(&[("p", 5)]), &ctx(&[("k", 119)])).unwrap();
        assert_eq!(next[&Id::new("p")], 4);

        let next = ev.step(&ctx(&[("p", 1)]), &ctx(&[("k", 119)])).unwrap();
        assert_eq!(next[&Id::new("p")], 1);

        let next = ev.step(&ctx(&[("p", 5)]), &ctx(&[("k", 115)])).unwrap();
        assert_eq!(next[&Id::new("p")], 5);
    }

    #[test]
    fn alias_is_resolved_before_its_referencing_state_equation() {
        let ev = Evaluator::load("C_0 := +(beta, gamma)\nb[t+1] := C_0\nd[t+1] := C_0\n").unwrap();
        let next = ev
            .step(&BTreeMap::new(), &ctx(&[("beta", 2), ("gamma", 3)]))
            .unwrap();
        assert_eq!(next[&Id::new("b")], 5);
        assert_eq!(next[&Id::new("d")], 5);
    }

    #[test]
    fn undefined_name_is_an_evaluation_error() {
        let ev = Evaluator::load("x[t+1] := y\n").unwrap();
        assert!(ev.step(&BTreeMap::new(), &BTreeMap::new()).is_err());
    }

    #[test]
    fn cycle_is_rejected() {
        let result = Evaluator::load("a := b\nb := a\n");
        assert!(result.is_err());
    }

    #[test]
    fn truncating_division_rounds_toward_zero() {
        assert_eq!(apply_op("/", &[-7, 2]).unwrap(), -3);
        assert_eq!(apply_op("/", &[7, 2]).unwrap(), 3);
    }
}
