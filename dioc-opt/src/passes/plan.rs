//! The Equation Planner (§4.4): Kahn's topological sort over the
//! dependency graph of defined LHS names.

use std::collections::{BinaryHeap, HashMap};

use dioc_ir::{Assignment, AssignmentList, Schedule};
use dioc_utils::{DiocResult, Error, Id};

use crate::analysis::dep_graph;
use crate::pass_manager::Named;

pub struct Plan;

impl Named for Plan {
    fn name() -> &'static str {
        "plan"
    }
    fn description() -> &'static str {
        "topologically order the assignment system for a single forward sweep"
    }
}

pub fn plan(list: &AssignmentList) -> DiocResult<Schedule> {
    let dg = dep_graph::build(list);

    let position: HashMap<Id, usize> = list
        .iter()
        .enumerate()
        .map(|(i, a)| (a.lhs, i))
        .collect();
    let by_name: HashMap<Id, &Assignment> = list.iter().map(|a| (a.lhs, a)).collect();

    let mut in_degree: HashMap<Id, usize> = dg
        .defined
        .iter()
        .map(|&n| {
            (
                n,
                dg.graph.edges_directed(n, petgraph::Direction::Incoming).count(),
            )
        })
        .collect();

    // A min-heap keyed by original position breaks ties deterministically
    // (§4.4 doesn't mandate an order among simultaneously-ready nodes, but
    // stable output requires one -- §9 "sorted iteration for determinism").
    let mut ready: BinaryHeap<std::cmp::Reverse<(usize, Id)>> = BinaryHeap::new();
    for (&name, &deg) in &in_degree {
        if deg == 0 {
            ready.push(std::cmp::Reverse((position[&name], name)));
        }
    }

    let mut order = Vec::with_capacity(dg.defined.len());
    while let Some(std::cmp::Reverse((_, name))) = ready.pop() {
        order.push(by_name[&name].clone());
        for (_, succ, _) in dg.graph.edges_directed(name, petgraph::Direction::Outgoing) {
            let deg = in_degree.get_mut(&succ).unwrap();
            *deg -= 1;
            if *deg == 0 {
                ready.push(std::cmp::Reverse((position[&succ], succ)));
            }
        }
    }

    if order.len() != dg.defined.len() {
        let resolved: std::collections::HashSet<Id> = order.iter().map(|a| a.lhs).collect();
        let unresolved: Vec<Id> = dg
            .defined
            .iter()
            .filter(|n| !resolved.contains(n))
            .copied()
            .collect();
        return Err(Error::cycle(unresolved));
    }

    Ok(Schedule { order })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioc_ir::Expr;

    #[test]
    fn schedule_respects_dependencies() {
        let mut list = AssignmentList::new();
        list.push(Id::new("x[t+1]"), Expr::var(Id::new("C_0")));
        list.push(Id::new("C_0"), Expr::bin(dioc_ir::BinOp::Add, Expr::var(Id::new("a")), Expr::Const(1)));
        let schedule = plan(&list).unwrap();
        let names: Vec<String> = schedule.iter().map(|a| a.lhs.to_string()).collect();
        assert_eq!(names, vec!["C_0".to_string(), "x[t+1]".to_string()]);
    }

    #[test]
    fn cycle_is_detected() {
        let mut list = AssignmentList::new();
        list.push(Id::new("a"), Expr::var(Id::new("b")));
        list.push(Id::new("b"), Expr::var(Id::new("a")));
        assert!(plan(&list).is_err());
    }

    #[test]
    fn length_matches_equation_count_on_success() {
        let mut list = AssignmentList::new();
        list.push(Id::new("x[t+1]"), Expr::var(Id::new("x")));
        list.push(Id::new("y[t+1]"), Expr::Const(0));
        let schedule = plan(&list).unwrap();
        assert_eq!(schedule.len(), list.len());
    }
}
