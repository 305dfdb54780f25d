//! Dependency graph construction for the Planner (§4.4).

use std::collections::BTreeSet;

use dioc_ir::AssignmentList;
use dioc_utils::Id;
use petgraph::graphmap::DiGraphMap;

/// A graph whose nodes are the assignment list's defined LHS names and
/// whose edges go from a definition to every definition that references it
/// (§4.4: "edges go from each definition to every definition that
/// references it"). References to names the list does not define --
/// external inputs or prior-tick state variables -- are not edges.
pub struct DepGraph {
    pub graph: DiGraphMap<Id, ()>,
    pub defined: BTreeSet<Id>,
}

pub fn build(list: &AssignmentList) -> DepGraph {
    let defined: BTreeSet<Id> = list.iter().map(|a| a.lhs).collect();
    let mut graph = DiGraphMap::new();
    for &name in &defined {
        graph.add_node(name);
    }
    for a in list.iter() {
        let mut free = BTreeSet::new();
        a.rhs.free_vars(&mut free);
        for dep in free {
            if defined.contains(&dep) && dep != a.lhs {
                graph.add_edge(dep, a.lhs, ());
            }
        }
    }
    DepGraph { graph, defined }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioc_ir::Expr;

    #[test]
    fn edges_only_connect_defined_names() {
        let mut list = AssignmentList::new();
        list.push(Id::new("C_0"), Expr::var(Id::new("x")));
        list.push(Id::new("x[t+1]"), Expr::var(Id::new("C_0")));
        let dg = build(&list);
        assert!(dg.graph.contains_edge(Id::new("C_0"), Id::new("x[t+1]")));
        assert_eq!(dg.graph.edge_count(), 1);
    }
}
