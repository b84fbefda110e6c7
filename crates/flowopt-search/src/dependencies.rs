// Ordering obligations carried by strong flows
// A rewrite may move tasks around freely except across a strong flow

use std::collections::BTreeSet;

use flowopt_graph::{ids, NodeId, ProcessGraph};

/// `(before, after)`: `after` must stay reachable from `before`
pub type Dependency = (NodeId, NodeId);

/// Pairs of tasks linked by a path of strong flows
///
/// The path may pass through gateways and stops at the first activity.
pub fn compute_dependencies(graph: &ProcessGraph) -> BTreeSet<Dependency> {
    let mut dependencies = BTreeSet::new();

    for task in graph.tasks() {
        let mut visited = BTreeSet::new();
        let mut stack = vec![task.id.clone()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for flow in graph.outgoing(&current).into_iter().filter(|f| f.is_strong()) {
                let Some(target) = graph.node(&flow.target) else {
                    continue;
                };
                if target.is_activity() {
                    dependencies.insert((task.id.clone(), target.id.clone()));
                } else {
                    stack.push(target.id.clone());
                }
            }
        }
    }
    dependencies
}

/// Whether every instance of each `before` task still reaches an instance of
/// its `after` task. A task without any instance left breaks the dependency.
pub fn preserves_dependencies(graph: &ProcessGraph, dependencies: &BTreeSet<Dependency>) -> bool {
    let instances = |task: &str| -> Vec<NodeId> {
        graph
            .tasks()
            .into_iter()
            .filter(|n| ids::is_instance_of(&n.id, task))
            .map(|n| n.id.clone())
            .collect()
    };

    dependencies.iter().all(|(before, after)| {
        let sources = instances(before);
        let targets = instances(after);
        !sources.is_empty()
            && !targets.is_empty()
            && sources
                .iter()
                .all(|s| targets.iter().any(|t| graph.is_reachable(s, t)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowopt_graph::testing::{disjoint_chain, ProcessShape};
    use flowopt_graph::{Activity, Flow, GatewayKind, Node, ProcessBuilder};
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn pair(a: &str, b: &str) -> Dependency {
        (a.to_string(), b.to_string())
    }

    fn strong_fork() -> ProcessGraph {
        ProcessBuilder::new("strong-fork")
            .start("s")
            .activity("a1", "A1", 5, ["r1"])
            .split("g1", GatewayKind::Parallel)
            .activity("a2", "A2", 5, ["r2"])
            .activity("a3", "A3", 5, ["r3"])
            .join("g2", GatewayKind::Parallel)
            .end("e")
            .flow("f1", "s", "a1")
            .strong_flow("f2", "a1", "g1")
            .strong_flow("f3", "g1", "a2")
            .flow("f4", "g1", "a3")
            .flow("f5", "a2", "g2")
            .flow("f6", "a3", "g2")
            .flow("f7", "g2", "e")
            .build()
            .unwrap()
    }

    #[test]
    fn test_weak_graph_has_no_dependencies() {
        assert!(compute_dependencies(&disjoint_chain().unwrap()).is_empty());
    }

    #[test]
    fn test_strong_path_through_gateway() {
        let deps = compute_dependencies(&strong_fork());
        assert_eq!(deps, BTreeSet::from([pair("a1", "a2")]));
    }

    #[test]
    fn test_strong_path_stops_at_first_activity() {
        let graph = ProcessBuilder::new("strong-chain")
            .start("s")
            .activity("a1", "A1", 5, ["r1"])
            .activity("a2", "A2", 5, ["r2"])
            .activity("a3", "A3", 5, ["r3"])
            .end("e")
            .flow("f1", "s", "a1")
            .strong_flow("f2", "a1", "a2")
            .strong_flow("f3", "a2", "a3")
            .flow("f4", "a3", "e")
            .build()
            .unwrap();
        let deps = compute_dependencies(&graph);
        assert_eq!(deps, BTreeSet::from([pair("a1", "a2"), pair("a2", "a3")]));
    }

    #[test]
    fn test_parallel_tasks_break_dependency() {
        let deps = BTreeSet::from([pair("a2", "a3")]);
        assert!(!preserves_dependencies(&strong_fork(), &deps));
        assert!(!preserves_dependencies(&strong_fork(), &BTreeSet::from([pair("a1", "zz")])));
    }

    #[test]
    fn test_every_copy_must_reach_target() {
        // copies are minted by rewrites, so the graph is assembled directly
        let build = |copy_target: &str| {
            let mut graph = ProcessGraph::new("copies");
            let nodes = [
                Node::start("s"),
                Node::split("g1", GatewayKind::Exclusive),
                Node::activity("a1", Activity::new("A1", 5, ["r1"])),
                Node::activity("a1_1", Activity::new("A1", 5, ["r1"])),
                Node::join("g2", GatewayKind::Exclusive),
                Node::activity("a2", Activity::new("A2", 5, ["r2"])),
                Node::end("e"),
            ];
            for node in nodes {
                graph.add_node(node).unwrap();
            }
            let flows = [
                ("f1", "s", "g1"),
                ("f2", "g1", "a1"),
                ("f3", "g1", "a1_1"),
                ("f4", "a1", "g2"),
                ("f5", "a1_1", copy_target),
                ("f6", "g2", "a2"),
                ("f7", "a2", "e"),
            ];
            for (id, source, target) in flows {
                graph.add_flow(Flow::new(id, source, target)).unwrap();
            }
            graph
        };
        let deps = BTreeSet::from([pair("a1", "a2")]);
        assert!(preserves_dependencies(&build("g2"), &deps));
        assert!(!preserves_dependencies(&build("e"), &deps));
    }

    #[quickcheck]
    fn own_dependencies_hold(shape: ProcessShape) -> bool {
        shape
            .to_graph("generated")
            .is_ok_and(|g| preserves_dependencies(&g, &compute_dependencies(&g)))
    }
}
