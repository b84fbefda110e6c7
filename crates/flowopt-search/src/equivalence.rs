//! Structural equivalence of process variants
//!
//! Both checks are approximate. The hash is a coarse pre-filter with many
//! collisions; equality is a greedy lock-step walk, not full isomorphism.

use std::collections::{BTreeMap, BTreeSet};

use flowopt_graph::{Node, NodeId, NodeKind, ProcessGraph};

/// Histogram of distances from Start, counts read as decimal digits in
/// ascending distance order. Unreachable nodes are not counted.
pub fn structural_hash(graph: &ProcessGraph) -> u64 {
    let mut histogram: BTreeMap<usize, u64> = BTreeMap::new();
    for distance in graph.distances_from_start().into_values() {
        *histogram.entry(distance).or_default() += 1;
    }

    histogram.into_values().fold(0u64, |hash, count| {
        let digits = count.checked_ilog10().unwrap_or(0) + 1;
        hash.wrapping_mul(10u64.wrapping_pow(digits)).wrapping_add(count)
    })
}

/// Same node class; gateways also need the same kind and fan-in/fan-out,
/// activities the same name, duration and resources.
pub fn match_node(g1: &ProcessGraph, n1: &Node, g2: &ProcessGraph, n2: &Node) -> bool {
    match (&n1.kind, &n2.kind) {
        (NodeKind::Start, NodeKind::Start) | (NodeKind::End, NodeKind::End) => true,
        (NodeKind::Activity(a1), NodeKind::Activity(a2)) => {
            a1.name == a2.name && a1.duration == a2.duration && a1.resources == a2.resources
        }
        (NodeKind::Split(k1), NodeKind::Split(k2)) | (NodeKind::Join(k1), NodeKind::Join(k2)) => {
            k1 == k2
                && g1.incoming(&n1.id).len() == g2.incoming(&n2.id).len()
                && g1.outgoing(&n1.id).len() == g2.outgoing(&n2.id).len()
        }
        _ => false,
    }
}

/// Whether two variants look the same
///
/// Element counts must agree; then, walking from both Start nodes, every
/// successor on one side needs a matching successor on the other whose own
/// successors match recursively. The walk runs in both directions. A node
/// reached twice is assumed to match.
pub fn structural_equals(g1: &ProcessGraph, g2: &ProcessGraph) -> bool {
    let same_counts = g1.node_count() == g2.node_count()
        && g1.flow_count() == g2.flow_count()
        && g1.splits().len() == g2.splits().len()
        && g1.joins().len() == g2.joins().len()
        && g1.parallel_gateways().len() == g2.parallel_gateways().len()
        && g1.exclusive_gateways().len() == g2.exclusive_gateways().len();
    if !same_counts {
        return false;
    }

    match (g1.start_node(), g2.start_node()) {
        (Some(s1), Some(s2)) => {
            walk(g1, s1, g2, s2, &mut BTreeSet::new()) && walk(g2, s2, g1, s1, &mut BTreeSet::new())
        }
        _ => false,
    }
}

fn walk(g1: &ProcessGraph, n1: &Node, g2: &ProcessGraph, n2: &Node, visited: &mut BTreeSet<NodeId>) -> bool {
    if n1.is_end() && n2.is_end() {
        return true;
    }
    if !visited.insert(n1.id.clone()) {
        return true;
    }

    let candidates = g2.successors(&n2.id);
    g1.successors(&n1.id).into_iter().all(|s1| {
        candidates
            .iter()
            .any(|s2| match_node(g1, s1, g2, s2) && walk(g1, s1, g2, s2, visited))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowopt_graph::testing::{disjoint_chain, drone_contention, sequential_pair, ProcessShape};
    use flowopt_graph::{GatewayKind, ProcessBuilder};
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_hash_concatenates_level_counts() {
        // s | a1 | a2 | a3 | e
        assert_eq!(structural_hash(&disjoint_chain().unwrap()), 11111);
        // s | g1 | a1 a3 | g2 | e
        assert_eq!(structural_hash(&drone_contention().unwrap()), 11211);
    }

    #[test]
    fn test_renamed_ids_are_equal() {
        let a = sequential_pair().unwrap();
        let b = ProcessBuilder::new("renamed")
            .start("start")
            .activity("x", "A1", 10, ["r1"])
            .activity("y", "A2", 10, ["r2", "r3"])
            .end("end")
            .flow("k1", "start", "x")
            .flow("k2", "x", "y")
            .flow("k3", "y", "end")
            .build()
            .unwrap();
        assert!(structural_equals(&a, &b));
        assert!(structural_equals(&b, &a));
    }

    #[test]
    fn test_swapped_order_is_different() {
        let a = sequential_pair().unwrap();
        let b = ProcessBuilder::new("swapped")
            .start("s")
            .activity("a2", "A2", 10, ["r2", "r3"])
            .activity("a1", "A1", 10, ["r1"])
            .end("e")
            .flow("f1", "s", "a2")
            .flow("f2", "a2", "a1")
            .flow("f3", "a1", "e")
            .build()
            .unwrap();
        assert!(!structural_equals(&a, &b));
    }

    #[test]
    fn test_gateway_kind_matters() {
        let parallel = drone_contention().unwrap();
        let exclusive = ProcessBuilder::new("choice")
            .start("s")
            .split("g1", GatewayKind::Exclusive)
            .activity("a1", "A1", 10, ["employee", "drone"])
            .activity("a3", "A3", 20, ["employee", "drone"])
            .join("g2", GatewayKind::Exclusive)
            .end("e")
            .flow("f1", "s", "g1")
            .flow("f2", "g1", "a1")
            .flow("f3", "g1", "a3")
            .flow("f4", "a1", "g2")
            .flow("f5", "a3", "g2")
            .flow("f6", "g2", "e")
            .build()
            .unwrap();
        assert_eq!(structural_hash(&parallel), structural_hash(&exclusive));
        assert!(!structural_equals(&parallel, &exclusive));
    }

    #[test]
    fn test_unmatched_branch_on_either_side() {
        let fork = |second: (&str, &str, &str)| {
            ProcessBuilder::new("fork")
                .start("s")
                .split("p1", GatewayKind::Parallel)
                .activity("x1", "A1", 5, ["r1"])
                .activity(second.0, second.1, 5, [second.2])
                .join("p2", GatewayKind::Parallel)
                .end("e")
                .flow("f1", "s", "p1")
                .flow("f2", "p1", "x1")
                .flow("f3", "p1", second.0)
                .flow("f4", "x1", "p2")
                .flow("f5", second.0, "p2")
                .flow("f6", "p2", "e")
                .build()
                .unwrap()
        };
        let twins = fork(("x2", "A1", "r1"));
        let mixed = fork(("y", "B", "r2"));
        assert_eq!(structural_hash(&twins), structural_hash(&mixed));
        // every branch of `twins` finds a partner in `mixed`, not the reverse
        assert!(!structural_equals(&twins, &mixed));
        assert!(!structural_equals(&mixed, &twins));
    }

    #[quickcheck]
    fn clone_is_equal_and_hashes_alike(shape: ProcessShape) -> bool {
        let Ok(graph) = shape.to_graph("generated") else {
            return false;
        };
        let copy = graph.clone();
        structural_equals(&graph, &copy) && structural_hash(&graph) == structural_hash(&copy)
    }
}
