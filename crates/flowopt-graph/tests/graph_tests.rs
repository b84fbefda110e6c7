// Integration tests for the process graph model

use anyhow::Result;
use flowopt_graph::{
    validate, Flow, GatewayKind, GraphError, IdGenerator, Node, ProcessBuilder, ProcessGraph,
};
use pretty_assertions::assert_eq;

fn crossed_parallel() -> Result<ProcessGraph> {
    Ok(ProcessBuilder::new("p3")
        .start("s")
        .split("g1", GatewayKind::Parallel)
        .activity("t1", "T1", 10, ["r1", "r2"])
        .activity("t2", "T2", 10, ["r3"])
        .activity("t3", "T3", 20, ["r3"])
        .activity("t4", "T4", 20, ["r1", "r2"])
        .join("g2", GatewayKind::Parallel)
        .end("e")
        .flow("f1", "s", "g1")
        .flow("f2", "g1", "t1")
        .flow("f3", "g1", "t3")
        .flow("f4", "t1", "t2")
        .flow("f5", "t3", "t4")
        .flow("f6", "t2", "g2")
        .flow("f7", "t4", "g2")
        .flow("f8", "g2", "e")
        .build()?)
}

#[test]
fn test_block_navigation_on_branch_chains() -> Result<()> {
    let graph = crossed_parallel()?;
    assert_eq!(graph.get_merge_node("g1").map(|n| n.id.clone()), Some("g2".to_string()));
    assert_eq!(graph.get_split_node("g2").map(|n| n.id.clone()), Some("g1".to_string()));

    let resources: Vec<_> = graph.resources_between("g1", "g2").into_iter().collect();
    assert_eq!(resources, vec!["r1", "r2", "r3"]);
    Ok(())
}

#[test]
fn test_rewiring_a_clone_keeps_original_intact() -> Result<()> {
    let graph = crossed_parallel()?;
    let mut working = graph.clone();
    let mut ids = IdGenerator::new();

    // Put t2 in front of the split by hand.
    working.remove_flow("f4");
    working.remove_flow("f6");
    let bypass = ids.flow(&working);
    working.add_flow(Flow::new(bypass, "t1", "g2"))?;
    working.remove_flow("f1");
    let before = ids.flow(&working);
    working.add_flow(Flow::new(before, "s", "t2"))?;
    let after = ids.flow(&working);
    working.add_flow(Flow::new(after, "t2", "g1"))?;

    validate(&working)?;
    assert_eq!(working.predecessors("g1")[0].id, "t2");
    assert_eq!(graph.predecessors("g1")[0].id, "s");
    assert_eq!(working.flow_count(), graph.flow_count());
    Ok(())
}

#[test]
fn test_graph_serde_round_trip() -> Result<()> {
    let graph = crossed_parallel()?;
    let json = serde_json::to_string(&graph)?;
    let parsed: ProcessGraph = serde_json::from_str(&json)?;
    assert_eq!(parsed, graph);
    Ok(())
}

#[test]
fn test_validation_errors_name_the_node() {
    let mut graph = ProcessGraph::new("broken");
    graph.add_node(Node::start("s")).unwrap();
    graph.add_node(Node::split("g", GatewayKind::Exclusive)).unwrap();
    graph.add_node(Node::end("e")).unwrap();
    graph.add_flow(Flow::new("f1", "s", "g")).unwrap();
    graph.add_flow(Flow::new("f2", "s", "e")).unwrap();

    let err = validate(&graph).unwrap_err();
    assert!(matches!(&err, GraphError::InvalidArity { node, .. } if node == "g"));
    assert!(err.to_string().contains("node g"));
}
