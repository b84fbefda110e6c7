// Structural validation of process graphs

use flowopt_error::{ensure, GraphError, GraphResult};

use crate::{NodeKind, ProcessGraph};

/// Check the structural invariants every simulation and rewrite relies on.
///
/// The first violation found is returned.
pub fn validate(graph: &ProcessGraph) -> GraphResult<()> {
    check_invariants(graph).map_err(|err| {
        tracing::debug!(graph = graph.name(), error = %err, "graph failed validation");
        err
    })
}

fn check_invariants(graph: &ProcessGraph) -> GraphResult<()> {
    let starts: Vec<_> = graph.nodes().filter(|n| n.is_start()).collect();
    match starts.len() {
        0 => return Err(GraphError::MissingStart),
        1 => {}
        _ => {
            return Err(GraphError::MultipleStarts(
                starts.iter().map(|n| n.id.clone()).collect(),
            ))
        }
    }

    ensure!(!graph.end_nodes().is_empty(), GraphError::MissingEnd);

    for flow in graph.flows() {
        for endpoint in [&flow.source, &flow.target] {
            if !graph.contains_node(endpoint) {
                return Err(GraphError::dangling(flow.id.clone(), endpoint.clone()));
            }
        }
    }

    for node in graph.nodes() {
        let incoming = graph.incoming(&node.id).len();
        let outgoing = graph.outgoing(&node.id).len();
        let reason = match node.kind {
            NodeKind::Start if incoming != 0 => Some(format!("has {incoming} incoming flow(s)")),
            NodeKind::Start if outgoing != 1 => Some(format!("needs one outgoing flow, has {outgoing}")),
            NodeKind::End if incoming == 0 => Some("has no incoming flow".to_string()),
            NodeKind::End if outgoing != 0 => Some(format!("has {outgoing} outgoing flow(s)")),
            NodeKind::Activity(_) if incoming != 1 || outgoing != 1 => Some(format!(
                "needs one incoming and one outgoing flow, has {incoming} and {outgoing}"
            )),
            NodeKind::Split(_) if incoming != 1 || outgoing == 0 => Some(format!(
                "needs one incoming and at least one outgoing flow, has {incoming} and {outgoing}"
            )),
            NodeKind::Join(_) if incoming == 0 || outgoing != 1 => Some(format!(
                "needs at least one incoming and one outgoing flow, has {incoming} and {outgoing}"
            )),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(GraphError::arity(node.id.clone(), reason));
        }
    }

    Ok(())
}
