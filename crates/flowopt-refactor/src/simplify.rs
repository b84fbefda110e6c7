//! Graph Simplification
//!
//! Clean-up passes run after every rewrite. Rewrites stack gateway pairs on
//! top of each other; these passes drop the flows and gateways that no
//! longer carry any ordering.

use tracing::trace;

use flowopt_error::RefactorResult;
use flowopt_graph::{Flow, FlowStrength, ProcessGraph};

/// A clean-up pass over a process graph
pub trait Simplification: std::fmt::Debug {
    /// Name of the pass
    fn name(&self) -> &str;

    /// Apply the pass once; returns whether the graph changed
    fn apply(&self, graph: &mut ProcessGraph) -> RefactorResult<bool>;
}

/// Drops duplicate flows between two gateways, and flows between two
/// parallel gateways that are connected by another path anyway.
#[derive(Debug, Default)]
pub struct RedundantFlowPruning;

impl Simplification for RedundantFlowPruning {
    fn name(&self) -> &str {
        "redundant_flow_pruning"
    }

    fn apply(&self, graph: &mut ProcessGraph) -> RefactorResult<bool> {
        let mut changed = false;
        let ids: Vec<_> = graph.flows().map(|f| f.id.clone()).collect();

        for id in ids {
            let Some(flow) = graph.flow(&id) else {
                continue;
            };
            let (Some(source), Some(target)) = (graph.node(&flow.source), graph.node(&flow.target)) else {
                continue;
            };
            if !source.is_gateway() || !target.is_gateway() {
                continue;
            }

            let duplicated = graph.count_flows_between(&source.id, &target.id) > 1;
            let bypassed = source.is_parallel_gateway()
                && target.is_parallel_gateway()
                && graph.is_reachable_without(&source.id, &target.id, &id);
            if duplicated || bypassed {
                trace!(flow = %id, duplicated, "pruning flow");
                graph.remove_flow(&id);
                changed = true;
            }
        }
        Ok(changed)
    }
}

/// Replaces a gateway with a single incoming and a single outgoing flow by
/// one direct flow under the incoming flow's identifier. The bridge is strong
/// only when both replaced flows were.
#[derive(Debug, Default)]
pub struct GatewayCollapsing;

impl Simplification for GatewayCollapsing {
    fn name(&self) -> &str {
        "gateway_collapsing"
    }

    fn apply(&self, graph: &mut ProcessGraph) -> RefactorResult<bool> {
        let mut changed = false;
        let gateways: Vec<_> = graph
            .nodes()
            .filter(|n| n.is_gateway())
            .map(|n| n.id.clone())
            .collect();

        for id in gateways {
            let incoming = graph.incoming(&id);
            let outgoing = graph.outgoing(&id);
            let ([entry], [exit]) = (incoming.as_slice(), outgoing.as_slice()) else {
                continue;
            };
            if entry.source == id || exit.target == id {
                continue;
            }
            let strength = if entry.is_strong() && exit.is_strong() {
                FlowStrength::Strong
            } else {
                FlowStrength::Weak
            };
            let bridge = Flow {
                id: entry.id.clone(),
                source: entry.source.clone(),
                target: exit.target.clone(),
                strength,
            };
            let (entry_id, exit_id) = (entry.id.clone(), exit.id.clone());

            trace!(gateway = %id, "collapsing gateway");
            graph.remove_flow(&entry_id);
            graph.remove_flow(&exit_id);
            graph.remove_node(&id);
            graph.add_flow(bridge)?;
            changed = true;
        }
        Ok(changed)
    }
}

/// Apply both passes until neither changes the graph
pub fn simplify(graph: &ProcessGraph) -> RefactorResult<ProcessGraph> {
    let passes: [&dyn Simplification; 2] = [&RedundantFlowPruning, &GatewayCollapsing];
    let mut simplified = graph.clone();
    let mut rounds = 0;

    loop {
        rounds += 1;
        let mut changed = false;
        for pass in passes {
            if pass.apply(&mut simplified)? {
                trace!(pass = pass.name(), round = rounds, "pass changed graph");
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    Ok(simplified)
}
