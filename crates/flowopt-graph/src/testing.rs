//! Test fixtures and generators for process graphs
//!
//! Named fixture processes used across the workspace's test suites, and a
//! quickcheck generator of well-formed series-parallel processes.

use std::collections::BTreeSet;

use quickcheck::{Arbitrary, Gen};

use flowopt_error::GraphResult;

use crate::{Activity, Flow, GatewayKind, Node, NodeId, ProcessBuilder, ProcessGraph};

//-----------------------------------------------------------------------------
// Fixtures
//-----------------------------------------------------------------------------

/// s -> a1(10, r1) -> a2(10, r2 r3) -> e
pub fn sequential_pair() -> GraphResult<ProcessGraph> {
    ProcessBuilder::new("sequential-pair")
        .start("s")
        .activity("a1", "A1", 10, ["r1"])
        .activity("a2", "A2", 10, ["r2", "r3"])
        .end("e")
        .flow("f1", "s", "a1")
        .flow("f2", "a1", "a2")
        .flow("f3", "a2", "e")
        .build()
}

/// Two branches competing for the same employee and drone
pub fn drone_contention() -> GraphResult<ProcessGraph> {
    ProcessBuilder::new("drone-contention")
        .start("s")
        .split("g1", GatewayKind::Parallel)
        .activity("a1", "A1", 10, ["employee", "drone"])
        .activity("a3", "A3", 20, ["employee", "drone"])
        .join("g2", GatewayKind::Parallel)
        .end("e")
        .flow("f1", "s", "g1")
        .flow("f2", "g1", "a1")
        .flow("f3", "g1", "a3")
        .flow("f4", "a1", "g2")
        .flow("f5", "a3", "g2")
        .flow("f6", "g2", "e")
        .build()
}

/// s -> a1(10, r1) -> a2(10, r2 r3) -> a3(10, r4 r5) -> e
pub fn disjoint_chain() -> GraphResult<ProcessGraph> {
    ProcessBuilder::new("disjoint-chain")
        .start("s")
        .activity("a1", "A1", 10, ["r1"])
        .activity("a2", "A2", 10, ["r2", "r3"])
        .activity("a3", "A3", 10, ["r4", "r5"])
        .end("e")
        .flow("f1", "s", "a1")
        .flow("f2", "a1", "a2")
        .flow("f3", "a2", "a3")
        .flow("f4", "a3", "e")
        .build()
}

/// Exclusive choice between two tasks of equal length
pub fn exclusive_choice() -> GraphResult<ProcessGraph> {
    ProcessBuilder::new("exclusive-choice")
        .start("s")
        .split("g1", GatewayKind::Exclusive)
        .activity("a1", "A1", 10, ["employee"])
        .activity("a2", "A2", 10, ["employee", "drone"])
        .join("g2", GatewayKind::Exclusive)
        .end("e")
        .flow("f1", "s", "g1")
        .flow("f2", "g1", "a1")
        .flow("f3", "g1", "a2")
        .flow("f4", "a1", "g2")
        .flow("f5", "a2", "g2")
        .flow("f6", "g2", "e")
        .build()
}

/// t1 -> par{t2(50, r2), t3(20, r1)}; t3 competes with t1
pub fn split_after_task() -> GraphResult<ProcessGraph> {
    ProcessBuilder::new("split-after-task")
        .start("s")
        .activity("t1", "T1", 20, ["r1"])
        .split("g1", GatewayKind::Parallel)
        .activity("t2", "T2", 50, ["r2"])
        .activity("t3", "T3", 20, ["r1"])
        .join("g2", GatewayKind::Parallel)
        .end("e")
        .flow("f1", "s", "t1")
        .flow("f2", "t1", "g1")
        .flow("f3", "g1", "t2")
        .flow("f4", "g1", "t3")
        .flow("f5", "t2", "g2")
        .flow("f6", "t3", "g2")
        .flow("f7", "g2", "e")
        .build()
}

/// par{a1, a2} -> a3, a3 shares nothing with the branches
pub fn task_after_join() -> GraphResult<ProcessGraph> {
    ProcessBuilder::new("task-after-join")
        .start("s")
        .split("g1", GatewayKind::Parallel)
        .activity("a1", "A1", 10, ["r1"])
        .activity("a2", "A2", 10, ["r2", "r3"])
        .join("g2", GatewayKind::Parallel)
        .activity("a3", "A3", 10, ["r4", "r5"])
        .end("e")
        .flow("f1", "s", "g1")
        .flow("f2", "g1", "a1")
        .flow("f3", "g1", "a2")
        .flow("f4", "a1", "g2")
        .flow("f5", "a2", "g2")
        .flow("f6", "g2", "a3")
        .flow("f7", "a3", "e")
        .build()
}

/// Retry loop around a single task
pub fn retry_loop() -> GraphResult<ProcessGraph> {
    ProcessBuilder::new("retry-loop")
        .start("s")
        .join("xj", GatewayKind::Exclusive)
        .activity("a1", "A1", 3, ["r1"])
        .split("xs", GatewayKind::Exclusive)
        .end("e")
        .flow("f1", "s", "xj")
        .flow("f2", "xj", "a1")
        .flow("f3", "a1", "xs")
        .flow("f4", "xs", "xj")
        .flow("f5", "xs", "e")
        .build()
}

//-----------------------------------------------------------------------------
// Generators
//-----------------------------------------------------------------------------

const RESOURCE_POOL: [&str; 4] = ["r1", "r2", "r3", "r4"];

/// Block-structured process fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessShape {
    Task { duration: u32, resources: BTreeSet<String> },
    Sequence(Vec<ProcessShape>),
    Parallel(Vec<ProcessShape>),
    Choice(Vec<ProcessShape>),
}

impl ProcessShape {
    fn generate(g: &mut Gen, depth: usize, choices: bool) -> Self {
        let leaf = depth == 0 || u8::arbitrary(g) % 3 == 0;
        if leaf {
            let duration = u32::arbitrary(g) % 12;
            let count = 1 + usize::arbitrary(g) % 2;
            let resources = (0..count)
                .filter_map(|_| g.choose(&RESOURCE_POOL).map(|r| r.to_string()))
                .collect();
            return ProcessShape::Task { duration, resources };
        }
        let width = 2 + usize::arbitrary(g) % 2;
        let children = (0..width)
            .map(|_| Self::generate(g, depth - 1, choices))
            .collect();
        let variants = if choices { 3 } else { 2 };
        match u8::arbitrary(g) % variants {
            0 => ProcessShape::Sequence(children),
            1 => ProcessShape::Parallel(children),
            _ => ProcessShape::Choice(children),
        }
    }

    /// Whether the fragment contains an exclusive choice
    pub fn has_choice(&self) -> bool {
        match self {
            ProcessShape::Task { .. } => false,
            ProcessShape::Choice(_) => true,
            ProcessShape::Sequence(children) | ProcessShape::Parallel(children) => {
                children.iter().any(ProcessShape::has_choice)
            }
        }
    }

    /// Assemble the fragment between a Start and an End node
    pub fn to_graph(&self, name: &str) -> GraphResult<ProcessGraph> {
        let mut assembler = Assembler {
            graph: ProcessGraph::new(name),
            next_node: 0,
            next_flow: 0,
        };
        assembler.graph.add_node(Node::start("s"))?;
        assembler.graph.add_node(Node::end("e"))?;
        let (entry, exit) = assembler.emit(self)?;
        assembler.connect("s", &entry)?;
        assembler.connect(&exit, "e")?;
        Ok(assembler.graph)
    }
}

struct Assembler {
    graph: ProcessGraph,
    next_node: usize,
    next_flow: usize,
}

impl Assembler {
    fn connect(&mut self, source: &str, target: &str) -> GraphResult<()> {
        self.next_flow += 1;
        let id = format!("f{:03}", self.next_flow);
        self.graph.add_flow(Flow::new(id, source, target))
    }

    fn emit(&mut self, shape: &ProcessShape) -> GraphResult<(NodeId, NodeId)> {
        self.next_node += 1;
        let n = self.next_node;
        match shape {
            ProcessShape::Task { duration, resources } => {
                let id = format!("t{n}");
                let activity = Activity::new(format!("T{n}"), *duration, resources.iter().cloned());
                self.graph.add_node(Node::activity(id.clone(), activity))?;
                Ok((id.clone(), id))
            }
            ProcessShape::Sequence(children) => {
                let mut bounds: Option<(NodeId, NodeId)> = None;
                for child in children {
                    let (entry, exit) = self.emit(child)?;
                    bounds = match bounds {
                        None => Some((entry, exit)),
                        Some((first, previous)) => {
                            self.connect(&previous, &entry)?;
                            Some((first, exit))
                        }
                    };
                }
                // Empty sequences are never generated; fall back to a no-op task.
                match bounds {
                    Some(bounds) => Ok(bounds),
                    None => self.emit(&ProcessShape::Task { duration: 0, resources: BTreeSet::new() }),
                }
            }
            ProcessShape::Parallel(children) => self.emit_block(n, GatewayKind::Parallel, children),
            ProcessShape::Choice(children) => self.emit_block(n, GatewayKind::Exclusive, children),
        }
    }

    fn emit_block(
        &mut self,
        n: usize,
        kind: GatewayKind,
        children: &[ProcessShape],
    ) -> GraphResult<(NodeId, NodeId)> {
        let split = format!("gs{n}");
        let join = format!("gj{n}");
        self.graph.add_node(Node::split(split.clone(), kind))?;
        self.graph.add_node(Node::join(join.clone(), kind))?;
        for child in children {
            let (entry, exit) = self.emit(child)?;
            self.connect(&split, &entry)?;
            self.connect(&exit, &join)?;
        }
        Ok((split, join))
    }
}

impl Arbitrary for ProcessShape {
    fn arbitrary(g: &mut Gen) -> Self {
        ProcessShape::generate(g, 3, true)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            ProcessShape::Task { .. } => quickcheck::empty_shrinker(),
            ProcessShape::Sequence(children)
            | ProcessShape::Parallel(children)
            | ProcessShape::Choice(children) => Box::new(children.clone().into_iter()),
        }
    }
}

/// Series-parallel fragment without exclusive choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelShape(pub ProcessShape);

impl Arbitrary for ParallelShape {
    fn arbitrary(g: &mut Gen) -> Self {
        ParallelShape(ProcessShape::generate(g, 3, false))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(ParallelShape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_fixtures_are_valid() {
        for graph in [
            sequential_pair(),
            drone_contention(),
            disjoint_chain(),
            exclusive_choice(),
            split_after_task(),
            task_after_join(),
            retry_loop(),
        ] {
            let graph = graph.unwrap();
            assert_eq!(validate(&graph), Ok(()), "{}", graph.name());
        }
    }

    #[quickcheck]
    fn generated_processes_are_valid(shape: ProcessShape) -> bool {
        shape
            .to_graph("generated")
            .map(|graph| validate(&graph).is_ok())
            .unwrap_or(false)
    }

    #[quickcheck]
    fn generated_blocks_are_balanced(shape: ProcessShape) -> bool {
        let Ok(graph) = shape.to_graph("generated") else {
            return false;
        };
        graph
            .splits()
            .iter()
            .all(|split| graph.get_merge_node(&split.id).is_some())
    }

    #[quickcheck]
    fn parallel_shapes_have_no_choice(shape: ParallelShape) -> bool {
        !shape.0.has_choice()
    }
}
