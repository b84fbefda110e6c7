//! Merge pattern
//!
//! A task right after a join is pushed into the branches feeding the join,
//! and into the branches of every join cascading into it. Each branch gets
//! its own copy of the task; the task itself is removed once all joins of the
//! chain have been handled.
//!
//! Exclusive joins copy the task into every non-join branch. The copy runs
//! alongside the branch's last activity when they share no resource, after
//! it otherwise. Parallel joins look at the activities feeding them:
//!
//! - none sharing a resource with the task: a copy is hoisted in front of
//!   the whole parallel block
//! - one sharing: the copy runs right after that activity
//! - several but not all sharing: an extra parallel join gathers them and
//!   the copy runs after it
//! - all sharing: the rewrite is declined

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use flowopt_error::{GraphError, RefactorResult};
use flowopt_graph::{Activity, GatewayKind, Node, NodeId, ProcessGraph};

use super::{PatternKind, RefactoringPattern, RewriteContext};

/// Joins cascading into `merge`, `merge` first, in breadth-first order.
///
/// The flag is set when some join directly feeds a parallel join.
pub fn compute_preceding_merges(graph: &ProcessGraph, merge: &str) -> (bool, Vec<NodeId>) {
    let mut chain = vec![merge.to_string()];
    let mut visited = BTreeSet::from([merge.to_string()]);
    let mut queue = VecDeque::from([merge.to_string()]);
    let mut join_before_parallel = false;

    while let Some(current) = queue.pop_front() {
        let parallel = graph
            .node(&current)
            .and_then(Node::gateway_kind)
            .is_some_and(|k| k == GatewayKind::Parallel);
        for source in graph.predecessors(&current) {
            if !source.is_join() {
                continue;
            }
            if parallel {
                join_before_parallel = true;
            }
            if visited.insert(source.id.clone()) {
                chain.push(source.id.clone());
                queue.push_back(source.id.clone());
            }
        }
    }
    (join_before_parallel, chain)
}

/// Edits planned for one join of the chain
#[derive(Debug, Clone, PartialEq, Eq)]
enum MergeStep {
    /// Copy into every non-join branch of an exclusive join
    Exclusive { merge: NodeId },
    /// Copy in front of the parallel block
    Hoist { merge: NodeId },
    /// Copy after the single competing branch
    AfterOne { merge: NodeId, task: NodeId },
    /// Copy after a join gathering the competing branches
    AfterSeveral { merge: NodeId, tasks: Vec<NodeId> },
}

#[derive(Debug, Default)]
pub struct MergePattern;

impl MergePattern {
    pub fn new() -> Self {
        Self
    }

    /// Check every join of the chain before touching the working copy
    fn plan(
        &self,
        ctx: &RewriteContext<'_>,
        moved: &Activity,
        chain: &[NodeId],
    ) -> RefactorResult<Vec<MergeStep>> {
        let graph = ctx.original;
        let mut steps = Vec::with_capacity(chain.len());

        for merge in chain {
            let node = graph
                .node(merge)
                .ok_or_else(|| GraphError::UnknownNode(merge.clone()))?;
            let sources = graph.predecessors(merge);

            match node.gateway_kind() {
                Some(GatewayKind::Exclusive) => {
                    if let Some(other) = sources.iter().find(|s| !s.is_activity() && !s.is_join()) {
                        return Err(ctx.decline(format!(
                            "branch of {merge} ends with {} {}",
                            other.class_name(),
                            other.id
                        )));
                    }
                    steps.push(MergeStep::Exclusive {
                        merge: merge.clone(),
                    });
                }
                Some(GatewayKind::Parallel) => {
                    let activities: Vec<&Node> = sources.iter().copied().filter(|s| s.is_activity()).collect();
                    if activities.is_empty() {
                        return Err(ctx.decline(format!("no activity feeds {merge}")));
                    }
                    let competing: Vec<NodeId> = activities
                        .iter()
                        .filter(|s| s.as_activity().is_some_and(|a| a.shares_resources_with(moved)))
                        .map(|s| s.id.clone())
                        .collect();

                    let step = match competing.len() {
                        0 => MergeStep::Hoist {
                            merge: merge.clone(),
                        },
                        n if n == activities.len() => {
                            return Err(ctx.decline(format!("every branch of {merge} shares a resource")));
                        }
                        1 => MergeStep::AfterOne {
                            merge: merge.clone(),
                            task: competing[0].clone(),
                        },
                        _ => MergeStep::AfterSeveral {
                            merge: merge.clone(),
                            tasks: competing,
                        },
                    };
                    steps.push(step);
                }
                _ => return Err(ctx.decline(format!("unsupported join {merge}"))),
            }
        }

        let copies: usize = steps
            .iter()
            .map(|step| match step {
                MergeStep::Exclusive { merge } => graph
                    .predecessors(merge)
                    .iter()
                    .filter(|s| !s.is_join())
                    .count(),
                _ => 1,
            })
            .sum();
        if copies == 0 {
            return Err(ctx.decline("no branch to copy the task into"));
        }
        Ok(steps)
    }

    fn copy_into_exclusive(&self, ctx: &mut RewriteContext<'_>, merge: &str, moved: &Activity) -> RefactorResult<()> {
        let branches: Vec<_> = ctx.working.incoming(merge).into_iter().cloned().collect();
        for flow in branches {
            let Some(source) = ctx.working.node(&flow.source).cloned() else {
                continue;
            };
            if source.is_join() {
                continue;
            }
            let copy = ctx.add_task_copy()?;
            let parallel = source.as_activity().is_some_and(|a| !a.shares_resources_with(moved));

            if parallel {
                let entry = ctx.incoming_flow(&source.id)?;
                let (split, join) = ctx.add_parallel_block()?;
                ctx.connect(&split, &source.id)?;
                ctx.connect(&split, &copy)?;
                ctx.connect(&source.id, &join)?;
                ctx.connect(&copy, &join)?;
                ctx.connect(&entry.source, &split)?;
                ctx.disconnect(&entry.id)?;
                ctx.connect(&join, merge)?;
                ctx.disconnect(&flow.id)?;
            } else {
                ctx.disconnect(&flow.id)?;
                ctx.connect(&source.id, &copy)?;
                ctx.connect(&copy, merge)?;
            }
        }
        Ok(())
    }

    fn hoist_before_block(&self, ctx: &mut RewriteContext<'_>, merge: &str) -> RefactorResult<()> {
        let copy = ctx.add_task_copy()?;
        let branches: Vec<_> = ctx.working.incoming(merge).into_iter().cloned().collect();

        ctx.connect(&copy, merge)?;
        let split = ctx.add_parallel_split()?;
        ctx.connect(&split, &copy)?;
        let join = ctx.add_parallel_join()?;
        ctx.connect(&join, &split)?;

        for flow in branches {
            let is_activity = ctx.working.node(&flow.source).is_some_and(Node::is_activity);
            if !is_activity {
                continue;
            }
            let entry = ctx.incoming_flow(&flow.source)?;
            ctx.connect(&split, &flow.source)?;
            ctx.connect(&entry.source, &join)?;
            ctx.disconnect(&entry.id)?;
        }
        Ok(())
    }

    fn splice_after(&self, ctx: &mut RewriteContext<'_>, merge: &str, task: &str) -> RefactorResult<()> {
        let copy = ctx.add_task_copy()?;
        let exit = ctx.outgoing_flow(task)?;
        ctx.disconnect(&exit.id)?;
        ctx.connect(task, &copy)?;
        ctx.connect(&copy, merge)?;
        Ok(())
    }

    fn splice_after_gathered(&self, ctx: &mut RewriteContext<'_>, merge: &str, tasks: &[NodeId]) -> RefactorResult<()> {
        let copy = ctx.add_task_copy()?;
        let gather = ctx.add_parallel_join()?;
        ctx.connect(&gather, &copy)?;
        ctx.connect(&copy, merge)?;
        for task in tasks {
            let exit = ctx.outgoing_flow(task)?;
            ctx.disconnect(&exit.id)?;
            ctx.connect(task, &gather)?;
        }
        Ok(())
    }
}

impl RefactoringPattern for MergePattern {
    fn name(&self) -> &str {
        "merge"
    }

    fn description(&self) -> &str {
        "Copies a task placed after a join into the branches feeding it"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::Merge
    }

    fn handles(&self, predecessor: &Node) -> bool {
        predecessor.is_join() && predecessor.gateway_kind() != Some(GatewayKind::Inclusive)
    }

    fn apply(&self, ctx: &mut RewriteContext<'_>, predecessor: &Node) -> RefactorResult<()> {
        let moved = ctx.task_activity()?;
        let (join_before_parallel, chain) = compute_preceding_merges(ctx.original, &predecessor.id);
        if join_before_parallel {
            return Err(ctx.decline("a join feeds a parallel join"));
        }
        if let Some(looping) = chain.iter().find(|m| ctx.original.is_loop_join(m)) {
            return Err(ctx.decline(format!("{looping} closes a loop")));
        }

        let steps = self.plan(ctx, moved, &chain)?;
        debug!(task = ctx.task, joins = chain.len(), "merge rewrite planned");

        for step in &steps {
            match step {
                MergeStep::Exclusive { merge } => self.copy_into_exclusive(ctx, merge, moved)?,
                MergeStep::Hoist { merge } => self.hoist_before_block(ctx, merge)?,
                MergeStep::AfterOne { merge, task } => self.splice_after(ctx, merge, task)?,
                MergeStep::AfterSeveral { merge, tasks } => self.splice_after_gathered(ctx, merge, tasks)?,
            }
        }
        ctx.remove_task()
    }
}
