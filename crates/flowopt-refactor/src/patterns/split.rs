//! Split patterns
//!
//! A task right after a parallel split is hoisted in front of the split. A
//! task right after an exclusive split lets the whole choice block run
//! alongside the activity preceding the split, when they share no resource.

use flowopt_error::{RefactorError, RefactorResult};
use flowopt_graph::{GatewayKind, Node};

use super::{PatternKind, RefactoringPattern, RewriteContext};

//-----------------------------------------------------------------------------
// Parallel split
//-----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ParallelSplitPattern;

impl ParallelSplitPattern {
    pub fn new() -> Self {
        Self
    }
}

impl RefactoringPattern for ParallelSplitPattern {
    fn name(&self) -> &str {
        "parallel-split"
    }

    fn description(&self) -> &str {
        "Moves a task from a parallel branch in front of the split"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::ParallelSplit
    }

    fn handles(&self, predecessor: &Node) -> bool {
        predecessor.is_split() && predecessor.gateway_kind() == Some(GatewayKind::Parallel)
    }

    fn apply(&self, ctx: &mut RewriteContext<'_>, predecessor: &Node) -> RefactorResult<()> {
        let task = ctx.task;
        ctx.task_activity()?;
        let split = predecessor.id.as_str();

        let link = ctx.incoming_flow(task)?;
        let exit = ctx.outgoing_flow(task)?;
        let before = ctx.incoming_flow(split)?;

        ctx.disconnect(&link.id)?;
        ctx.disconnect(&exit.id)?;
        ctx.connect(split, &exit.target)?;

        ctx.disconnect(&before.id)?;
        ctx.connect(&before.source, task)?;
        ctx.connect(task, split)?;
        Ok(())
    }
}

//-----------------------------------------------------------------------------
// Exclusive split
//-----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ExclusiveSplitPattern;

impl ExclusiveSplitPattern {
    pub fn new() -> Self {
        Self
    }
}

impl RefactoringPattern for ExclusiveSplitPattern {
    fn name(&self) -> &str {
        "exclusive-split"
    }

    fn description(&self) -> &str {
        "Runs a choice block in parallel with the activity preceding it"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::ExclusiveSplit
    }

    fn handles(&self, predecessor: &Node) -> bool {
        predecessor.is_split() && predecessor.gateway_kind() == Some(GatewayKind::Exclusive)
    }

    fn apply(&self, ctx: &mut RewriteContext<'_>, predecessor: &Node) -> RefactorResult<()> {
        let original = ctx.original;
        let split = predecessor.id.as_str();
        if original.is_loop_split(split) {
            return Err(ctx.decline(format!("{split} closes a loop")));
        }

        let before = original
            .first_incoming(split)
            .ok_or_else(|| ctx.decline(format!("nothing precedes {split}")))?;
        let Some(previous) = original.activity(&before.source) else {
            return Err(ctx.decline(format!("{} before {split} is not an activity", before.source)));
        };
        let merge = original
            .get_merge_node(split)
            .ok_or_else(|| RefactorError::UnbalancedRegion(split.to_string()))?;
        let used = original.resources_between(split, &merge.id);
        if !previous.resources.is_disjoint(&used) {
            return Err(ctx.decline(format!("{} shares resources with the choice", before.source)));
        }

        let activity = before.source.as_str();
        let merge = merge.id.as_str();
        let entry = ctx.incoming_flow(activity)?;
        let exit = ctx.outgoing_flow(merge)?;

        ctx.disconnect(&before.id)?;
        let (fork, gather) = ctx.add_parallel_block()?;
        ctx.connect(&fork, split)?;
        ctx.connect(&fork, activity)?;
        ctx.connect(merge, &gather)?;
        ctx.connect(activity, &gather)?;

        ctx.connect(&entry.source, &fork)?;
        ctx.disconnect(&entry.id)?;
        ctx.connect(&gather, &exit.target)?;
        ctx.disconnect(&exit.id)?;
        Ok(())
    }
}
