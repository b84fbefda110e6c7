//! Sequence pattern
//!
//! `X -> pred -> task -> Y` with no shared resource becomes
//! `X -> split -> {pred, task} -> join -> Y`.

use flowopt_error::RefactorResult;
use flowopt_graph::Node;

use super::{PatternKind, RefactoringPattern, RewriteContext};

#[derive(Debug, Default)]
pub struct SequencePattern;

impl SequencePattern {
    pub fn new() -> Self {
        Self
    }
}

impl RefactoringPattern for SequencePattern {
    fn name(&self) -> &str {
        "sequence"
    }

    fn description(&self) -> &str {
        "Runs two consecutive activities with disjoint resources in parallel"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::Sequence
    }

    fn handles(&self, predecessor: &Node) -> bool {
        predecessor.is_activity()
    }

    fn apply(&self, ctx: &mut RewriteContext<'_>, predecessor: &Node) -> RefactorResult<()> {
        let task = ctx.task;
        let moved = ctx.task_activity()?;
        let Some(before) = predecessor.as_activity() else {
            return Err(ctx.decline("predecessor is not an activity"));
        };
        if moved.shares_resources_with(before) {
            return Err(ctx.decline(format!("shares resources with {}", predecessor.id)));
        }

        let link = ctx.incoming_flow(task)?;
        let entry = ctx.incoming_flow(&predecessor.id)?;
        let exit = ctx.outgoing_flow(task)?;

        ctx.disconnect(&link.id)?;
        let (split, join) = ctx.add_parallel_block()?;
        ctx.connect(&split, task)?;
        ctx.connect(&split, &predecessor.id)?;
        ctx.connect(task, &join)?;
        ctx.connect(&predecessor.id, &join)?;

        ctx.connect(&entry.source, &split)?;
        ctx.disconnect(&entry.id)?;
        ctx.connect(&join, &exit.target)?;
        ctx.disconnect(&exit.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowopt_error::RefactorError;
    use flowopt_graph::testing::sequential_pair;
    use flowopt_graph::{validate, IdGenerator, ProcessBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_disjoint_pair_goes_parallel() {
        let original = sequential_pair().unwrap();
        let mut working = original.clone();
        let mut ids = IdGenerator::new();
        let pred = original.node("a1").unwrap().clone();
        let mut ctx = RewriteContext::new(&original, &mut working, "a2", &mut ids);
        SequencePattern::new().apply(&mut ctx, &pred).unwrap();

        assert!(validate(&working).is_ok());
        assert_eq!(working.parallel_gateways().len(), 2);
        let split = working.successors("s")[0].id.clone();
        let branches: Vec<_> = working.successors(&split).iter().map(|n| n.id.clone()).collect();
        assert_eq!(branches.len(), 2);
        assert!(branches.contains(&"a1".to_string()) && branches.contains(&"a2".to_string()));
        assert!(working.predecessors("e")[0].is_join());
    }

    #[test]
    fn test_shared_resource_declines_without_edits() {
        let original = ProcessBuilder::new("shared")
            .start("s")
            .activity("a1", "A1", 5, ["r1"])
            .activity("a2", "A2", 5, ["r1", "r2"])
            .end("e")
            .flow("f1", "s", "a1")
            .flow("f2", "a1", "a2")
            .flow("f3", "a2", "e")
            .build()
            .unwrap();
        let mut working = original.clone();
        let mut ids = IdGenerator::new();
        let pred = original.node("a1").unwrap().clone();
        let mut ctx = RewriteContext::new(&original, &mut working, "a2", &mut ids);
        let err = SequencePattern::new().apply(&mut ctx, &pred).unwrap_err();

        assert!(matches!(err, RefactorError::UnsupportedPattern { .. }));
        assert_eq!(working, original);
    }
}
