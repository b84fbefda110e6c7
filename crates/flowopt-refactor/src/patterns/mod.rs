//! Refactoring Patterns
//!
//! Rewrites that let a task start earlier. The pattern is chosen by the kind
//! of node right before the task; a pattern either edits the working copy or
//! declines with [`RefactorError::UnsupportedPattern`] before touching it.

pub mod context;
pub mod merge;
pub mod sequence;
pub mod split;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use flowopt_error::{RefactorError, RefactorResult};
use flowopt_graph::{IdGenerator, Node, ProcessGraph};

pub use context::RewriteContext;
pub use merge::{compute_preceding_merges, MergePattern};
pub use sequence::SequencePattern;
pub use split::{ExclusiveSplitPattern, ParallelSplitPattern};

/// Which rewrite was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    #[serde(rename = "SEQ")]
    Sequence,
    #[serde(rename = "MERGE")]
    Merge,
    #[serde(rename = "PSPLIT")]
    ParallelSplit,
    #[serde(rename = "ESPLIT")]
    ExclusiveSplit,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PatternKind::Sequence => "SEQ",
            PatternKind::Merge => "MERGE",
            PatternKind::ParallelSplit => "PSPLIT",
            PatternKind::ExclusiveSplit => "ESPLIT",
        };
        f.write_str(tag)
    }
}

/// A rewrite moving a task earlier
pub trait RefactoringPattern: fmt::Debug {
    /// Name of the pattern
    fn name(&self) -> &str;

    /// Description of what the pattern does
    fn description(&self) -> &str;

    fn kind(&self) -> PatternKind;

    /// Whether this pattern is responsible for tasks preceded by `predecessor`
    fn handles(&self, predecessor: &Node) -> bool;

    /// Rewrite `ctx.working`, or decline leaving it untouched
    fn apply(&self, ctx: &mut RewriteContext<'_>, predecessor: &Node) -> RefactorResult<()>;
}

/// Ordered set of patterns consulted by [`PatternCatalog::refactor`]
#[derive(Debug)]
pub struct PatternCatalog {
    patterns: Vec<Box<dyn RefactoringPattern>>,
}

impl Default for PatternCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog
            .register(SequencePattern::new())
            .register(MergePattern::new())
            .register(ParallelSplitPattern::new())
            .register(ExclusiveSplitPattern::new());
        catalog
    }
}

impl PatternCatalog {
    /// Catalog without any pattern
    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    pub fn register<P: RefactoringPattern + 'static>(&mut self, pattern: P) -> &mut Self {
        self.patterns.push(Box::new(pattern));
        self
    }

    pub fn patterns(&self) -> impl Iterator<Item = &dyn RefactoringPattern> {
        self.patterns.iter().map(|p| p.as_ref())
    }

    /// Move `task` earlier in `working`, a copy of `original`
    pub fn refactor(
        &self,
        original: &ProcessGraph,
        working: &mut ProcessGraph,
        task: &str,
        ids: &mut IdGenerator,
    ) -> RefactorResult<PatternKind> {
        let node = original
            .node(task)
            .ok_or_else(|| RefactorError::UnknownTask(task.to_string()))?;
        if !node.is_activity() {
            return Err(RefactorError::NotAnActivity(task.to_string()));
        }
        let predecessors = original.predecessors(task);
        let [predecessor] = predecessors.as_slice() else {
            return Err(RefactorError::unsupported(task, "task needs a single predecessor"));
        };
        let predecessor = (*predecessor).clone();

        let Some(pattern) = self.patterns.iter().find(|p| p.handles(&predecessor)) else {
            debug!(task, predecessor = %predecessor.id, "no pattern for predecessor");
            return Err(RefactorError::unsupported(
                task,
                format!("no pattern after {} {}", predecessor.class_name(), predecessor.id),
            ));
        };

        let mut ctx = RewriteContext::new(original, working, task, ids);
        match pattern.apply(&mut ctx, &predecessor) {
            Ok(()) => {
                debug!(task, pattern = %pattern.kind(), "rewrite applied");
                Ok(pattern.kind())
            }
            Err(err) => {
                debug!(task, pattern = pattern.name(), error = %err, "rewrite declined");
                Err(err)
            }
        }
    }
}

/// Move `task` earlier with the default patterns
pub fn refactor(
    original: &ProcessGraph,
    working: &mut ProcessGraph,
    task: &str,
    ids: &mut IdGenerator,
) -> RefactorResult<PatternKind> {
    PatternCatalog::default().refactor(original, working, task, ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowopt_graph::testing::{disjoint_chain, retry_loop, sequential_pair, split_after_task, task_after_join};
    use flowopt_graph::validate;
    use pretty_assertions::assert_eq;

    fn kind_for(graph: &ProcessGraph, task: &str) -> RefactorResult<PatternKind> {
        let mut working = graph.clone();
        let mut ids = IdGenerator::new();
        refactor(graph, &mut working, task, &mut ids)
    }

    #[test]
    fn test_dispatch_by_predecessor() {
        assert_eq!(kind_for(&sequential_pair().unwrap(), "a2"), Ok(PatternKind::Sequence));
        assert_eq!(kind_for(&task_after_join().unwrap(), "a3"), Ok(PatternKind::Merge));
        assert_eq!(kind_for(&split_after_task().unwrap(), "t2"), Ok(PatternKind::ParallelSplit));
    }

    #[test]
    fn test_task_after_start_is_unsupported() {
        let err = kind_for(&disjoint_chain().unwrap(), "a1").unwrap_err();
        assert!(matches!(err, RefactorError::UnsupportedPattern { .. }));
    }

    #[test]
    fn test_unknown_and_non_activity_tasks() {
        let graph = sequential_pair().unwrap();
        assert_eq!(kind_for(&graph, "zz"), Err(RefactorError::UnknownTask("zz".into())));
        assert_eq!(kind_for(&graph, "e"), Err(RefactorError::NotAnActivity("e".into())));
    }

    #[test]
    fn test_declined_rewrite_leaves_working_copy() {
        let graph = retry_loop().unwrap();
        let mut working = graph.clone();
        let mut ids = IdGenerator::new();
        assert!(refactor(&graph, &mut working, "a1", &mut ids).is_err());
        assert_eq!(working, graph);
    }

    #[test]
    fn test_shared_generator_never_reuses_ids() {
        let graph = disjoint_chain().unwrap();
        let mut ids = IdGenerator::new();
        let mut first = graph.clone();
        refactor(&graph, &mut first, "a2", &mut ids).unwrap();
        let mut second = graph.clone();
        refactor(&graph, &mut second, "a3", &mut ids).unwrap();

        assert!(validate(&first).is_ok() && validate(&second).is_ok());
        let fresh = |g: &ProcessGraph| -> Vec<String> {
            g.parallel_gateways().iter().map(|n| n.id.clone()).collect()
        };
        assert!(fresh(&first).iter().all(|id| !fresh(&second).contains(id)));
    }

    #[test]
    fn test_pattern_tags() {
        assert_eq!(PatternKind::ExclusiveSplit.to_string(), "ESPLIT");
        assert_eq!(serde_json::to_string(&PatternKind::Merge).unwrap(), "\"MERGE\"");
        assert_eq!(PatternCatalog::default().patterns().count(), 4);
    }
}
