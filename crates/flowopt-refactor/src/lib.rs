// Graph rewriting for process optimization
// Patterns that let a task start earlier, and the simplifier that cleans up
// the gateways they leave behind.

pub mod patterns;
pub mod simplify;

pub use patterns::{
    compute_preceding_merges, refactor, ExclusiveSplitPattern, MergePattern, ParallelSplitPattern,
    PatternCatalog, PatternKind, RefactoringPattern, RewriteContext, SequencePattern,
};
pub use simplify::{simplify, GatewayCollapsing, RedundantFlowPruning, Simplification};

pub use flowopt_error::{RefactorError, RefactorResult};
