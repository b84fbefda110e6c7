//! Rewrite Context
//!
//! Everything a pattern touches during one rewrite: the graph it reads its
//! preconditions from, the copy it edits, the task being moved and the
//! identifier source shared by the whole search.

use flowopt_error::{GraphError, RefactorError, RefactorResult};
use flowopt_graph::{Activity, Flow, FlowId, GatewayKind, IdGenerator, Node, NodeId, ProcessGraph};

/// State of a single rewrite
#[derive(Debug)]
pub struct RewriteContext<'a> {
    /// Graph the preconditions are checked against
    pub original: &'a ProcessGraph,
    /// Copy receiving the edits
    pub working: &'a mut ProcessGraph,
    /// Activity to move earlier
    pub task: &'a str,
    pub ids: &'a mut IdGenerator,
}

impl<'a> RewriteContext<'a> {
    pub fn new(
        original: &'a ProcessGraph,
        working: &'a mut ProcessGraph,
        task: &'a str,
        ids: &'a mut IdGenerator,
    ) -> Self {
        Self {
            original,
            working,
            task,
            ids,
        }
    }

    /// The moved task as found in the original graph
    pub fn task_activity(&self) -> RefactorResult<&'a Activity> {
        let original: &'a ProcessGraph = self.original;
        match original.node(self.task) {
            Some(node) => node
                .as_activity()
                .ok_or_else(|| RefactorError::NotAnActivity(self.task.to_string())),
            None => Err(RefactorError::UnknownTask(self.task.to_string())),
        }
    }

    /// Error declining the rewrite of the current task
    pub fn decline(&self, reason: impl Into<String>) -> RefactorError {
        RefactorError::unsupported(self.task, reason)
    }

    //-------------------------------------------------------------------------
    // Lookups on the working copy
    //-------------------------------------------------------------------------

    /// The single flow entering `node`
    pub fn incoming_flow(&self, node: &str) -> RefactorResult<Flow> {
        self.working
            .first_incoming(node)
            .cloned()
            .ok_or_else(|| GraphError::arity(node, "has no incoming flow").into())
    }

    /// The single flow leaving `node`
    pub fn outgoing_flow(&self, node: &str) -> RefactorResult<Flow> {
        self.working
            .first_outgoing(node)
            .cloned()
            .ok_or_else(|| GraphError::arity(node, "has no outgoing flow").into())
    }

    //-------------------------------------------------------------------------
    // Edits on the working copy
    //-------------------------------------------------------------------------

    /// Add a weak flow with a fresh identifier
    pub fn connect(&mut self, source: &str, target: &str) -> RefactorResult<FlowId> {
        let id = self.ids.flow(self.working);
        self.working.add_flow(Flow::new(id.clone(), source, target))?;
        Ok(id)
    }

    pub fn disconnect(&mut self, flow: &str) -> RefactorResult<Flow> {
        self.working
            .remove_flow(flow)
            .ok_or_else(|| GraphError::UnknownFlow(flow.to_string()).into())
    }

    /// Fresh parallel split and join, unconnected
    pub fn add_parallel_block(&mut self) -> RefactorResult<(NodeId, NodeId)> {
        let split = self.add_parallel_split()?;
        let join = self.add_parallel_join()?;
        Ok((split, join))
    }

    pub fn add_parallel_split(&mut self) -> RefactorResult<NodeId> {
        let id = self.ids.gateway(self.working);
        self.working.add_node(Node::split(id.clone(), GatewayKind::Parallel))?;
        Ok(id)
    }

    pub fn add_parallel_join(&mut self) -> RefactorResult<NodeId> {
        let id = self.ids.gateway(self.working);
        self.working.add_node(Node::join(id.clone(), GatewayKind::Parallel))?;
        Ok(id)
    }

    /// Copy of the moved task under a fresh `<task>_<n>` identifier
    pub fn add_task_copy(&mut self) -> RefactorResult<NodeId> {
        let activity = self.task_activity()?.clone();
        let id = self.ids.task_copy(self.working, self.task);
        self.working.add_node(Node::activity(id.clone(), activity))?;
        Ok(id)
    }

    /// Detach the moved task and bridge its predecessor to its successor
    pub fn remove_task(&mut self) -> RefactorResult<()> {
        let task = self.task;
        let entry = self.incoming_flow(task)?;
        let exit = self.outgoing_flow(task)?;
        self.disconnect(&entry.id)?;
        self.disconnect(&exit.id)?;
        self.connect(&entry.source, &exit.target)?;
        self.working.remove_node(task);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowopt_graph::testing::sequential_pair;
    use flowopt_graph::validate;

    #[test]
    fn test_remove_task_bridges_neighbours() {
        let original = sequential_pair().unwrap();
        let mut working = original.clone();
        let mut ids = IdGenerator::new();
        let mut ctx = RewriteContext::new(&original, &mut working, "a1", &mut ids);
        ctx.remove_task().unwrap();

        assert!(!working.contains_node("a1"));
        assert_eq!(working.successors("s")[0].id, "a2");
        assert!(validate(&working).is_ok());
    }

    #[test]
    fn test_task_lookup_errors() {
        let original = sequential_pair().unwrap();
        let mut working = original.clone();
        let mut ids = IdGenerator::new();

        let ctx = RewriteContext::new(&original, &mut working, "ghost", &mut ids);
        assert_eq!(ctx.task_activity().unwrap_err(), RefactorError::UnknownTask("ghost".into()));

        let ctx = RewriteContext::new(&original, &mut working, "s", &mut ids);
        assert_eq!(ctx.task_activity().unwrap_err(), RefactorError::NotAnActivity("s".into()));
    }

    #[test]
    fn test_copies_get_fresh_ids() {
        let original = sequential_pair().unwrap();
        let mut working = original.clone();
        let mut ids = IdGenerator::new();
        let mut ctx = RewriteContext::new(&original, &mut working, "a2", &mut ids);
        let first = ctx.add_task_copy().unwrap();
        let second = ctx.add_task_copy().unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("a2_"));
        assert_eq!(working.activity(&first), original.activity("a2"));
    }
}
