use thiserror::Error;

/// Errors raised while building, compiling, or executing a workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// `Workflow::add` called with a `node_id` already present.
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    /// `Workflow::add` called with the same parent id twice in `depends_on`.
    #[error("node '{node}' lists dependency '{parent}' more than once")]
    DuplicateDependency { node: String, parent: String },

    /// A task name was empty at `TaskDescriptor` construction time.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// `Workflow::add` called with an empty `node_id`.
    #[error("node id must not be empty")]
    EmptyNodeId,

    /// `validate_dag`/`compile` found a `depends_on` id not present in the workflow.
    #[error("node '{node}' depends on missing node '{missing}'")]
    MissingDependency { node: String, missing: String },

    /// A node lists itself as one of its own parents.
    #[error("node '{0}' cannot depend on itself")]
    SelfDependency(String),

    /// Kahn's algorithm visited fewer nodes than are present: the graph is cyclic.
    #[error("workflow contains a cycle")]
    Cycle,

    /// `compile` called on a workflow with zero nodes.
    #[error("workflow has no nodes")]
    EmptyWorkflow,

    /// `ancestor_closure`/`ExtractOne` referenced a node id absent from the workflow.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// A step invocation failed; see the wrapped [`TaskError`] for the kind.
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Errors raised while running a single step (`ExecuteNode`, `ExtractOne`, …)
/// through a substrate adapter.
#[derive(Debug, Error)]
pub enum TaskError {
    /// `ExecuteNode` could not resolve `task_name` in the substrate's registry.
    #[error("task '{0}' is not registered")]
    UnknownTask(String),

    /// A dependency's result was not present in the context at execution time.
    /// Should be unreachable after `validate_dag` + a correct topological order;
    /// guards against hand-built or corrupted plans.
    #[error(
        "node '{node_id}' cannot run: missing dependency results for {missing:?}; available: {available:?}"
    )]
    MissingDependencyResult {
        node_id: String,
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// `ExtractOne`/`ExtractSinks` referenced a node id absent from the context.
    #[error("node '{0}' has no result in the context")]
    MissingContextEntry(String),

    /// The invoked user task itself returned an error.
    #[error("task '{task}' failed: {message}")]
    UserTask { task: String, message: String },

    /// A step's handler did not return within the configured timeout.
    #[error("task '{task}' timed out after {timeout_seconds}s")]
    Timeout { task: String, timeout_seconds: u64 },

    /// A step payload could not be decoded into the shape its handler expects.
    #[error("malformed payload for task '{task}': {message}")]
    MalformedPayload { task: String, message: String },

    /// `pipe()` was called with no steps.
    #[error("cannot run an empty pipeline")]
    EmptyPipeline,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_error_wraps_into_workflow_error() {
        let err: WorkflowError = TaskError::UnknownTask("demo.add".into()).into();
        assert!(err.to_string().contains("demo.add"));
    }

    #[test]
    fn duplicate_node_display() {
        let err = WorkflowError::DuplicateNode("a".into());
        assert_eq!(err.to_string(), "duplicate node id 'a'");
    }

    #[test]
    fn missing_dependency_result_display_includes_both_lists() {
        let err = TaskError::MissingDependencyResult {
            node_id: "join".into(),
            missing: vec!["b".into()],
            available: vec!["a".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("join"));
        assert!(msg.contains("\"b\""));
        assert!(msg.contains("\"a\""));
    }
}
