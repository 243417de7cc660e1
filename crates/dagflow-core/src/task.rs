//! C1: the immutable binding of a registered task name to its bound arguments.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WorkflowError;

/// Immutable binding of a task's registered name plus the arguments a
/// [`crate::workflow::Workflow`] node calls it with.
///
/// Once constructed, a `TaskDescriptor` is never mutated; cloning it is
/// cheap relative to re-registering the underlying task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    name: String,
    args: Vec<Value>,
    #[serde(default)]
    kwargs: Map<String, Value>,
}

impl TaskDescriptor {
    /// Build a descriptor with no bound arguments.
    ///
    /// Fails with [`WorkflowError::EmptyTaskName`] if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, WorkflowError> {
        let name = name.into();
        if name.is_empty() {
            return Err(WorkflowError::EmptyTaskName);
        }
        Ok(Self {
            name,
            args: Vec::new(),
            kwargs: Map::new(),
        })
    }

    /// Attach positional arguments, in order.
    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Attach keyword arguments.
    #[must_use]
    pub fn with_kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }
}
