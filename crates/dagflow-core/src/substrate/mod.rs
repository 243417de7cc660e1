//! C6: the substrate adapter boundary.
//!
//! [`Substrate`] is the only interface [`crate::steps`] depends on to run a
//! task by name. [`LocalSubstrate`] is the reference, in-process
//! implementation, backed by a [`TaskRegistry`] and tokio's worker pool; a
//! remote substrate (a message broker, an RPC pool) would implement the same
//! trait without the rest of the crate noticing.
//!
//! A task is dispatched in two steps: [`Substrate::signature`] binds a task
//! name plus args/kwargs into a [`StepHandle`] without running anything, and
//! [`Substrate::pipe`] runs a sequence of such handles to completion, one at
//! a time, each as its own spawned task.

pub mod handlers;
pub mod registry;

pub use handlers::{FnTask, TaskHandler};
pub use registry::{LocalSubstrate, TaskRegistry};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::TaskError;

/// A task name bound to its arguments, ready to be handed to [`Substrate::pipe`].
///
/// Building a `StepHandle` never runs anything — it's pure data, the same
/// way a Celery `.s()` signature is inert until it's dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct StepHandle {
    task_name: String,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl StepHandle {
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }
}

/// The adapter boundary [`crate::steps`] dispatches user tasks through.
#[async_trait]
pub trait Substrate: Send + Sync {
    /// Register `handler` under `name`, replacing any existing registration.
    async fn register_task(&self, name: &str, handler: Arc<dyn TaskHandler>);

    /// Look up a previously registered handler by name.
    async fn lookup_task(&self, name: &str) -> Option<Arc<dyn TaskHandler>>;

    /// Bind a task invocation into a dispatchable [`StepHandle`]. Pure and
    /// synchronous — no lookup or execution happens until [`Substrate::pipe`].
    fn signature(&self, task_name: &str, args: &[Value], kwargs: &Map<String, Value>) -> StepHandle {
        StepHandle {
            task_name: task_name.to_string(),
            args: args.to_vec(),
            kwargs: kwargs.clone(),
        }
    }

    /// Run `steps` to completion in order, returning each step's result in
    /// the same order. Steps never run concurrently with each other, but
    /// each is dispatched as its own task so a slow step doesn't have to
    /// share a thread with whatever called `pipe`.
    async fn pipe(&self, steps: Vec<StepHandle>) -> std::result::Result<Vec<Value>, TaskError>;
}
