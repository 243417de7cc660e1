//! Reference in-process substrate: a name -> handler registry plus a
//! [`Substrate`] implementation that enforces a per-call timeout and spawns
//! each dispatched step as its own task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, Semaphore};

use crate::error::TaskError;
use crate::substrate::{Substrate, StepHandle, TaskHandler};

/// Name -> handler table. Cheap to clone (an `Arc` underneath); register
/// tasks before building any [`LocalSubstrate`] that points at it, though
/// nothing prevents registering more while a workflow is mid-run.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    handlers: Arc<RwLock<HashMap<String, Arc<dyn TaskHandler>>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_task(&self, name: impl Into<String>, handler: impl TaskHandler + 'static) {
        self.insert_handler(name.into(), Arc::new(handler)).await;
    }

    pub async fn insert_handler(&self, name: impl Into<String>, handler: Arc<dyn TaskHandler>) {
        self.handlers.write().await.insert(name.into(), handler);
    }

    pub async fn lookup_task(&self, name: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.read().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handlers.read().await.is_empty()
    }
}

/// The reference `Substrate`: dispatches through a [`TaskRegistry`] on the
/// current tokio runtime, killing any call that outruns `default_timeout`.
///
/// `max_concurrency` bounds how many `pipe()` calls run at once — it doesn't
/// parallelize the steps *within* one pipeline, which always run in order.
pub struct LocalSubstrate {
    registry: TaskRegistry,
    default_timeout: Duration,
    concurrency: Arc<Semaphore>,
}

impl LocalSubstrate {
    pub fn new(registry: TaskRegistry, default_timeout: Duration, max_concurrency: usize) -> Self {
        Self {
            registry,
            default_timeout,
            concurrency: Arc::new(Semaphore::new(max_concurrency)),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }
}

#[async_trait]
impl Substrate for LocalSubstrate {
    async fn register_task(&self, name: &str, handler: Arc<dyn TaskHandler>) {
        self.registry.insert_handler(name, handler).await;
    }

    async fn lookup_task(&self, name: &str) -> Option<Arc<dyn TaskHandler>> {
        self.registry.lookup_task(name).await
    }

    async fn pipe(&self, steps: Vec<StepHandle>) -> std::result::Result<Vec<Value>, TaskError> {
        if steps.is_empty() {
            return Err(TaskError::EmptyPipeline);
        }

        let _permit = self
            .concurrency
            .acquire()
            .await
            .expect("semaphore is never closed");

        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let handler = self
                .registry
                .lookup_task(step.task_name())
                .await
                .ok_or_else(|| TaskError::UnknownTask(step.task_name().to_string()))?;
            let timeout = self.default_timeout;
            let task_name = step.task_name().to_string();

            let handle = tokio::spawn(async move {
                match tokio::time::timeout(timeout, handler.call(step.args(), step.kwargs())).await {
                    Ok(result) => result,
                    Err(_elapsed) => Err(TaskError::Timeout {
                        task: task_name.clone(),
                        timeout_seconds: timeout.as_secs(),
                    }),
                }
            });

            let result = handle.await.map_err(|join_err| TaskError::UserTask {
                task: "<spawned step>".into(),
                message: format!("step task panicked or was cancelled: {join_err}"),
            })??;
            results.push(result);
        }

        Ok(results)
    }
}
