//! Task handler trait and the closure-backed implementation used to
//! register plain functions without hand-writing a struct per task.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::TaskError;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A registered task: given positional args and keyword args, produce a
/// result or fail. Object-safe so [`crate::substrate::TaskRegistry`] can
/// hold a heterogeneous `Arc<dyn TaskHandler>` per task name.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn call(
        &self,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> std::result::Result<Value, TaskError>;
}

/// Wraps a plain async closure as a [`TaskHandler`], so tests and small
/// demo registries don't need a dedicated struct per task.
pub struct FnTask {
    #[allow(clippy::type_complexity)]
    func: Box<
        dyn Fn(Vec<Value>, Map<String, Value>) -> BoxFuture<'static, std::result::Result<Value, TaskError>>
            + Send
            + Sync,
    >,
}

impl FnTask {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Vec<Value>, Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, TaskError>> + Send + 'static,
    {
        Self {
            func: Box::new(move |args, kwargs| Box::pin(func(args, kwargs))),
        }
    }
}

#[async_trait]
impl TaskHandler for FnTask {
    async fn call(
        &self,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> std::result::Result<Value, TaskError> {
        (self.func)(args.to_vec(), kwargs.clone()).await
    }
}
