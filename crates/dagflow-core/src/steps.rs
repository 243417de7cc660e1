//! C5: pure functions that run one [`crate::compiler::Step`] against a
//! [`Substrate`] and a [`Context`]. The compiler decides *what* to run and
//! in *what order*; this module is the only place that actually runs it.

use serde_json::{Map, Value};

use crate::context::Context;
use crate::error::{Result, TaskError, WorkflowError};
use crate::substrate::Substrate;
use crate::workflow::Workflow;

pub fn init_context() -> Context {
    Context::new()
}

/// Build the payload a join (or single-parent) node receives: `None` for a
/// source node, the lone parent's result for a single dependency, or a JSON
/// array of parent results — in `depends_on` order — for a join.
///
/// Raises [`TaskError::MissingDependencyResult`] (naming every missing
/// parent, not just the first) rather than [`TaskError::MissingContextEntry`]
/// — a join missing a result is a corrupted-plan condition distinct from an
/// `ExtractOne`/`ExtractSinks` sink lookup miss.
fn dependency_payload(ctx: &Context, node_id: &str, depends_on: &[String]) -> std::result::Result<Option<Value>, TaskError> {
    match depends_on.len() {
        0 => Ok(None),
        1 => {
            let mut values = ctx.require_dependencies(node_id, depends_on)?;
            Ok(Some(values.pop().expect("len checked above")))
        }
        _ => Ok(Some(Value::Array(ctx.require_dependencies(node_id, depends_on)?))),
    }
}

/// Run `node_id`'s task through `substrate`, writing its result into `ctx`.
///
/// If `ctx` already holds a result for `node_id` this is a no-op: a node
/// reachable from two different join branches in the same plan must still
/// run exactly once.
pub async fn execute_node<S: Substrate>(
    substrate: &S,
    workflow: &Workflow,
    node_id: &str,
    ctx: &mut Context,
) -> Result<()> {
    if ctx.contains(node_id) {
        return Ok(());
    }

    let node = workflow
        .node(node_id)
        .ok_or_else(|| WorkflowError::UnknownNode(node_id.to_string()))?;

    let mut args = node.task().args().to_vec();
    if node.consume_dependency_results() {
        if let Some(payload) = dependency_payload(ctx, node_id, node.depends_on())? {
            args.push(payload);
        }
    }

    let handle = substrate.signature(node.task().name(), &args, node.task().kwargs());
    let mut results = substrate.pipe(vec![handle]).await?;
    let result = results.pop().expect("pipe returns one result per step handed in");

    ctx.insert(node_id, result);
    Ok(())
}

/// Pull a single node's result out as the plan's overall output.
pub fn extract_one(ctx: &Context, node_id: &str) -> Result<Value> {
    Ok(ctx.require(node_id)?.clone())
}

/// Pull several sink results out, keyed by node id, as the plan's output.
pub fn extract_sinks(ctx: &Context, node_ids: &[String]) -> Result<Value> {
    let mut out = Map::with_capacity(node_ids.len());
    for id in node_ids {
        out.insert(id.clone(), ctx.require(id)?.clone());
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{StepHandle, TaskHandler};
    use crate::task::TaskDescriptor;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    /// Minimal substrate for exercising step logic in isolation, without the
    /// registry/timeout machinery: dispatches by matching on the task name
    /// directly rather than looking anything up in a registry.
    struct EchoSubstrate;

    #[async_trait]
    impl Substrate for EchoSubstrate {
        async fn register_task(&self, _name: &str, _handler: Arc<dyn TaskHandler>) {
            unimplemented!("EchoSubstrate dispatches by name, it has no registry to populate")
        }

        async fn lookup_task(&self, _name: &str) -> Option<Arc<dyn TaskHandler>> {
            None
        }

        async fn pipe(&self, steps: Vec<StepHandle>) -> std::result::Result<Vec<Value>, TaskError> {
            if steps.is_empty() {
                return Err(TaskError::EmptyPipeline);
            }
            steps
                .iter()
                .map(|step| match step.task_name() {
                    "echo" => Ok(step.args().first().cloned().unwrap_or(Value::Null)),
                    "sum" => {
                        let total: f64 = step
                            .args()
                            .iter()
                            .filter_map(|v| v.as_f64().or_else(|| v.as_array().map(|a| a.iter().filter_map(Value::as_f64).sum())))
                            .sum();
                        Ok(json!(total))
                    }
                    "boom" => Err(TaskError::UserTask {
                        task: "boom".into(),
                        message: "deliberate failure".into(),
                    }),
                    other => Err(TaskError::UnknownTask(other.to_string())),
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn execute_node_runs_a_source_with_its_bound_args() {
        let mut wf = Workflow::new("wf");
        wf.add(
            TaskDescriptor::new("echo").unwrap().with_args(vec![json!("hi")]),
            "a",
            vec![],
            true,
        )
        .unwrap();

        let mut ctx = init_context();
        execute_node(&EchoSubstrate, &wf, "a", &mut ctx).await.unwrap();
        assert_eq!(ctx.get("a"), Some(&json!("hi")));
    }

    #[tokio::test]
    async fn execute_node_injects_single_parent_result() {
        let mut wf = Workflow::new("wf");
        wf.add(TaskDescriptor::new("echo").unwrap().with_args(vec![json!(1)]), "a", vec![], true)
            .unwrap();
        wf.add(TaskDescriptor::new("echo").unwrap(), "b", vec!["a".into()], true)
            .unwrap();

        let mut ctx = init_context();
        execute_node(&EchoSubstrate, &wf, "a", &mut ctx).await.unwrap();
        execute_node(&EchoSubstrate, &wf, "b", &mut ctx).await.unwrap();
        assert_eq!(ctx.get("b"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn execute_node_injects_join_results_as_an_array() {
        let mut wf = Workflow::new("wf");
        wf.add(TaskDescriptor::new("echo").unwrap().with_args(vec![json!(1)]), "a", vec![], true)
            .unwrap();
        wf.add(TaskDescriptor::new("echo").unwrap().with_args(vec![json!(2)]), "b", vec![], true)
            .unwrap();
        wf.add(
            TaskDescriptor::new("sum").unwrap(),
            "join",
            vec!["a".into(), "b".into()],
            true,
        )
        .unwrap();

        let mut ctx = init_context();
        execute_node(&EchoSubstrate, &wf, "a", &mut ctx).await.unwrap();
        execute_node(&EchoSubstrate, &wf, "b", &mut ctx).await.unwrap();
        execute_node(&EchoSubstrate, &wf, "join", &mut ctx).await.unwrap();
        assert_eq!(ctx.get("join"), Some(&json!(3.0)));
    }

    #[tokio::test]
    async fn execute_node_skips_dependency_payload_when_opted_out() {
        let mut wf = Workflow::new("wf");
        wf.add(TaskDescriptor::new("echo").unwrap().with_args(vec![json!(1)]), "a", vec![], true)
            .unwrap();
        wf.add(
            TaskDescriptor::new("echo").unwrap().with_args(vec![json!("fixed")]),
            "b",
            vec!["a".into()],
            false,
        )
        .unwrap();

        let mut ctx = init_context();
        execute_node(&EchoSubstrate, &wf, "a", &mut ctx).await.unwrap();
        execute_node(&EchoSubstrate, &wf, "b", &mut ctx).await.unwrap();
        assert_eq!(ctx.get("b"), Some(&json!("fixed")));
    }

    #[tokio::test]
    async fn execute_node_is_idempotent_once_a_result_exists() {
        let mut wf = Workflow::new("wf");
        wf.add(TaskDescriptor::new("boom").unwrap(), "a", vec![], true).unwrap();

        let mut ctx = init_context();
        ctx.insert("a", json!("already ran"));
        execute_node(&EchoSubstrate, &wf, "a", &mut ctx).await.unwrap();
        assert_eq!(ctx.get("a"), Some(&json!("already ran")));
    }

    #[tokio::test]
    async fn execute_node_on_a_corrupted_plan_surfaces_missing_dependency_result() {
        let mut wf = Workflow::new("wf");
        wf.add(TaskDescriptor::new("echo").unwrap(), "a", vec![], true).unwrap();
        wf.add(TaskDescriptor::new("sum").unwrap(), "join", vec!["a".into(), "b".into()], true)
            .unwrap();

        // "b" is never executed, so "join" is missing one of its two
        // dependency results: a hand-built plan that skips a parent.
        let mut ctx = init_context();
        execute_node(&EchoSubstrate, &wf, "a", &mut ctx).await.unwrap();
        let err = execute_node(&EchoSubstrate, &wf, "join", &mut ctx).await.unwrap_err();
        match err {
            WorkflowError::Task(TaskError::MissingDependencyResult { node_id, missing, available }) => {
                assert_eq!(node_id, "join");
                assert_eq!(missing, vec!["b".to_string()]);
                assert_eq!(available, vec!["a".to_string()]);
            }
            other => panic!("expected MissingDependencyResult, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_node_on_unknown_plan_node_is_a_workflow_error() {
        let wf = Workflow::new("wf");
        let mut ctx = init_context();
        let err = execute_node(&EchoSubstrate, &wf, "ghost", &mut ctx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownNode(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn execute_node_surfaces_user_task_failure() {
        let mut wf = Workflow::new("wf");
        wf.add(TaskDescriptor::new("boom").unwrap(), "a", vec![], true).unwrap();

        let mut ctx = init_context();
        let err = execute_node(&EchoSubstrate, &wf, "a", &mut ctx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Task(TaskError::UserTask { .. })));
    }

    #[test]
    fn extract_one_reads_the_sink_result() {
        let mut ctx = init_context();
        ctx.insert("a", json!(42));
        assert_eq!(extract_one(&ctx, "a").unwrap(), json!(42));
    }

    #[test]
    fn extract_one_missing_sink_is_an_error() {
        let ctx = init_context();
        let err = extract_one(&ctx, "ghost").unwrap_err();
        assert!(matches!(err, WorkflowError::Task(TaskError::MissingContextEntry(id)) if id == "ghost"));
    }

    #[test]
    fn extract_sinks_keys_results_by_node_id() {
        let mut ctx = init_context();
        ctx.insert("b", json!(2));
        ctx.insert("c", json!(3));
        let out = extract_sinks(&ctx, &["b".to_string(), "c".to_string()]).unwrap();
        assert_eq!(out, json!({"b": 2, "c": 3}));
    }
}
