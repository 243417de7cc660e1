//! A small built-in task registry used by `dagflow run`/`dagflow doctor`
//! when no external substrate is wired in. Lets a `.dagflow.json` file be
//! validated and run end-to-end without writing any Rust.

use dagflow_core::error::TaskError;
use dagflow_core::substrate::{FnTask, TaskRegistry};
use serde_json::{json, Map, Value};

fn numeric_args(args: &[Value], task: &str) -> Result<Vec<f64>, TaskError> {
    args.iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| TaskError::MalformedPayload {
                task: task.to_string(),
                message: format!("expected a number, got {v}"),
            })
        })
        .collect()
}

fn string_args(args: &[Value], task: &str) -> Result<Vec<String>, TaskError> {
    args.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| TaskError::MalformedPayload {
                    task: task.to_string(),
                    message: format!("expected a string, got {v}"),
                })
        })
        .collect()
}

/// Build the registry backing `dagflow run`: `arith.add`, `arith.sub`,
/// `arith.mul`, `arith.div`, `text.concat`, `text.upper`.
pub async fn build_demo_registry() -> TaskRegistry {
    let registry = TaskRegistry::new();

    registry
        .register_task(
            "arith.add",
            FnTask::new(|args, _kwargs| async move {
                let n = numeric_args(&args, "arith.add")?;
                Ok(json!(n.iter().sum::<f64>()))
            }),
        )
        .await;

    registry
        .register_task(
            "arith.sub",
            FnTask::new(|args, _kwargs| async move {
                let n = numeric_args(&args, "arith.sub")?;
                let mut it = n.into_iter();
                let first = it.next().unwrap_or(0.0);
                Ok(json!(it.fold(first, |acc, x| acc - x)))
            }),
        )
        .await;

    registry
        .register_task(
            "arith.mul",
            FnTask::new(|args, _kwargs| async move {
                let n = numeric_args(&args, "arith.mul")?;
                Ok(json!(n.iter().product::<f64>()))
            }),
        )
        .await;

    registry
        .register_task(
            "arith.div",
            FnTask::new(|args, _kwargs| async move {
                let n = numeric_args(&args, "arith.div")?;
                let mut it = n.into_iter();
                let first = it.next().unwrap_or(0.0);
                let mut acc = first;
                for x in it {
                    if x == 0.0 {
                        return Err(TaskError::UserTask {
                            task: "arith.div".into(),
                            message: "division by zero".into(),
                        });
                    }
                    acc /= x;
                }
                Ok(json!(acc))
            }),
        )
        .await;

    registry
        .register_task(
            "text.concat",
            FnTask::new(|args, _kwargs| async move {
                let parts = string_args(&args, "text.concat")?;
                Ok(json!(parts.join("")))
            }),
        )
        .await;

    registry
        .register_task(
            "text.upper",
            FnTask::new(|args, _kwargs| async move {
                let parts = string_args(&args, "text.upper")?;
                Ok(json!(parts.into_iter().map(|s| s.to_uppercase()).collect::<Vec<_>>()))
            }),
        )
        .await;

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagflow_core::substrate::{LocalSubstrate, Substrate};
    use std::time::Duration;

    #[tokio::test]
    async fn arith_add_sums_all_args() {
        let substrate = LocalSubstrate::new(build_demo_registry().await, Duration::from_secs(1), 8);
        let handle = substrate.signature("arith.add", &[json!(1), json!(2), json!(3)], &Map::new());
        let results = substrate.pipe(vec![handle]).await.unwrap();
        assert_eq!(results, vec![json!(6.0)]);
    }

    #[tokio::test]
    async fn arith_div_by_zero_is_a_user_task_error() {
        let substrate = LocalSubstrate::new(build_demo_registry().await, Duration::from_secs(1), 8);
        let handle = substrate.signature("arith.div", &[json!(1), json!(0)], &Map::new());
        let err = substrate.pipe(vec![handle]).await.unwrap_err();
        assert!(matches!(err, TaskError::UserTask { .. }));
    }

    #[tokio::test]
    async fn text_upper_rejects_non_string_args() {
        let substrate = LocalSubstrate::new(build_demo_registry().await, Duration::from_secs(1), 8);
        let handle = substrate.signature("text.upper", &[json!(1)], &Map::new());
        let err = substrate.pipe(vec![handle]).await.unwrap_err();
        assert!(matches!(err, TaskError::MalformedPayload { .. }));
    }
}
