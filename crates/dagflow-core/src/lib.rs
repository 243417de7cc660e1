pub mod compiler;
pub mod config;
pub mod context;
pub mod error;
pub mod node;
pub mod steps;
pub mod substrate;
pub mod task;
pub mod workflow;

pub use compiler::{compile, Plan, Step};
pub use context::Context;
pub use error::{Result, TaskError, WorkflowError};
pub use node::WorkflowNode;
pub use task::TaskDescriptor;
pub use workflow::Workflow;

use tracing::info;

/// Initialise a default tracing subscriber for the library consumer.
///
/// Call this once at program start. Uses `RUST_LOG` env var for filtering,
/// defaulting to `info` level.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).init();

    info!("dagflow tracing initialised");
}

/// Compile `workflow` and run it to completion against `substrate`,
/// returning the final extracted output.
///
/// This is the single entry point most callers need: build a [`Workflow`],
/// hand it here with a [`substrate::Substrate`], get back the sink result(s).
/// Pass `target_node_id` to restrict the run to that node's ancestor closure
/// instead of the whole workflow; see [`compile`].
pub async fn run<S: substrate::Substrate>(
    workflow: &Workflow,
    substrate: &S,
    target_node_id: Option<&str>,
) -> Result<serde_json::Value> {
    let plan = compile(workflow, target_node_id)?;
    let mut ctx = steps::init_context();

    for step in plan.steps() {
        match step {
            Step::ExecuteNode(node_id) => {
                steps::execute_node(substrate, workflow, node_id, &mut ctx).await?;
            }
            Step::ExtractOne(node_id) => return steps::extract_one(&ctx, node_id),
            Step::ExtractSinks(node_ids) => return steps::extract_sinks(&ctx, node_ids),
        }
    }

    unreachable!("a compiled plan always ends in an extract step")
}
