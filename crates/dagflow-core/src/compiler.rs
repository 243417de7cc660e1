//! C4: compiles a [`Workflow`] into a linear [`Plan`] of [`Step`]s.
//!
//! The plan threads a single [`crate::context::Context`] through every step
//! in topological order, so a node with several children is only ever
//! executed once — unlike a tree-shaped canvas, a join node's handler runs a
//! single time and its result is read by every dependent.

use std::collections::HashSet;

use crate::error::WorkflowError;
use crate::workflow::Workflow;

/// One instruction in a compiled [`Plan`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Run the node's task, gathering dependency results from the context
    /// first if `consume_dependency_results` is set, then store its result
    /// back into the context under the node's id.
    ExecuteNode(String),

    /// Pull a single node's result out of the context as the plan's final
    /// output. Emitted when the workflow has exactly one sink.
    ExtractOne(String),

    /// Pull several sink results out of the context, in the given order, as
    /// the plan's final output. Emitted when the workflow has more than one
    /// sink.
    ExtractSinks(Vec<String>),
}

/// A compiled, ready-to-run workflow: an ordered list of steps plus the
/// workflow name they came from, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    workflow_name: String,
    steps: Vec<Step>,
}

impl Plan {
    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Validate `workflow` and lower it into a [`Plan`].
///
/// When `target_node_id` is `None`, the plan covers every node and ends in
/// an `ExtractOne` (single sink) or `ExtractSinks` (multiple sinks) step.
/// When it is `Some(id)`, the plan is pruned to `id`'s ancestor closure —
/// only the nodes `id` actually depends on (transitively) are executed —
/// and always ends in `ExtractOne(id)`.
///
/// Fails with [`WorkflowError::EmptyWorkflow`] if `workflow` has no nodes,
/// [`WorkflowError::UnknownNode`] if `target_node_id` isn't in the workflow,
/// or with whatever [`Workflow::validate_dag`] reports for a malformed graph.
pub fn compile(workflow: &Workflow, target_node_id: Option<&str>) -> Result<Plan, WorkflowError> {
    if workflow.is_empty() {
        return Err(WorkflowError::EmptyWorkflow);
    }
    workflow.validate_dag()?;

    let selected = match target_node_id {
        Some(target) => workflow.ancestor_closure(target)?,
        None => workflow.nodes().map(|n| n.node_id().to_string()).collect::<HashSet<String>>(),
    };
    let order = workflow.topological_order(&selected)?;

    let mut steps: Vec<Step> = order.into_iter().map(Step::ExecuteNode).collect();

    match target_node_id {
        Some(target) => steps.push(Step::ExtractOne(target.to_string())),
        None => {
            let sinks = workflow.sinks();
            match sinks.len() {
                0 => unreachable!("a validated, nonempty acyclic workflow always has at least one sink"),
                1 => steps.push(Step::ExtractOne(
                    sinks.into_iter().next().expect("len checked above"),
                )),
                _ => steps.push(Step::ExtractSinks(sinks)),
            }
        }
    }

    Ok(Plan {
        workflow_name: workflow.name().to_string(),
        steps,
    })
}
