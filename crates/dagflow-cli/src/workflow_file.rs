//! JSON workflow description accepted by `dagflow validate`/`dagflow run`.

use anyhow::{Context as _, Result};
use dagflow_core::{TaskDescriptor, Workflow};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct WorkflowFile {
    pub name: String,
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub task: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default = "default_true")]
    pub consume_dependency_results: bool,
}

fn default_true() -> bool {
    true
}

pub fn load(path: &Path) -> Result<WorkflowFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workflow file {}", path.display()))?;
    let file: WorkflowFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse workflow file {}", path.display()))?;
    Ok(file)
}

/// Build a [`Workflow`] from a parsed file, in declared node order.
pub fn to_workflow(file: &WorkflowFile) -> Result<Workflow> {
    let mut workflow = Workflow::new(file.name.clone());
    for node in &file.nodes {
        let task = TaskDescriptor::new(node.task.clone())
            .with_context(|| format!("node '{}'", node.id))?
            .with_args(node.args.clone())
            .with_kwargs(node.kwargs.clone());
        workflow
            .add(task, node.id.clone(), node.depends_on.clone(), node.consume_dependency_results)
            .with_context(|| format!("node '{}'", node.id))?;
    }
    Ok(workflow)
}
