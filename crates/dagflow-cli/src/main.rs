mod demo_tasks;
mod workflow_file;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dagflow_core::config::DagflowConfig;
use dagflow_core::substrate::LocalSubstrate;

#[derive(Parser)]
#[command(name = "dagflow", version, about = "DAG workflow compiler and executor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a workflow file and check it compiles to a valid plan.
    Validate {
        /// Path to a workflow JSON file.
        file: PathBuf,
    },
    /// Compile and run a workflow file against the built-in demo task registry.
    Run {
        /// Path to a workflow JSON file.
        file: PathBuf,
        /// Only run the ancestors of this node, extracting its result.
        #[arg(long)]
        target: Option<String>,
    },
    /// Report the effective configuration and demo registry contents.
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    dagflow_core::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { file } => validate(&file),
        Command::Run { file, target } => run(&file, target).await,
        Command::Doctor => doctor().await,
    }
}

fn validate(file: &std::path::Path) -> Result<()> {
    let parsed = workflow_file::load(file)?;
    let workflow = workflow_file::to_workflow(&parsed)?;
    let plan = dagflow_core::compile(&workflow, None)?;

    println!("workflow '{}' compiles to {} step(s):", plan.workflow_name(), plan.len());
    for step in plan.steps() {
        println!("  {step:?}");
    }
    Ok(())
}

async fn run(file: &std::path::Path, target: Option<String>) -> Result<()> {
    let config = DagflowConfig::load_or_default();
    let substrate = LocalSubstrate::new(
        demo_tasks::build_demo_registry().await,
        Duration::from_secs(config.substrate.default_timeout_seconds),
        config.substrate.max_concurrency,
    );

    let parsed = workflow_file::load(file)?;
    let workflow = workflow_file::to_workflow(&parsed)?;

    let output = dagflow_core::run(&workflow, &substrate, target.as_deref()).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn doctor() -> Result<()> {
    let config = DagflowConfig::load_or_default();
    println!("substrate.default_timeout_seconds = {}", config.substrate.default_timeout_seconds);
    println!("substrate.max_concurrency = {}", config.substrate.max_concurrency);

    let registry = demo_tasks::build_demo_registry().await;
    println!("demo registry: {} task(s) registered", registry.len().await);
    println!("ok");
    Ok(())
}
