//! Taskplanner - deliberative task planning CLI
//!
//! Entry point: parses arguments, wires configuration into the pipeline,
//! and prints the refined plan. Logs go to stderr so stdout stays clean
//! for the plan itself.

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use taskplanner::cli::{Cli, Command, OutputFormat};
use taskplanner::config::Config;
use taskplanner::llm::create_client;
use taskplanner::planner::{PlanPipeline, TaskPlan};

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > RUST_LOG > default (WARN)
    let level = if let Some(s) = cli_log_level {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        }
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(provider = %config.llm.provider, model = %config.llm.model, "main: config loaded");

    match cli.command {
        Command::Plan { task, model, format } => cmd_plan(config, &task, model, format).await,
    }
}

/// Run the planning pipeline and print the result
async fn cmd_plan(mut config: Config, task: &str, model: Option<String>, format: OutputFormat) -> Result<()> {
    debug!(task_len = task.len(), %format, "cmd_plan: called");

    if let Some(model) = model {
        debug!(%model, "cmd_plan: model override from CLI");
        config.llm.model = model;
    }

    config.validate()?;

    let llm = create_client(&config.llm)?;
    let pipeline = PlanPipeline::new(llm, config.stages.clone());

    info!(model = %config.llm.model, "Generating plan");
    let plan = pipeline.generate(task).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print_plan_text(&plan),
    }

    Ok(())
}

/// Render a plan as readable text
fn print_plan_text(plan: &TaskPlan) {
    println!("Task: {}", plan.task_description);
    println!();

    for step in &plan.steps {
        println!("{}. {}", step.step_number, step.title);
        println!("   {}", step.description);
        if let Some(duration) = &step.estimated_duration {
            println!("   Estimated: {}", duration);
        }
        if !step.dependencies.is_empty() {
            let deps = step
                .dependencies
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            println!("   Depends on: {}", deps);
        }
        println!();
    }

    if !plan.notes.is_empty() {
        println!("Notes: {}", plan.notes);
    }

    // The deliberation transcript; the fallback plan's single step points here
    if !plan.thinking.is_empty() {
        println!();
        println!("--- Thinking ---");
        println!("{}", plan.thinking);
    }
    if !plan.reflection.is_empty() {
        println!();
        println!("--- Reflection ---");
        println!("{}", plan.reflection);
    }
}
