//! PlanPipeline - three-stage deliberative plan generation
//!
//! Runs draft, reflection, and refinement as sequential LLM calls,
//! threading each stage's raw output verbatim into the next stage's
//! prompt. Refinement output is parsed into a TaskPlan; parse failures
//! degrade to a fallback plan rather than an error.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::plan::{TaskPlan, parse_plan};
use super::validate::validate_dependencies;
use crate::config::StageConfig;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, TokenUsage};
use crate::prompts;

/// Errors from plan generation
///
/// Parse failures are deliberately absent: malformed refinement output
/// degrades to a fallback plan instead of failing the pipeline.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The task was empty or whitespace-only (caught before any LLM call)
    #[error("Task description is required")]
    EmptyTask,

    /// An LLM call failed after client-side retries were exhausted
    #[error(transparent)]
    Upstream(#[from] LlmError),
}

/// Three-stage plan generation pipeline
pub struct PlanPipeline {
    llm: Arc<dyn LlmClient>,
    stages: StageConfig,
}

impl PlanPipeline {
    /// Create a new pipeline
    pub fn new(llm: Arc<dyn LlmClient>, stages: StageConfig) -> Self {
        debug!(?stages, "PlanPipeline::new: called");
        Self { llm, stages }
    }

    /// Generate a refined plan for the given task
    ///
    /// Stages run strictly in order; a failure at any stage aborts the
    /// remainder. The returned plan always carries the raw draft and
    /// critique in its thinking/reflection fields.
    pub async fn generate(&self, task: &str) -> Result<TaskPlan, PlanError> {
        debug!(task_len = task.len(), "generate: called");
        if task.trim().is_empty() {
            debug!("generate: empty task rejected");
            return Err(PlanError::EmptyTask);
        }

        info!("Drafting initial plan");
        let (thinking, draft_usage) = self
            .run_stage(
                prompts::DRAFT,
                prompts::draft_request(task),
                self.stages.draft_temperature,
                false,
            )
            .await?;

        info!("Reviewing draft");
        let (reflection, reflect_usage) = self
            .run_stage(
                prompts::REFLECT,
                prompts::reflect_request(task, &thinking),
                self.stages.reflect_temperature,
                false,
            )
            .await?;

        info!("Refining plan");
        let (refined, refine_usage) = self
            .run_stage(
                prompts::REFINE,
                prompts::refine_request(task, &thinking, &reflection),
                self.stages.refine_temperature,
                true,
            )
            .await?;

        let plan = match parse_plan(&refined) {
            Ok(mut plan) => {
                debug!(step_count = plan.steps.len(), "generate: refinement parsed");
                // The transcript comes from the pipeline, never the model
                plan.thinking = thinking;
                plan.reflection = reflection;
                plan
            }
            Err(e) => {
                warn!(error = %e, "Refinement output was not a valid plan, returning fallback");
                TaskPlan::fallback(task, &thinking, &reflection)
            }
        };

        for warning in validate_dependencies(&plan) {
            warn!(%warning, "Plan dependency issue");
        }

        let input_tokens = draft_usage.input_tokens + reflect_usage.input_tokens + refine_usage.input_tokens;
        let output_tokens = draft_usage.output_tokens + reflect_usage.output_tokens + refine_usage.output_tokens;
        info!(
            step_count = plan.steps.len(),
            input_tokens, output_tokens, "Plan generated"
        );

        Ok(plan)
    }

    /// Run one pipeline stage as a single completion call
    async fn run_stage(
        &self,
        system_prompt: &str,
        user_message: String,
        temperature: f32,
        json_output: bool,
    ) -> Result<(String, TokenUsage), LlmError> {
        debug!(%temperature, %json_output, "run_stage: called");
        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages: vec![Message::user(user_message)],
            temperature,
            json_output,
            max_tokens: self.stages.max_tokens,
        };

        let response = self.llm.complete(request).await?;
        debug!(
            output_tokens = response.usage.output_tokens,
            ?response.stop_reason,
            "run_stage: complete"
        );

        Ok((response.text(), response.usage))
    }
}
