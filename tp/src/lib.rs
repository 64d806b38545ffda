//! Taskplanner - deliberative task planning
//!
//! Taskplanner turns a free-form task description into a structured,
//! dependency-aware plan by running three LLM calls in sequence:
//!
//! 1. **Draft** - chain-of-thought planning at high temperature
//! 2. **Reflect** - a critical review of the draft at medium temperature
//! 3. **Refine** - a low-temperature pass that folds the critique back in
//!    and emits the final plan as JSON
//!
//! Each stage sees the previous stages' raw output verbatim. If the final
//! stage's JSON cannot be parsed, the pipeline degrades to a single-step
//! fallback plan carrying the full deliberation transcript instead of
//! failing.
//!
//! # Modules
//!
//! - [`planner`] - The pipeline and the plan data model
//! - [`llm`] - LLM client trait plus Anthropic and OpenAI implementations
//! - [`prompts`] - Embedded stage prompts and user-message builders
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod planner;
pub mod prompts;

// Re-export commonly used types
pub use config::{Config, LlmConfig, StageConfig};
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client,
};
pub use planner::{PlanError, PlanPipeline, PlanStep, TaskPlan, parse_plan, validate_dependencies};
