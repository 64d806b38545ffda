//! Embedded prompts
//!
//! System prompts for the three planning stages are compiled into the
//! binary from .pmt files at build time. The user-message builders pair
//! with them; each stage embeds the previous stages' output verbatim.

use tracing::debug;

/// Drafting stage system prompt (chain-of-thought planner persona)
pub const DRAFT: &str = include_str!("../../prompts/draft.pmt");

/// Reflection stage system prompt (critical reviewer persona)
pub const REFLECT: &str = include_str!("../../prompts/reflect.pmt");

/// Refinement stage system prompt (JSON plan emitter persona)
pub const REFINE: &str = include_str!("../../prompts/refine.pmt");

/// Build the drafting stage user message
pub fn draft_request(task: &str) -> String {
    debug!(task_len = task.len(), "draft_request: called");
    format!(
        "Please create a detailed plan for the following task:\n\n{}\n\nThink through this step by step, explaining your reasoning as you break down the task.",
        task
    )
}

/// Build the reflection stage user message, embedding the draft verbatim
pub fn reflect_request(task: &str, draft: &str) -> String {
    debug!(task_len = task.len(), draft_len = draft.len(), "reflect_request: called");
    format!(
        "Here is a plan that was created for the task: \"{}\"\n\n--- PROPOSED PLAN ---\n{}\n--- END PLAN ---\n\nPlease critically review this plan and identify any weaknesses, gaps, or areas for improvement.",
        task, draft
    )
}

/// Build the refinement stage user message, embedding draft and critique verbatim
pub fn refine_request(task: &str, draft: &str, reflection: &str) -> String {
    debug!(
        task_len = task.len(),
        draft_len = draft.len(),
        reflection_len = reflection.len(),
        "refine_request: called"
    );
    format!(
        "Task: {}\n\n--- INITIAL PLAN ---\n{}\n--- END INITIAL PLAN ---\n\n--- FEEDBACK ---\n{}\n--- END FEEDBACK ---\n\nPlease create the final, improved plan incorporating this feedback. Output ONLY valid JSON.",
        task, draft, reflection
    )
}
