//! Task plan data model and parsing
//!
//! TaskPlan is the pipeline's final output. Parsing the refinement stage's
//! text is tolerant: Markdown fences and surrounding prose are stripped
//! before the strict typed parse, and anything still unparseable degrades
//! to a single-step fallback plan instead of an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One actionable step within a task plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// 1-based position in the plan
    pub step_number: u32,

    /// Short imperative summary
    pub title: String,

    /// What carrying out this step involves
    pub description: String,

    /// Rough wall-clock estimate, free-form text (e.g. "2 hours")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,

    /// step_number values that must complete before this step starts
    #[serde(default)]
    pub dependencies: Vec<u32>,
}

/// A refined task plan, with the deliberation transcript attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPlan {
    /// Clear summary of the task being planned
    pub task_description: String,

    /// Ordered steps making up the plan
    pub steps: Vec<PlanStep>,

    /// Important considerations, warnings, or recommendations
    #[serde(default)]
    pub notes: String,

    /// Raw drafting stage output (attached by the pipeline, never the model)
    #[serde(default)]
    pub thinking: String,

    /// Raw reflection stage output (attached by the pipeline, never the model)
    #[serde(default)]
    pub reflection: String,
}

impl TaskPlan {
    /// Build the degraded single-step plan used when refinement output
    /// cannot be parsed
    ///
    /// The raw stage outputs still ride along in thinking/reflection so
    /// nothing the model produced is lost.
    pub fn fallback(task: &str, thinking: &str, reflection: &str) -> Self {
        debug!(task_len = task.len(), "TaskPlan::fallback: called");
        Self {
            task_description: task.to_string(),
            steps: vec![PlanStep {
                step_number: 1,
                title: "Review the task".to_string(),
                description: "Unable to parse structured plan. Please review the thinking process below.".to_string(),
                estimated_duration: None,
                dependencies: vec![],
            }],
            notes: "Plan generation encountered an issue. See thinking process for details.".to_string(),
            thinking: thinking.to_string(),
            reflection: reflection.to_string(),
        }
    }
}

/// Parse refinement stage text into a TaskPlan
///
/// Tries the text as-is (after stripping Markdown fences), then retries
/// on the outermost brace-delimited slice in case the model wrapped the
/// JSON in prose. Returns the last parse error when both fail.
pub fn parse_plan(text: &str) -> Result<TaskPlan, serde_json::Error> {
    debug!(text_len = text.len(), "parse_plan: called");
    let candidate = strip_code_fences(text);

    match serde_json::from_str::<TaskPlan>(candidate) {
        Ok(plan) => {
            debug!(step_count = plan.steps.len(), "parse_plan: parsed directly");
            Ok(plan)
        }
        Err(first_err) => {
            if let Some(slice) = extract_json_object(candidate) {
                debug!("parse_plan: retrying on brace-delimited slice");
                return serde_json::from_str::<TaskPlan>(slice).map_err(|e| {
                    debug!(error = %e, "parse_plan: slice parse failed");
                    e
                });
            }
            debug!(error = %first_err, "parse_plan: no JSON object found");
            Err(first_err)
        }
    }
}

/// Strip surrounding Markdown code fences (``` or ```json) if present
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the fence line itself (may carry a language tag)
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => return trimmed,
    };

    match body.rfind("```") {
        Some(idx) => body[..idx].trim(),
        None => body.trim(),
    }
}

/// Slice from the first '{' to the last '}' inclusive
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start { Some(&text[start..=end]) } else { None }
}
