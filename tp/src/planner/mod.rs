//! Planner module
//!
//! The deliberation pipeline and the plan data model it produces.

mod pipeline;
mod plan;
mod validate;

pub use pipeline::{PlanError, PlanPipeline};
pub use plan::{PlanStep, TaskPlan, parse_plan};
pub use validate::validate_dependencies;
