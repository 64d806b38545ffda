//! Plan dependency validation
//!
//! Structural checks on a parsed plan's step dependencies. Problems are
//! reported as warnings; the plan itself is never mutated or rejected.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::plan::{PlanStep, TaskPlan};

/// Check a plan's step dependencies and collect human-readable warnings
///
/// Detects duplicate step numbers, self-references, references to unknown
/// steps, and dependency cycles. Step order is not checked; a step may
/// depend on a later step as long as the graph stays acyclic.
pub fn validate_dependencies(plan: &TaskPlan) -> Vec<String> {
    debug!(step_count = plan.steps.len(), "validate_dependencies: called");
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for step in &plan.steps {
        if !seen.insert(step.step_number) {
            warnings.push(format!("Duplicate step_number {}", step.step_number));
        }
    }

    // First occurrence wins when step numbers collide
    let mut graph: HashMap<u32, &PlanStep> = HashMap::new();
    for step in &plan.steps {
        graph.entry(step.step_number).or_insert(step);
    }

    for step in &plan.steps {
        for &dep in &step.dependencies {
            if dep == step.step_number {
                warnings.push(format!("Step {} depends on itself", step.step_number));
            } else if !graph.contains_key(&dep) {
                warnings.push(format!("Step {} depends on unknown step {}", step.step_number, dep));
            }
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut cycle_path = Vec::new();

    for step in &plan.steps {
        if !visited.contains(&step.step_number)
            && has_cycle_dfs(step.step_number, &graph, &mut visited, &mut rec_stack, &mut cycle_path)
        {
            debug!(?cycle_path, "validate_dependencies: cycle detected");
            let path = cycle_path.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" -> ");
            warnings.push(format!("Dependency cycle detected: {}", path));
            break;
        }
    }

    debug!(warning_count = warnings.len(), "validate_dependencies: complete");
    warnings
}

/// DFS helper for cycle detection
fn has_cycle_dfs(
    node: u32,
    graph: &HashMap<u32, &PlanStep>,
    visited: &mut HashSet<u32>,
    rec_stack: &mut HashSet<u32>,
    cycle_path: &mut Vec<u32>,
) -> bool {
    debug!(%node, "has_cycle_dfs: called");
    visited.insert(node);
    rec_stack.insert(node);
    cycle_path.push(node);

    if let Some(step) = graph.get(&node) {
        for &dep in &step.dependencies {
            // Self references and unknown steps are reported separately
            if dep == node || !graph.contains_key(&dep) {
                continue;
            }

            if !visited.contains(&dep) {
                debug!(%node, %dep, "has_cycle_dfs: visiting unvisited dep");
                if has_cycle_dfs(dep, graph, visited, rec_stack, cycle_path) {
                    return true;
                }
            } else if rec_stack.contains(&dep) {
                debug!(%node, %dep, "has_cycle_dfs: back edge found - cycle detected");
                cycle_path.push(dep);
                return true;
            }
        }
    }

    rec_stack.remove(&node);
    cycle_path.pop();
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_step(step_number: u32, dependencies: Vec<u32>) -> PlanStep {
        PlanStep {
            step_number,
            title: format!("Step {}", step_number),
            description: "desc".to_string(),
            estimated_duration: None,
            dependencies,
        }
    }

    fn make_plan(steps: Vec<PlanStep>) -> TaskPlan {
        TaskPlan {
            task_description: "test".to_string(),
            steps,
            notes: String::new(),
            thinking: String::new(),
            reflection: String::new(),
        }
    }

    #[test]
    fn test_clean_linear_plan() {
        let plan = make_plan(vec![
            make_step(1, vec![]),
            make_step(2, vec![1]),
            make_step(3, vec![1, 2]),
        ]);
        assert!(validate_dependencies(&plan).is_empty());
    }

    #[test]
    fn test_forward_reference_is_allowed() {
        let plan = make_plan(vec![make_step(1, vec![2]), make_step(2, vec![])]);
        assert!(validate_dependencies(&plan).is_empty());
    }

    #[test]
    fn test_duplicate_step_numbers() {
        let plan = make_plan(vec![make_step(1, vec![]), make_step(1, vec![])]);
        let warnings = validate_dependencies(&plan);
        assert_eq!(warnings, vec!["Duplicate step_number 1".to_string()]);
    }

    #[test]
    fn test_self_reference() {
        let plan = make_plan(vec![make_step(1, vec![1])]);
        let warnings = validate_dependencies(&plan);
        assert_eq!(warnings, vec!["Step 1 depends on itself".to_string()]);
    }

    #[test]
    fn test_unknown_reference() {
        let plan = make_plan(vec![make_step(1, vec![7])]);
        let warnings = validate_dependencies(&plan);
        assert_eq!(warnings, vec!["Step 1 depends on unknown step 7".to_string()]);
    }

    #[test]
    fn test_two_step_cycle() {
        let plan = make_plan(vec![make_step(1, vec![2]), make_step(2, vec![1])]);
        let warnings = validate_dependencies(&plan);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Dependency cycle detected"));
        assert!(warnings[0].contains("1 -> 2 -> 1"));
    }

    #[test]
    fn test_longer_cycle() {
        let plan = make_plan(vec![
            make_step(1, vec![]),
            make_step(2, vec![3]),
            make_step(3, vec![4]),
            make_step(4, vec![2]),
        ]);
        let warnings = validate_dependencies(&plan);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Dependency cycle detected"));
    }

    #[test]
    fn test_multiple_problems_all_reported() {
        let plan = make_plan(vec![make_step(1, vec![1, 9]), make_step(1, vec![])]);
        let warnings = validate_dependencies(&plan);
        assert!(warnings.contains(&"Duplicate step_number 1".to_string()));
        assert!(warnings.contains(&"Step 1 depends on itself".to_string()));
        assert!(warnings.contains(&"Step 1 depends on unknown step 9".to_string()));
    }
}
