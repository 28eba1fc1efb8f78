//! Common subplan elimination pass.
//!
//! Structurally identical subtrees compute the same result, so repeated
//! ones are wrapped in `Cache` nodes sharing an id. The executor
//! materializes each id once and reuses the rows for every occurrence.
//!
//! Only subtrees that reach a scan are worth sharing; pure expression
//! shapes are cheap to recompute. Wrapping is maximal: once a repeated
//! subtree is wrapped, its interior is left alone.

use crate::optimizer::pass::OptimizerPass;
use crate::planner::LogicalPlan;
use hashbrown::HashMap;
use rivulet_core::Result;

/// Shares repeated subtrees behind cache nodes.
pub struct CommonSubplanElimination;

impl OptimizerPass for CommonSubplanElimination {
    fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan> {
        let mut counts: HashMap<LogicalPlan, usize> = HashMap::new();
        count(&plan, &mut counts);
        let mut ids: HashMap<LogicalPlan, u64> = HashMap::new();
        Ok(rewrite(plan, &counts, &mut ids))
    }

    fn name(&self) -> &'static str {
        "common_subplan_elimination"
    }
}

fn contains_scan(plan: &LogicalPlan) -> bool {
    match plan {
        LogicalPlan::Scan { .. } => true,
        _ => plan.inputs().iter().any(|p| contains_scan(p)),
    }
}

/// A subtree is shareable if it reads a source and is not already shared.
fn shareable(plan: &LogicalPlan) -> bool {
    !matches!(plan, LogicalPlan::Cache { .. }) && contains_scan(plan)
}

fn count(plan: &LogicalPlan, counts: &mut HashMap<LogicalPlan, usize>) {
    if shareable(plan) {
        *counts.entry(plan.clone()).or_insert(0) += 1;
    }
    // Cached interiors are already shared; leave them out of the tally.
    if matches!(plan, LogicalPlan::Cache { .. }) {
        return;
    }
    for input in plan.inputs() {
        count(input, counts);
    }
}

fn rewrite(
    plan: LogicalPlan,
    counts: &HashMap<LogicalPlan, usize>,
    ids: &mut HashMap<LogicalPlan, u64>,
) -> LogicalPlan {
    if shareable(&plan) && counts.get(&plan).copied().unwrap_or(0) >= 2 {
        // Ids are assigned in pre-order, so equal subtrees meet the same
        // id on every run.
        let next = ids.len() as u64;
        let id = *ids.entry(plan.clone()).or_insert(next);
        return LogicalPlan::Cache {
            input: Box::new(plan),
            id,
        };
    }
    match plan {
        leaf @ LogicalPlan::Scan { .. } => leaf,
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input: Box::new(rewrite(*input, counts, ids)),
            predicate,
        },
        LogicalPlan::Project { input, exprs } => LogicalPlan::Project {
            input: Box::new(rewrite(*input, counts, ids)),
            exprs,
        },
        LogicalPlan::WithColumns { input, exprs } => LogicalPlan::WithColumns {
            input: Box::new(rewrite(*input, counts, ids)),
            exprs,
        },
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggs,
        } => LogicalPlan::Aggregate {
            input: Box::new(rewrite(*input, counts, ids)),
            group_by,
            aggs,
        },
        LogicalPlan::Sort { input, keys } => LogicalPlan::Sort {
            input: Box::new(rewrite(*input, counts, ids)),
            keys,
        },
        LogicalPlan::Limit {
            input,
            offset,
            limit,
        } => LogicalPlan::Limit {
            input: Box::new(rewrite(*input, counts, ids)),
            offset,
            limit,
        },
        LogicalPlan::Union { inputs } => LogicalPlan::Union {
            inputs: inputs
                .into_iter()
                .map(|input| rewrite(input, counts, ids))
                .collect(),
        },
        cached @ LogicalPlan::Cache { .. } => cached,
    }
}
