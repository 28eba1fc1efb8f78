//! Slice pushdown pass.
//!
//! When the nodes above only ever consume a bounded number of rows, that
//! bound is carried toward the scan so reads can stop early. The bound
//! passes through row-count-preserving nodes, stops at nodes that need
//! the whole input (sorts, aggregations) and at filters that still sit in
//! the tree, and lands in the scan's limit slot.
//!
//! The scan's limit applies after its predicate slot, so a filter that an
//! earlier pass pushed into the scan does not block the bound.

use crate::optimizer::pass::OptimizerPass;
use crate::planner::LogicalPlan;
use rivulet_core::Result;

/// Bounds scans by downstream limits.
pub struct SlicePushdown;

impl OptimizerPass for SlicePushdown {
    fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan> {
        Ok(push(plan, None))
    }

    fn name(&self) -> &'static str {
        "slice_pushdown"
    }
}

fn tighten(current: Option<usize>, new: usize) -> Option<usize> {
    Some(match current {
        None => new,
        Some(existing) => existing.min(new),
    })
}

fn push(plan: LogicalPlan, bound: Option<usize>) -> LogicalPlan {
    match plan {
        LogicalPlan::Scan {
            source,
            schema,
            projection,
            predicate,
            limit,
        } => {
            let limit = match bound {
                None => limit,
                Some(bound) => tighten(limit, bound),
            };
            LogicalPlan::Scan {
                source,
                schema,
                projection,
                predicate,
                limit,
            }
        }
        LogicalPlan::Limit {
            input,
            offset,
            limit,
        } => {
            // The node still enforces the exact slice; the bound below
            // only caps how much is produced.
            let below = tighten(bound, offset.saturating_add(limit));
            LogicalPlan::Limit {
                input: Box::new(push(*input, below)),
                offset,
                limit,
            }
        }
        // Row-count preserving nodes pass the bound through.
        LogicalPlan::Project { input, exprs } => LogicalPlan::Project {
            input: Box::new(push(*input, bound)),
            exprs,
        },
        LogicalPlan::WithColumns { input, exprs } => LogicalPlan::WithColumns {
            input: Box::new(push(*input, bound)),
            exprs,
        },
        // A filter may drop arbitrarily many rows, so a bound from above
        // says nothing about how many input rows are needed.
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input: Box::new(push(*input, None)),
            predicate,
        },
        LogicalPlan::Sort { input, keys } => LogicalPlan::Sort {
            input: Box::new(push(*input, None)),
            keys,
        },
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggs,
        } => LogicalPlan::Aggregate {
            input: Box::new(push(*input, None)),
            group_by,
            aggs,
        },
        // Each union input can produce at most the bound on its own.
        LogicalPlan::Union { inputs } => LogicalPlan::Union {
            inputs: inputs.into_iter().map(|input| push(input, bound)).collect(),
        },
        LogicalPlan::Cache { input, id } => LogicalPlan::Cache {
            input: Box::new(push(*input, None)),
            id,
        },
    }
}
