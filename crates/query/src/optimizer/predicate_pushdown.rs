//! Predicate pushdown pass.
//!
//! Moves filters toward scans in a single top-down sweep. A filter can
//! cross a node only when the node does not change the meaning of the
//! columns the predicate reads. When a filter reaches a scan it lands in
//! the scan's predicate slot, where the executor can use row group stats
//! to skip whole groups.

use crate::ast::Expr;
use crate::optimizer::pass::OptimizerPass;
use crate::planner::LogicalPlan;
use rivulet_core::Result;

/// Pushes filter predicates down the plan tree into scan nodes.
pub struct PredicatePushdown;

impl OptimizerPass for PredicatePushdown {
    fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan> {
        Ok(push(plan, None))
    }

    fn name(&self) -> &'static str {
        "predicate_pushdown"
    }
}

/// Combines an operator predicate with one pending from above.
fn merge(predicate: Expr, pending: Option<Expr>) -> Expr {
    match pending {
        None => predicate,
        Some(p) => predicate.and(p),
    }
}

/// Re-materializes a pending predicate as a filter above `plan`.
fn settle(plan: LogicalPlan, pending: Option<Expr>) -> LogicalPlan {
    match pending {
        None => plan,
        Some(predicate) => plan.filter(predicate),
    }
}

/// Returns true if every column the predicate reads passes through the
/// projection unchanged, as a bare column of the same name.
fn passes_through(predicate: &Expr, exprs: &[Expr]) -> bool {
    predicate.referenced_columns().iter().all(|name| {
        exprs
            .iter()
            .any(|e| e.is_bare_column() && e.output_name().as_deref() == Some(name))
    })
}

fn push(plan: LogicalPlan, pending: Option<Expr>) -> LogicalPlan {
    match plan {
        LogicalPlan::Filter { input, predicate } => {
            push(*input, Some(merge(predicate, pending)))
        }
        LogicalPlan::Scan {
            source,
            schema,
            projection,
            predicate,
            limit,
        } => {
            // A limit slot means rows are cut off before anything above
            // runs; filtering past it would change which rows survive.
            if limit.is_some() {
                return settle(
                    LogicalPlan::Scan {
                        source,
                        schema,
                        projection,
                        predicate,
                        limit,
                    },
                    pending,
                );
            }
            let predicate = match (predicate, pending) {
                (existing, None) => existing,
                (None, Some(p)) => Some(p),
                (Some(existing), Some(p)) => Some(existing.and(p)),
            };
            LogicalPlan::Scan {
                source,
                schema,
                projection,
                predicate,
                limit,
            }
        }
        LogicalPlan::Project { input, exprs } => match pending {
            Some(p) if passes_through(&p, &exprs) => LogicalPlan::Project {
                input: Box::new(push(*input, Some(p))),
                exprs,
            },
            pending => settle(
                LogicalPlan::Project {
                    input: Box::new(push(*input, None)),
                    exprs,
                },
                pending,
            ),
        },
        LogicalPlan::WithColumns { input, exprs } => {
            let redefined: Vec<String> =
                exprs.iter().filter_map(|e| e.output_name()).collect();
            match pending {
                Some(p)
                    if p.referenced_columns()
                        .iter()
                        .all(|c| !redefined.iter().any(|r| r == c)) =>
                {
                    LogicalPlan::WithColumns {
                        input: Box::new(push(*input, Some(p))),
                        exprs,
                    }
                }
                pending => settle(
                    LogicalPlan::WithColumns {
                        input: Box::new(push(*input, None)),
                        exprs,
                    },
                    pending,
                ),
            }
        }
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggs,
        } => {
            // Filtering on group keys before grouping drops exactly the
            // groups the filter would drop afterwards.
            let pushable = match &pending {
                Some(p) => passes_through(p, &group_by),
                None => false,
            };
            if pushable {
                LogicalPlan::Aggregate {
                    input: Box::new(push(*input, pending)),
                    group_by,
                    aggs,
                }
            } else {
                settle(
                    LogicalPlan::Aggregate {
                        input: Box::new(push(*input, None)),
                        group_by,
                        aggs,
                    },
                    pending,
                )
            }
        }
        LogicalPlan::Sort { input, keys } => LogicalPlan::Sort {
            input: Box::new(push(*input, pending)),
            keys,
        },
        LogicalPlan::Limit {
            input,
            offset,
            limit,
        } => settle(
            LogicalPlan::Limit {
                input: Box::new(push(*input, None)),
                offset,
                limit,
            },
            pending,
        ),
        LogicalPlan::Union { inputs } => LogicalPlan::Union {
            inputs: inputs
                .into_iter()
                .map(|input| push(input, pending.clone()))
                .collect(),
        },
        // Cached subtrees are shared; a per-consumer filter stays outside.
        LogicalPlan::Cache { input, id } => settle(
            LogicalPlan::Cache {
                input: Box::new(push(*input, None)),
                id,
            },
            pending,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit, AggExpr};
    use rivulet_core::{DataType, Field, Schema};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("zone", DataType::Utf8),
            Field::new("fare", DataType::Float64),
        ])
        .unwrap()
    }

    fn scan_predicate(plan: &LogicalPlan) -> Option<&Expr> {
        match plan {
            LogicalPlan::Scan { predicate, .. } => predicate.as_ref(),
            _ => plan.inputs().first().and_then(|p| scan_predicate(p)),
        }
    }

    #[test]
    fn test_filter_lands_in_scan() {
        let plan = LogicalPlan::scan("t", schema()).filter(col("fare").gt(lit(5.0)));
        let out = PredicatePushdown.optimize(plan).unwrap();
        assert!(matches!(out, LogicalPlan::Scan { .. }));
        assert!(scan_predicate(&out).is_some());
    }

    #[test]
    fn test_pushes_through_bare_projection() {
        let plan = LogicalPlan::scan("t", schema())
            .project(vec![col("fare")])
            .filter(col("fare").gt(lit(5.0)));
        let out = PredicatePushdown.optimize(plan).unwrap();
        assert!(matches!(out, LogicalPlan::Project { .. }));
        assert!(scan_predicate(&out).is_some());
    }

    #[test]
    fn test_blocked_by_computed_column() {
        let plan = LogicalPlan::scan("t", schema())
            .with_columns(vec![col("fare").mul(lit(2.0)).alias("fare")])
            .filter(col("fare").gt(lit(5.0)));
        let out = PredicatePushdown.optimize(plan).unwrap();
        // The filter reads the recomputed column, so it stays above.
        assert!(matches!(out, LogicalPlan::Filter { .. }));
        assert!(scan_predicate(&out).is_none());
    }

    #[test]
    fn test_not_pushed_below_limit() {
        let plan = LogicalPlan::scan("t", schema())
            .limit(10)
            .filter(col("fare").gt(lit(5.0)));
        let out = PredicatePushdown.optimize(plan).unwrap();
        assert!(matches!(out, LogicalPlan::Filter { .. }));
        assert!(scan_predicate(&out).is_none());
    }

    #[test]
    fn test_pushes_through_group_keys() {
        let plan = LogicalPlan::scan("t", schema())
            .aggregate(vec![col("zone")], vec![AggExpr::count()])
            .filter(col("zone").eq(lit("JFK")));
        let out = PredicatePushdown.optimize(plan).unwrap();
        assert!(matches!(out, LogicalPlan::Aggregate { .. }));
        assert!(scan_predicate(&out).is_some());
    }

    #[test]
    fn test_filter_on_aggregate_output_stays() {
        let plan = LogicalPlan::scan("t", schema())
            .aggregate(vec![col("zone")], vec![AggExpr::count()])
            .filter(col("count").gt(lit(3i64)));
        let out = PredicatePushdown.optimize(plan).unwrap();
        assert!(matches!(out, LogicalPlan::Filter { .. }));
    }

    #[test]
    fn test_stacked_filters_conjoined() {
        let plan = LogicalPlan::scan("t", schema())
            .filter(col("fare").gt(lit(5.0)))
            .filter(col("zone").eq(lit("JFK")));
        let out = PredicatePushdown.optimize(plan).unwrap();
        let pred = scan_predicate(&out).cloned().unwrap();
        assert!(matches!(pred, Expr::BinaryOp { .. }));
    }

    #[test]
    fn test_union_gets_predicate_per_input() {
        let a = LogicalPlan::scan("a", schema());
        let b = LogicalPlan::scan("b", schema());
        let plan = LogicalPlan::union(vec![a, b]).filter(col("fare").gt(lit(1.0)));
        let out = PredicatePushdown.optimize(plan).unwrap();
        match out {
            LogicalPlan::Union { inputs } => {
                for input in &inputs {
                    assert!(scan_predicate(input).is_some());
                }
            }
            other => panic!("expected union, got {}", other),
        }
    }

    #[test]
    fn test_idempotent() {
        let plan = LogicalPlan::scan("t", schema())
            .filter(col("fare").gt(lit(5.0)))
            .project(vec![col("zone")]);
        let once = PredicatePushdown.optimize(plan).unwrap();
        let twice = PredicatePushdown.optimize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
