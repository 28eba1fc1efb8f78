//! Projection pushdown pass.
//!
//! Walks the tree top-down carrying the set of columns the nodes above
//! still need, and attaches that set to scans so unused columns are never
//! materialized. `None` means "all columns" and is the state at the root;
//! a finite set first appears below a narrowing node such as a projection
//! or an aggregation.
//!
//! The pass may only narrow the column set reaching a node, never widen
//! it, so a plan's output schema is unchanged.

use crate::ast::Expr;
use crate::optimizer::pass::OptimizerPass;
use crate::planner::LogicalPlan;
use hashbrown::HashSet;
use rivulet_core::Result;

/// Narrows scans to the columns the plan actually reads.
pub struct ProjectionPushdown;

impl OptimizerPass for ProjectionPushdown {
    fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan> {
        Ok(push(plan, None))
    }

    fn name(&self) -> &'static str {
        "projection_pushdown"
    }
}

/// Extends a finite requirement with an expression's columns. `None`
/// stays `None`: everything is already required.
fn require(required: Option<HashSet<String>>, exprs: &[Expr]) -> Option<HashSet<String>> {
    required.map(|mut set| {
        for expr in exprs {
            expr.collect_columns(&mut set);
        }
        set
    })
}

fn columns_of(exprs: &[Expr]) -> HashSet<String> {
    let mut set = HashSet::new();
    for expr in exprs {
        expr.collect_columns(&mut set);
    }
    set
}

fn push(plan: LogicalPlan, required: Option<HashSet<String>>) -> LogicalPlan {
    match plan {
        LogicalPlan::Scan {
            source,
            schema,
            projection,
            predicate,
            limit,
        } => {
            let projection = match required {
                None => projection,
                Some(required) => {
                    // Narrow within the currently visible columns, keeping
                    // their order.
                    let visible: Vec<String> = match projection {
                        Some(names) => names,
                        None => schema.names(),
                    };
                    let mut narrowed: Vec<String> = visible
                        .iter()
                        .filter(|name| required.contains(name.as_str()))
                        .cloned()
                        .collect();
                    // A zero-column scan would lose row counts; keep one.
                    if narrowed.is_empty() {
                        if let Some(first) = visible.first() {
                            narrowed.push(first.clone());
                        }
                    }
                    Some(narrowed)
                }
            };
            LogicalPlan::Scan {
                source,
                schema,
                projection,
                predicate,
                limit,
            }
        }
        LogicalPlan::Filter { input, predicate } => {
            let below = require(required, core::slice::from_ref(&predicate));
            LogicalPlan::Filter {
                input: Box::new(push(*input, below)),
                predicate,
            }
        }
        LogicalPlan::Project { input, exprs } => {
            // Drop projection expressions nothing above reads.
            let exprs: Vec<Expr> = match &required {
                None => exprs,
                Some(required) => {
                    let kept: Vec<Expr> = exprs
                        .iter()
                        .filter(|e| {
                            e.output_name()
                                .map(|n| required.contains(&n))
                                .unwrap_or(true)
                        })
                        .cloned()
                        .collect();
                    if kept.is_empty() {
                        exprs.into_iter().take(1).collect()
                    } else {
                        kept
                    }
                }
            };
            let below = columns_of(&exprs);
            LogicalPlan::Project {
                input: Box::new(push(*input, Some(below))),
                exprs,
            }
        }
        LogicalPlan::WithColumns { input, exprs } => {
            let exprs: Vec<Expr> = match &required {
                None => exprs,
                Some(required) => exprs
                    .iter()
                    .filter(|e| {
                        e.output_name()
                            .map(|n| required.contains(&n))
                            .unwrap_or(true)
                    })
                    .cloned()
                    .collect(),
            };
            let below = require(required, &exprs);
            LogicalPlan::WithColumns {
                input: Box::new(push(*input, below)),
                exprs,
            }
        }
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggs,
        } => {
            // An aggregation reads only its keys and aggregate inputs,
            // regardless of what the nodes above need.
            let mut below = columns_of(&group_by);
            for agg in &aggs {
                if let Some(expr) = &agg.input {
                    expr.collect_columns(&mut below);
                }
            }
            LogicalPlan::Aggregate {
                input: Box::new(push(*input, Some(below))),
                group_by,
                aggs,
            }
        }
        LogicalPlan::Sort { input, keys } => {
            let key_exprs: Vec<Expr> = keys.iter().map(|k| k.expr.clone()).collect();
            let below = require(required, &key_exprs);
            LogicalPlan::Sort {
                input: Box::new(push(*input, below)),
                keys,
            }
        }
        LogicalPlan::Limit {
            input,
            offset,
            limit,
        } => LogicalPlan::Limit {
            input: Box::new(push(*input, required)),
            offset,
            limit,
        },
        LogicalPlan::Union { inputs } => LogicalPlan::Union {
            inputs: inputs
                .into_iter()
                .map(|input| push(input, required.clone()))
                .collect(),
        },
        // Cached subtrees serve several consumers; narrowing for one
        // could starve another.
        LogicalPlan::Cache { input, id } => LogicalPlan::Cache {
            input: Box::new(push(*input, None)),
            id,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit, AggExpr};
    use rivulet_core::{DataType, Field, Schema};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("pickup_date", DataType::Date),
            Field::new("zone", DataType::Utf8),
            Field::new("fare", DataType::Float64),
            Field::new("tip", DataType::Float64),
        ])
        .unwrap()
    }

    fn scan_projection(plan: &LogicalPlan) -> Option<Vec<String>> {
        match plan {
            LogicalPlan::Scan { projection, .. } => projection.clone(),
            _ => plan.inputs().first().and_then(|p| scan_projection(p)),
        }
    }

    #[test]
    fn test_select_narrows_scan() {
        let plan = LogicalPlan::scan("t", schema()).project(vec![col("fare")]);
        let out = ProjectionPushdown.optimize(plan).unwrap();
        assert_eq!(scan_projection(&out), Some(vec!["fare".to_string()]));
    }

    #[test]
    fn test_bare_plan_reads_everything() {
        let plan = LogicalPlan::scan("t", schema()).filter(col("fare").gt(lit(1.0)));
        let out = ProjectionPushdown.optimize(plan).unwrap();
        assert_eq!(scan_projection(&out), None);
    }

    #[test]
    fn test_filter_columns_survive_narrowing() {
        let plan = LogicalPlan::scan("t", schema())
            .filter(col("tip").gt(lit(0.0)))
            .project(vec![col("fare")]);
        let out = ProjectionPushdown.optimize(plan).unwrap();
        // Declaration order, filter column included.
        assert_eq!(
            scan_projection(&out),
            Some(vec!["fare".to_string(), "tip".to_string()])
        );
    }

    #[test]
    fn test_aggregate_narrows_to_keys_and_inputs() {
        let plan = LogicalPlan::scan("t", schema()).aggregate(
            vec![col("zone")],
            vec![AggExpr::sum(col("fare")).alias("total")],
        );
        let out = ProjectionPushdown.optimize(plan).unwrap();
        assert_eq!(
            scan_projection(&out),
            Some(vec!["zone".to_string(), "fare".to_string()])
        );
    }

    #[test]
    fn test_count_keeps_one_column() {
        let plan =
            LogicalPlan::scan("t", schema()).aggregate(Vec::new(), vec![AggExpr::count()]);
        let out = ProjectionPushdown.optimize(plan).unwrap();
        assert_eq!(
            scan_projection(&out),
            Some(vec!["pickup_date".to_string()])
        );
    }

    #[test]
    fn test_unused_derived_column_dropped() {
        let plan = LogicalPlan::scan("t", schema())
            .with_columns(vec![col("fare").add(col("tip")).alias("total")])
            .project(vec![col("zone")]);
        let out = ProjectionPushdown.optimize(plan).unwrap();
        match &out {
            LogicalPlan::Project { input, .. } => match input.as_ref() {
                LogicalPlan::WithColumns { exprs, .. } => assert!(exprs.is_empty()),
                other => panic!("expected with_columns, got {}", other),
            },
            other => panic!("expected project, got {}", other),
        }
        assert_eq!(scan_projection(&out), Some(vec!["zone".to_string()]));
    }

    #[test]
    fn test_idempotent() {
        let plan = LogicalPlan::scan("t", schema())
            .filter(col("tip").gt(lit(0.0)))
            .project(vec![col("fare")]);
        let once = ProjectionPushdown.optimize(plan).unwrap();
        let twice = ProjectionPushdown.optimize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
