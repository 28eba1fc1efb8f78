//! Expression simplification pass.
//!
//! Constant-folds expressions and applies algebraic identities, iterating
//! the whole plan to a fixed point because one simplification can expose
//! another. Folding uses the same evaluation routines as the executor, so
//! a folded plan cannot disagree with an unfolded one.
//!
//! A filter whose predicate folds to `true` is dropped. A `false`
//! predicate is left in place; the executor makes it cheap anyway and
//! keeping the node keeps this pass purely expression-local.

use crate::ast::{BinaryOp, Expr};
use crate::executor::eval::{eval_binary, eval_unary};
use crate::optimizer::pass::OptimizerPass;
use crate::planner::LogicalPlan;
use rivulet_core::{Result, Value};

/// Folds constants and drops vacuous filters.
pub struct SimplifyExpressions;

impl OptimizerPass for SimplifyExpressions {
    fn optimize(&self, mut plan: LogicalPlan) -> Result<LogicalPlan> {
        loop {
            let next = simplify_plan(plan.clone());
            if next == plan {
                return Ok(next);
            }
            plan = next;
        }
    }

    fn name(&self) -> &'static str {
        "simplify_expressions"
    }
}

fn is_true(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Value::Boolean(true)))
}

fn simplify_plan(plan: LogicalPlan) -> LogicalPlan {
    match plan {
        LogicalPlan::Scan {
            source,
            schema,
            projection,
            predicate,
            limit,
        } => {
            let predicate = predicate.map(simplify_expr).filter(|p| !is_true(p));
            LogicalPlan::Scan {
                source,
                schema,
                projection,
                predicate,
                limit,
            }
        }
        LogicalPlan::Filter { input, predicate } => {
            let input = simplify_plan(*input);
            let predicate = simplify_expr(predicate);
            if is_true(&predicate) {
                input
            } else {
                input.filter(predicate)
            }
        }
        LogicalPlan::Project { input, exprs } => LogicalPlan::Project {
            input: Box::new(simplify_plan(*input)),
            exprs: exprs.into_iter().map(simplify_expr).collect(),
        },
        LogicalPlan::WithColumns { input, exprs } => LogicalPlan::WithColumns {
            input: Box::new(simplify_plan(*input)),
            exprs: exprs.into_iter().map(simplify_expr).collect(),
        },
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggs,
        } => LogicalPlan::Aggregate {
            input: Box::new(simplify_plan(*input)),
            group_by: group_by.into_iter().map(simplify_expr).collect(),
            aggs: aggs
                .into_iter()
                .map(|mut agg| {
                    agg.input = agg.input.map(simplify_expr);
                    agg
                })
                .collect(),
        },
        LogicalPlan::Sort { input, keys } => LogicalPlan::Sort {
            input: Box::new(simplify_plan(*input)),
            keys: keys
                .into_iter()
                .map(|mut key| {
                    key.expr = simplify_expr(key.expr);
                    key
                })
                .collect(),
        },
        LogicalPlan::Limit {
            input,
            offset,
            limit,
        } => LogicalPlan::Limit {
            input: Box::new(simplify_plan(*input)),
            offset,
            limit,
        },
        LogicalPlan::Union { inputs } => LogicalPlan::Union {
            inputs: inputs.into_iter().map(simplify_plan).collect(),
        },
        LogicalPlan::Cache { input, id } => LogicalPlan::Cache {
            input: Box::new(simplify_plan(*input)),
            id,
        },
    }
}

/// Simplifies an expression bottom-up.
fn simplify_expr(expr: Expr) -> Expr {
    match expr {
        Expr::BinaryOp { left, op, right } => {
            let left = simplify_expr(*left);
            let right = simplify_expr(*right);
            fold_binary(left, op, right)
        }
        Expr::UnaryOp { op, expr } => {
            let expr = simplify_expr(*expr);
            if let Expr::Literal(value) = &expr {
                if let Ok(folded) = eval_unary(op, value) {
                    return Expr::Literal(folded);
                }
            }
            // Double negation cancels.
            if op == crate::ast::UnaryOp::Not {
                if let Expr::UnaryOp {
                    op: crate::ast::UnaryOp::Not,
                    expr: inner,
                } = expr
                {
                    return *inner;
                }
                return Expr::UnaryOp {
                    op,
                    expr: Box::new(expr),
                };
            }
            Expr::UnaryOp {
                op,
                expr: Box::new(expr),
            }
        }
        Expr::Cast { expr, to } => {
            let expr = simplify_expr(*expr);
            if let Expr::Literal(value) = &expr {
                if let Ok(folded) = value.cast(to) {
                    return Expr::Literal(folded);
                }
            }
            Expr::Cast {
                expr: Box::new(expr),
                to,
            }
        }
        Expr::Alias { expr, name } => Expr::Alias {
            expr: Box::new(simplify_expr(*expr)),
            name,
        },
        leaf => leaf,
    }
}

fn fold_binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    // Two literals fold outright when evaluation succeeds; a failure is
    // left for type coercion or runtime to report.
    if let (Expr::Literal(a), Expr::Literal(b)) = (&left, &right) {
        if let Ok(folded) = eval_binary(op, a, b) {
            return Expr::Literal(folded);
        }
    }

    // Identities that keep the left operand keep its output name too, so
    // only right-literal forms are rewritten.
    match (op, &right) {
        (BinaryOp::And, Expr::Literal(Value::Boolean(true))) => return left,
        (BinaryOp::Or, Expr::Literal(Value::Boolean(false))) => return left,
        // x AND false is false even for null x under three-valued logic.
        (BinaryOp::And, Expr::Literal(Value::Boolean(false))) => {
            return Expr::Literal(Value::Boolean(false))
        }
        (BinaryOp::Or, Expr::Literal(Value::Boolean(true))) => {
            return Expr::Literal(Value::Boolean(true))
        }
        (BinaryOp::Add, Expr::Literal(v)) if is_zero(v) => return left,
        (BinaryOp::Sub, Expr::Literal(v)) if is_zero(v) => return left,
        (BinaryOp::Mul, Expr::Literal(v)) if is_one(v) => return left,
        (BinaryOp::Div, Expr::Literal(v)) if is_one(v) => return left,
        _ => {}
    }

    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn is_zero(value: &Value) -> bool {
    matches!(value, Value::Int32(0) | Value::Int64(0)) || value.as_f64() == Some(0.0)
}

fn is_one(value: &Value) -> bool {
    matches!(value, Value::Int32(1) | Value::Int64(1)) || value.as_f64() == Some(1.0)
}
