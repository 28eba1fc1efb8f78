//! Type coercion pass.
//!
//! Inserts casts so binary operations see equal operand types, picking
//! the narrowest common supertype. Runs last in the pipeline, after
//! pushdowns have settled which expression sits where, so every
//! expression is coerced against the schema it will actually execute on.
//!
//! Operand types with no common supertype fail here, at optimization
//! time, not mid-scan.

use crate::ast::{AggExpr, Expr, UnaryOp};
use crate::optimizer::pass::OptimizerPass;
use crate::planner::{LogicalPlan, SortKey};
use rivulet_core::{DataType, Error, Result, Schema};

/// Inserts casts for mixed-type operations.
pub struct TypeCoercion;

impl OptimizerPass for TypeCoercion {
    fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan> {
        coerce_plan(plan)
    }

    fn name(&self) -> &'static str {
        "type_coercion"
    }
}

fn coerce_plan(plan: LogicalPlan) -> Result<LogicalPlan> {
    match plan {
        LogicalPlan::Scan {
            source,
            schema,
            projection,
            predicate,
            limit,
        } => {
            // The predicate slot sees the full file schema, not the
            // projected one.
            let predicate = match predicate {
                None => None,
                Some(p) => Some(coerce_expr(p, &schema)?),
            };
            Ok(LogicalPlan::Scan {
                source,
                schema,
                projection,
                predicate,
                limit,
            })
        }
        LogicalPlan::Filter { input, predicate } => {
            let input = coerce_plan(*input)?;
            let schema = input.schema()?;
            let predicate = coerce_expr(predicate, &schema)?;
            Ok(input.filter(predicate))
        }
        LogicalPlan::Project { input, exprs } => {
            let input = coerce_plan(*input)?;
            let schema = input.schema()?;
            let exprs = coerce_exprs(exprs, &schema)?;
            Ok(input.project(exprs))
        }
        LogicalPlan::WithColumns { input, exprs } => {
            let input = coerce_plan(*input)?;
            let schema = input.schema()?;
            let exprs = coerce_exprs(exprs, &schema)?;
            Ok(input.with_columns(exprs))
        }
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggs,
        } => {
            let input = coerce_plan(*input)?;
            let schema = input.schema()?;
            let group_by = coerce_exprs(group_by, &schema)?;
            let aggs = aggs
                .into_iter()
                .map(|agg| coerce_agg(agg, &schema))
                .collect::<Result<Vec<_>>>()?;
            Ok(input.aggregate(group_by, aggs))
        }
        LogicalPlan::Sort { input, keys } => {
            let input = coerce_plan(*input)?;
            let schema = input.schema()?;
            let keys = keys
                .into_iter()
                .map(|key| {
                    Ok(SortKey {
                        expr: coerce_expr(key.expr, &schema)?,
                        order: key.order,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(input.sort(keys))
        }
        LogicalPlan::Limit {
            input,
            offset,
            limit,
        } => Ok(coerce_plan(*input)?.slice(offset, limit)),
        LogicalPlan::Union { inputs } => Ok(LogicalPlan::Union {
            inputs: inputs
                .into_iter()
                .map(coerce_plan)
                .collect::<Result<Vec<_>>>()?,
        }),
        LogicalPlan::Cache { input, id } => Ok(LogicalPlan::Cache {
            input: Box::new(coerce_plan(*input)?),
            id,
        }),
    }
}

fn coerce_exprs(exprs: Vec<Expr>, schema: &Schema) -> Result<Vec<Expr>> {
    exprs
        .into_iter()
        .map(|e| coerce_expr(e, schema))
        .collect()
}

fn coerce_agg(mut agg: AggExpr, schema: &Schema) -> Result<AggExpr> {
    agg.input = match agg.input {
        None => None,
        Some(expr) => Some(coerce_expr(expr, schema)?),
    };
    Ok(agg)
}

/// Wraps the expression in a cast when its type differs from the target.
fn cast_to(expr: Expr, from: DataType, to: DataType) -> Expr {
    if from == to {
        expr
    } else {
        expr.cast(to)
    }
}

fn coerce_expr(expr: Expr, schema: &Schema) -> Result<Expr> {
    match expr {
        Expr::BinaryOp { left, op, right } => {
            let left = coerce_expr(*left, schema)?;
            let right = coerce_expr(*right, schema)?;
            let lt = left.resolve_type(schema)?;
            let rt = right.resolve_type(schema)?;
            if op.is_logical() {
                if lt != DataType::Boolean || rt != DataType::Boolean {
                    return Err(Error::type_mismatch(lt, rt));
                }
                return Ok(left.binary(op, right));
            }
            let common = DataType::common_super_type(lt, rt)
                .ok_or_else(|| Error::type_mismatch(lt, rt))?;
            if op.is_arithmetic() && !common.is_numeric() {
                return Err(Error::type_mismatch(lt, rt));
            }
            let left = cast_to(left, lt, common);
            let right = cast_to(right, rt, common);
            Ok(left.binary(op, right))
        }
        Expr::UnaryOp { op, expr } => {
            let expr = coerce_expr(*expr, schema)?;
            let ty = expr.resolve_type(schema)?;
            match op {
                UnaryOp::Not if ty != DataType::Boolean => {
                    Err(Error::type_mismatch(ty, DataType::Boolean))
                }
                UnaryOp::Neg if !ty.is_numeric() => {
                    Err(Error::type_mismatch(ty, DataType::Float64))
                }
                _ => Ok(Expr::UnaryOp {
                    op,
                    expr: Box::new(expr),
                }),
            }
        }
        Expr::Cast { expr, to } => Ok(Expr::Cast {
            expr: Box::new(coerce_expr(*expr, schema)?),
            to,
        }),
        Expr::Alias { expr, name } => Ok(Expr::Alias {
            expr: Box::new(coerce_expr(*expr, schema)?),
            name,
        }),
        leaf @ (Expr::Column(_) | Expr::Literal(_)) => Ok(leaf),
    }
}
