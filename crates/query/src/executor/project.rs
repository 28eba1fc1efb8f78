//! Projection and column-derivation execution.

use crate::ast::Expr;
use crate::executor::eval::eval_expr;
use crate::executor::relation::Relation;
use crate::planner::output_field;
use rivulet_core::{Result, Row, Schema};

/// Replaces the column set with the given expressions, in request order.
pub fn execute_project(input: Relation, exprs: &[Expr]) -> Result<Relation> {
    let (input_schema, input_rows) = input.into_parts();
    let mut fields = Vec::with_capacity(exprs.len());
    for expr in exprs {
        fields.push(output_field(expr, &input_schema)?);
    }
    let schema = Schema::new(fields)?;

    let mut rows = Vec::with_capacity(input_rows.len());
    for row in &input_rows {
        let values = exprs
            .iter()
            .map(|e| eval_expr(e, &input_schema, row))
            .collect::<Result<Vec<_>>>()?;
        rows.push(Row::new(values));
    }
    Ok(Relation::new(schema, rows))
}

/// Adds or replaces columns, keeping the rest.
///
/// Every expression is evaluated against the input schema, so one
/// derived column cannot see another from the same call.
pub fn execute_with_columns(input: Relation, exprs: &[Expr]) -> Result<Relation> {
    let (input_schema, input_rows) = input.into_parts();
    let mut schema = input_schema.clone();
    // Position of each derived column in the output: an existing index
    // replaces in place, a fresh one appends.
    let mut targets = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let field = output_field(expr, &input_schema)?;
        let target = schema.index_of(field.name());
        schema.upsert(field);
        targets.push(target);
    }

    let mut rows = Vec::with_capacity(input_rows.len());
    for row in input_rows {
        let derived = exprs
            .iter()
            .map(|e| eval_expr(e, &input_schema, &row))
            .collect::<Result<Vec<_>>>()?;
        let mut values = row.into_values();
        for (target, value) in targets.iter().zip(derived) {
            match target {
                Some(index) => values[*index] = value,
                None => values.push(value),
            }
        }
        rows.push(Row::new(values));
    }
    Ok(Relation::new(schema, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit};
    use rivulet_core::{DataType, Field, Value};

    fn input() -> Relation {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int64),
            Field::new("b", DataType::Float64),
        ])
        .unwrap();
        let rows = vec![
            Row::new(vec![Value::Int64(1), Value::Float64(10.0)]),
            Row::new(vec![Value::Int64(2), Value::Float64(20.0)]),
        ];
        Relation::new(schema, rows)
    }

    #[test]
    fn test_project_reorders_and_computes() {
        let out = execute_project(
            input(),
            &[col("b"), col("a").add(lit(100i64)).alias("a2")],
        )
        .unwrap();
        assert_eq!(out.schema().names(), vec!["b", "a2"]);
        assert_eq!(
            out.rows()[0].values(),
            &[Value::Float64(10.0), Value::Int64(101)]
        );
    }

    #[test]
    fn test_with_columns_appends() {
        let out =
            execute_with_columns(input(), &[col("b").mul(lit(2.0)).alias("b2")]).unwrap();
        assert_eq!(out.schema().names(), vec!["a", "b", "b2"]);
        assert_eq!(out.rows()[1].get(2), Some(&Value::Float64(40.0)));
    }

    #[test]
    fn test_with_columns_replaces_in_place() {
        let out =
            execute_with_columns(input(), &[col("b").mul(lit(2.0)).alias("b")]).unwrap();
        assert_eq!(out.schema().names(), vec!["a", "b"]);
        assert_eq!(out.rows()[0].get(1), Some(&Value::Float64(20.0)));
    }

    #[test]
    fn test_derived_columns_see_input_only() {
        // The second expression reads the original b, not the replaced one.
        let out = execute_with_columns(
            input(),
            &[
                col("b").mul(lit(2.0)).alias("b"),
                col("b").add(lit(1.0)).alias("c"),
            ],
        )
        .unwrap();
        assert_eq!(out.rows()[0].get(1), Some(&Value::Float64(20.0)));
        assert_eq!(out.rows()[0].get(2), Some(&Value::Float64(11.0)));
    }
}
