//! Filter execution.

use crate::ast::Expr;
use crate::executor::eval::eval_predicate;
use crate::executor::relation::Relation;
use rivulet_core::Result;

/// Keeps rows where the predicate evaluates to true. A null predicate
/// result drops the row.
pub fn execute_filter(input: Relation, predicate: &Expr) -> Result<Relation> {
    let (schema, rows) = input.into_parts();
    let mut kept = Vec::new();
    for row in rows {
        if eval_predicate(predicate, &schema, &row)? {
            kept.push(row);
        }
    }
    Ok(Relation::new(schema, kept))
}
