//! Limit execution.

use crate::executor::relation::Relation;

/// Skips `offset` rows, then keeps at most `limit` rows.
pub fn execute_limit(input: Relation, offset: usize, limit: usize) -> Relation {
    let (schema, rows) = input.into_parts();
    let rows = rows.into_iter().skip(offset).take(limit).collect();
    Relation::new(schema, rows)
}
