//! Sort execution.

use crate::ast::SortOrder;
use crate::executor::eval::eval_expr;
use crate::executor::relation::Relation;
use crate::planner::SortKey;
use rivulet_core::{Result, Value};

/// Stable multi-key sort.
///
/// Uses the total value order: nulls first ascending, NaN after all
/// other floats. Rows with equal keys keep their input order.
pub fn execute_sort(input: Relation, keys: &[SortKey]) -> Result<Relation> {
    let (schema, rows) = input.into_parts();

    let mut keyed: Vec<(Vec<Value>, rivulet_core::Row)> = Vec::with_capacity(rows.len());
    for row in rows {
        let key = keys
            .iter()
            .map(|k| eval_expr(&k.expr, &schema, &row))
            .collect::<Result<Vec<_>>>()?;
        keyed.push((key, row));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        for (i, key) in keys.iter().enumerate() {
            let ordering = a[i].cmp(&b[i]);
            let ordering = match key.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if !ordering.is_eq() {
                return ordering;
            }
        }
        core::cmp::Ordering::Equal
    });

    let rows = keyed.into_iter().map(|(_, row)| row).collect();
    Ok(Relation::new(schema, rows))
}
