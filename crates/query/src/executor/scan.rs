//! Scan execution.
//!
//! Applies the three pushdown slots at read time: the projection narrows
//! which column chunks are decoded, the predicate filters rows and lets
//! whole row groups be skipped on their statistics, and the limit stops
//! reading as soon as enough rows survive.
//!
//! The scan reads the union of projected and predicate columns, then
//! emits only the projected ones.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::executor::eval::eval_predicate;
use crate::executor::relation::Relation;
use crate::executor::source::{DataSource, GroupInfo};
use rivulet_core::{DataType, Result, Schema, Value};

/// Runs a scan against a source.
pub fn execute_scan(
    source: &dyn DataSource,
    projection: Option<&[String]>,
    predicate: Option<&Expr>,
    limit: Option<usize>,
) -> Result<Relation> {
    let full = source.schema();
    let output_names: Vec<String> = match projection {
        Some(names) => names.to_vec(),
        None => full.names(),
    };

    // Read what the output needs plus what the predicate reads.
    let mut read_names = output_names.clone();
    if let Some(predicate) = predicate {
        for name in predicate.referenced_columns() {
            if !read_names.iter().any(|n| *n == name) {
                read_names.push(name);
            }
        }
    }
    let read_indices = full.projection_indices(&read_names)?;
    let read_schema = full.project(&read_names)?;

    let output_schema = full.project(&output_names)?;
    let output_positions: Vec<usize> = output_schema
        .names()
        .iter()
        .map(|name| read_schema.index_of(name).unwrap_or(usize::MAX))
        .collect();

    let mut rows = Vec::new();
    'partitions: for partition in 0..source.partition_count() {
        let groups = source.group_infos(partition)?;
        for (group, info) in groups.iter().enumerate() {
            if let Some(limit) = limit {
                if rows.len() >= limit {
                    break 'partitions;
                }
            }
            if let Some(predicate) = predicate {
                if !group_may_match(predicate, full, info) {
                    log::debug!(
                        "skipped group {} of partition {} on stats",
                        group,
                        partition
                    );
                    continue;
                }
            }
            for row in source.read_group(partition, group, Some(&read_indices))? {
                if let Some(predicate) = predicate {
                    if !eval_predicate(predicate, &read_schema, &row)? {
                        continue;
                    }
                }
                rows.push(row.project(&output_positions));
                if let Some(limit) = limit {
                    if rows.len() >= limit {
                        break 'partitions;
                    }
                }
            }
        }
    }
    Ok(Relation::new(output_schema, rows))
}

/// Peels casts and aliases off a column reference, keeping the cast
/// chain so group bounds can be transformed the same way.
fn column_target(expr: &Expr) -> Option<(&str, Vec<DataType>)> {
    match expr {
        Expr::Column(name) => Some((name, Vec::new())),
        Expr::Cast { expr, to } => {
            let (name, mut casts) = column_target(expr)?;
            casts.push(*to);
            Some((name, casts))
        }
        Expr::Alias { expr, .. } => column_target(expr),
        _ => None,
    }
}

/// Casts that keep values in order, so `[cast(min), cast(max)]` still
/// bounds every cast row value. Narrowing integer casts wrap and float
/// truncation maps NaN to zero, so those bounds cannot be trusted.
fn order_preserving(from: DataType, to: DataType) -> bool {
    from == to
        || matches!(
            (from, to),
            (DataType::Int32, DataType::Int64)
                | (DataType::Int32, DataType::Float64)
                | (DataType::Int64, DataType::Float64)
                | (DataType::Date, DataType::Datetime)
                | (DataType::Datetime, DataType::Date)
        )
}

fn cast_bound(bound: &Value, casts: &[DataType]) -> Option<Value> {
    let mut value = bound.clone();
    for to in casts {
        if !order_preserving(value.data_type()?, *to) {
            return None;
        }
        value = value.cast(*to).ok()?;
    }
    Some(value)
}

/// Conservative check: can any row of a group with these statistics
/// satisfy the predicate? `true` means "maybe"; only a definite `false`
/// skips the group.
pub fn group_may_match(predicate: &Expr, schema: &Schema, info: &GroupInfo) -> bool {
    match predicate {
        Expr::BinaryOp { left, op, right } => match op {
            BinaryOp::And => {
                group_may_match(left, schema, info) && group_may_match(right, schema, info)
            }
            BinaryOp::Or => {
                group_may_match(left, schema, info) || group_may_match(right, schema, info)
            }
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
            | BinaryOp::Ge => comparison_may_match(left, *op, right, schema, info),
            _ => true,
        },
        Expr::UnaryOp { op, expr } => match (op, column_target(expr)) {
            (UnaryOp::IsNull, Some((name, casts))) if casts.is_empty() => {
                column_stats(name, schema, info)
                    .map(|s| s.null_count > 0)
                    .unwrap_or(true)
            }
            (UnaryOp::IsNotNull, Some((name, casts))) if casts.is_empty() => {
                column_stats(name, schema, info)
                    .map(|s| s.null_count < info.row_count)
                    .unwrap_or(true)
            }
            _ => true,
        },
        _ => true,
    }
}

fn column_stats<'a>(
    name: &str,
    schema: &Schema,
    info: &'a GroupInfo,
) -> Option<&'a rivulet_source::ColumnStats> {
    info.stats.get(schema.index_of(name)?)
}

fn mirror(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Le => BinaryOp::Ge,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::Ge => BinaryOp::Le,
        other => other,
    }
}

fn comparison_may_match(
    left: &Expr,
    op: BinaryOp,
    right: &Expr,
    schema: &Schema,
    info: &GroupInfo,
) -> bool {
    // Normalize to column OP literal.
    let (column, op, literal) = match (column_target(left), right) {
        (Some(target), Expr::Literal(value)) => (target, op, value),
        _ => match (left, column_target(right)) {
            (Expr::Literal(value), Some(target)) => (target, mirror(op), value),
            _ => return true,
        },
    };
    if literal.is_null() {
        // A null literal never compares true.
        return false;
    }
    let (name, casts) = column;
    let stats = match column_stats(name, schema, info) {
        Some(stats) => stats,
        None => return true,
    };
    let (min, max) = match (&stats.min, &stats.max) {
        (Some(min), Some(max)) => (min, max),
        // No non-null values, so no row can compare true.
        _ => return false,
    };
    let (min, max) = match (cast_bound(min, &casts), cast_bound(max, &casts)) {
        (Some(min), Some(max)) => (min, max),
        _ => return true,
    };
    match op {
        BinaryOp::Eq => *literal >= min && *literal <= max,
        BinaryOp::Ne => !(min == max && *literal == min),
        BinaryOp::Lt => min < *literal,
        BinaryOp::Le => min <= *literal,
        BinaryOp::Gt => max > *literal,
        BinaryOp::Ge => max >= *literal,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit};
    use crate::executor::source::InMemorySource;
    use rivulet_core::{Field, Row};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("day", DataType::Int64),
            Field::new("fare", DataType::Float64),
        ])
        .unwrap()
    }

    fn grouped_source() -> InMemorySource {
        // Two groups with disjoint day ranges.
        let g1 = vec![
            Row::new(vec![Value::Int64(1), Value::Float64(10.0)]),
            Row::new(vec![Value::Int64(2), Value::Float64(20.0)]),
        ];
        let g2 = vec![
            Row::new(vec![Value::Int64(8), Value::Float64(30.0)]),
            Row::new(vec![Value::Int64(9), Value::Float64(40.0)]),
        ];
        InMemorySource::with_groups(schema(), vec![g1, g2])
    }

    #[test]
    fn test_plain_scan_reads_everything() {
        let out = execute_scan(&grouped_source(), None, None, None).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.schema().names(), vec!["day", "fare"]);
    }

    #[test]
    fn test_predicate_filters_rows() {
        let predicate = col("fare").ge(lit(20.0));
        let out = execute_scan(&grouped_source(), None, Some(&predicate), None).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_projection_narrows_output() {
        let projection = vec!["fare".to_string()];
        let predicate = col("day").gt(lit(7i64));
        let out =
            execute_scan(&grouped_source(), Some(&projection), Some(&predicate), None).unwrap();
        assert_eq!(out.schema().names(), vec!["fare"]);
        assert_eq!(out.rows()[0].values(), &[Value::Float64(30.0)]);
    }

    #[test]
    fn test_limit_stops_early() {
        let out = execute_scan(&grouped_source(), None, None, Some(3)).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_group_pruned_on_range() {
        let source = grouped_source();
        let infos = source.group_infos(0).unwrap();
        let predicate = col("day").gt(lit(5i64));
        assert!(!group_may_match(&predicate, &schema(), &infos[0]));
        assert!(group_may_match(&predicate, &schema(), &infos[1]));
    }

    #[test]
    fn test_conjunction_prunes_when_either_side_does() {
        let source = grouped_source();
        let infos = source.group_infos(0).unwrap();
        let predicate = col("fare").gt(lit(0.0)).and(col("day").gt(lit(5i64)));
        assert!(!group_may_match(&predicate, &schema(), &infos[0]));
    }

    #[test]
    fn test_equality_outside_range_prunes() {
        let source = grouped_source();
        let infos = source.group_infos(0).unwrap();
        assert!(!group_may_match(&col("day").eq(lit(5i64)), &schema(), &infos[0]));
        assert!(group_may_match(&col("day").eq(lit(2i64)), &schema(), &infos[0]));
    }

    #[test]
    fn test_flipped_comparison() {
        let source = grouped_source();
        let infos = source.group_infos(0).unwrap();
        // 5 < day is day > 5.
        let predicate = lit(5i64).lt(col("day"));
        assert!(!group_may_match(&predicate, &schema(), &infos[0]));
    }

    #[test]
    fn test_cast_wrapped_column_still_prunes() {
        let source = grouped_source();
        let infos = source.group_infos(0).unwrap();
        let predicate = col("day").cast(DataType::Float64).gt(lit(5.0));
        assert!(!group_may_match(&predicate, &schema(), &infos[0]));
    }

    #[test]
    fn test_narrowing_cast_keeps_group() {
        let schema = Schema::new(vec![Field::new("x", DataType::Int64)]).unwrap();
        let source = InMemorySource::new(
            schema.clone(),
            vec![
                Row::new(vec![Value::Int64(0)]),
                Row::new(vec![Value::Int64(4_294_967_196)]),
            ],
        );
        let infos = source.group_infos(0).unwrap();
        // 4_294_967_196 wraps to -100 as an i32, outside the group's
        // untransformed range; the group must still be read.
        let predicate = col("x").cast(DataType::Int32).eq(lit(-100i32));
        assert!(group_may_match(&predicate, &schema, &infos[0]));
        let out = execute_scan(&source, None, Some(&predicate), None).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0].values(), &[Value::Int64(4_294_967_196)]);
    }

    #[test]
    fn test_unknown_shape_is_conservative() {
        let source = grouped_source();
        let infos = source.group_infos(0).unwrap();
        let predicate = col("day").add(lit(1i64)).gt(lit(100i64));
        assert!(group_may_match(&predicate, &schema(), &infos[0]));
    }

    #[test]
    fn test_is_not_null_prunes_all_null_groups() {
        let schema = Schema::new(vec![Field::new("x", DataType::Int64)]).unwrap();
        let source = InMemorySource::with_groups(
            schema.clone(),
            vec![vec![Row::new(vec![Value::Null])]],
        );
        let infos = source.group_infos(0).unwrap();
        assert!(!group_may_match(&col("x").is_not_null(), &schema, &infos[0]));
        assert!(group_may_match(&col("x").is_null(), &schema, &infos[0]));
    }
}
