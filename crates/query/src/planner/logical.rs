//! Logical plan tree.
//!
//! Plans are built by the frame API and rewritten by the optimizer. A plan
//! describes WHAT to compute; the executor walks it bottom-up and decides
//! how. Scans carry three pushdown slots (`projection`, `predicate`,
//! `limit`) that start empty and are filled in by optimizer passes.

use crate::ast::{AggExpr, Expr, SortOrder};
use rivulet_core::{Error, Field, Result, Schema};

/// One sort key: an expression and its direction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortKey {
    /// Key expression, usually a column reference.
    pub expr: Expr,
    /// Sort direction.
    pub order: SortOrder,
}

impl SortKey {
    /// Ascending sort on the expression.
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Asc,
        }
    }

    /// Descending sort on the expression.
    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Desc,
        }
    }
}

/// A node in the logical plan tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogicalPlan {
    /// Leaf: reads a named source.
    ///
    /// The three `Option` slots are pushdown targets. A freshly built plan
    /// leaves them empty; the optimizer moves work into them so the scan
    /// can skip columns, row groups and trailing rows at read time.
    Scan {
        /// Source name, resolved by the executor's catalog.
        source: String,
        /// Full schema of the source.
        schema: Schema,
        /// Columns to read, `None` for all.
        projection: Option<Vec<String>>,
        /// Row filter applied during the scan.
        predicate: Option<Expr>,
        /// Maximum rows to produce.
        limit: Option<usize>,
    },
    /// Keeps rows where the predicate evaluates to true.
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    /// Replaces the column set with the given expressions, in request order.
    Project {
        input: Box<LogicalPlan>,
        exprs: Vec<Expr>,
    },
    /// Adds or replaces columns, keeping the rest.
    WithColumns {
        input: Box<LogicalPlan>,
        exprs: Vec<Expr>,
    },
    /// Groups by key expressions and evaluates aggregates per group.
    Aggregate {
        input: Box<LogicalPlan>,
        group_by: Vec<Expr>,
        aggs: Vec<AggExpr>,
    },
    /// Stable multi-key sort.
    Sort {
        input: Box<LogicalPlan>,
        keys: Vec<SortKey>,
    },
    /// Skips `offset` rows, then keeps at most `limit` rows.
    Limit {
        input: Box<LogicalPlan>,
        offset: usize,
        limit: usize,
    },
    /// Concatenates inputs in order. All inputs must share a schema.
    Union { inputs: Vec<LogicalPlan> },
    /// Marks a subtree whose result the executor materializes once and
    /// reuses. Inserted by common subplan elimination; equal ids share a
    /// result.
    Cache { input: Box<LogicalPlan>, id: u64 },
}

impl LogicalPlan {
    /// Creates a scan of a named source with empty pushdown slots.
    pub fn scan(source: impl Into<String>, schema: Schema) -> Self {
        LogicalPlan::Scan {
            source: source.into(),
            schema,
            projection: None,
            predicate: None,
            limit: None,
        }
    }

    /// Wraps this plan in a filter.
    pub fn filter(self, predicate: Expr) -> Self {
        LogicalPlan::Filter {
            input: Box::new(self),
            predicate,
        }
    }

    /// Wraps this plan in a projection.
    pub fn project(self, exprs: Vec<Expr>) -> Self {
        LogicalPlan::Project {
            input: Box::new(self),
            exprs,
        }
    }

    /// Wraps this plan in a with-columns node.
    pub fn with_columns(self, exprs: Vec<Expr>) -> Self {
        LogicalPlan::WithColumns {
            input: Box::new(self),
            exprs,
        }
    }

    /// Wraps this plan in an aggregation.
    pub fn aggregate(self, group_by: Vec<Expr>, aggs: Vec<AggExpr>) -> Self {
        LogicalPlan::Aggregate {
            input: Box::new(self),
            group_by,
            aggs,
        }
    }

    /// Wraps this plan in a sort.
    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        LogicalPlan::Sort {
            input: Box::new(self),
            keys,
        }
    }

    /// Wraps this plan in a limit.
    pub fn limit(self, limit: usize) -> Self {
        LogicalPlan::Limit {
            input: Box::new(self),
            offset: 0,
            limit,
        }
    }

    /// Wraps this plan in an offset+limit slice.
    pub fn slice(self, offset: usize, limit: usize) -> Self {
        LogicalPlan::Limit {
            input: Box::new(self),
            offset,
            limit,
        }
    }

    /// Concatenates plans in order.
    pub fn union(inputs: Vec<LogicalPlan>) -> Self {
        LogicalPlan::Union { inputs }
    }

    /// Resolves the output schema of this plan.
    ///
    /// Schema resolution is where plan errors surface before any data is
    /// read: unknown columns, incompatible operand types and mismatched
    /// union inputs all fail here.
    pub fn schema(&self) -> Result<Schema> {
        match self {
            LogicalPlan::Scan {
                schema, projection, ..
            } => match projection {
                None => Ok(schema.clone()),
                Some(names) => schema.project(names),
            },
            LogicalPlan::Filter { input, predicate } => {
                let schema = input.schema()?;
                let ty = predicate.resolve_type(&schema)?;
                if ty != rivulet_core::DataType::Boolean {
                    return Err(Error::type_mismatch(ty, rivulet_core::DataType::Boolean));
                }
                Ok(schema)
            }
            LogicalPlan::Project { input, exprs } => {
                let input_schema = input.schema()?;
                let mut fields = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    fields.push(output_field(expr, &input_schema)?);
                }
                Schema::new(fields)
            }
            LogicalPlan::WithColumns { input, exprs } => {
                let mut schema = input.schema()?;
                for expr in exprs {
                    let field = output_field(expr, &schema)?;
                    schema.upsert(field);
                }
                Ok(schema)
            }
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggs,
            } => {
                let input_schema = input.schema()?;
                let mut fields = Vec::with_capacity(group_by.len() + aggs.len());
                for key in group_by {
                    fields.push(output_field(key, &input_schema)?);
                }
                for agg in aggs {
                    let name = agg.output_name()?;
                    let ty = agg.resolve_type(&input_schema)?;
                    fields.push(Field::new(name, ty));
                }
                Schema::new(fields)
            }
            LogicalPlan::Sort { input, keys } => {
                let schema = input.schema()?;
                for key in keys {
                    key.expr.resolve_type(&schema)?;
                }
                Ok(schema)
            }
            LogicalPlan::Limit { input, .. } => input.schema(),
            LogicalPlan::Union { inputs } => {
                let mut iter = inputs.iter();
                let first = iter
                    .next()
                    .ok_or_else(|| Error::internal("union of zero inputs"))?;
                let schema = first.schema()?;
                for input in iter {
                    let other = input.schema()?;
                    if other != schema {
                        return Err(Error::schema_mismatch(
                            "union inputs disagree on schema",
                        ));
                    }
                }
                Ok(schema)
            }
            LogicalPlan::Cache { input, .. } => input.schema(),
        }
    }

    /// Returns the child plans of this node, leaves yielding none.
    pub fn inputs(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::Scan { .. } => Vec::new(),
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Project { input, .. }
            | LogicalPlan::WithColumns { input, .. }
            | LogicalPlan::Aggregate { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. }
            | LogicalPlan::Cache { input, .. } => vec![input],
            LogicalPlan::Union { inputs } => inputs.iter().collect(),
        }
    }

    /// Renders the plan as an indented tree, one node per line.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(&mut out, 0);
        out
    }

    fn explain_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match self {
            LogicalPlan::Scan {
                source,
                projection,
                predicate,
                limit,
                ..
            } => {
                out.push_str(&format!("SCAN {}", source));
                if let Some(names) = projection {
                    out.push_str(&format!(" [projection: {}]", names.join(", ")));
                }
                if let Some(predicate) = predicate {
                    out.push_str(&format!(" [predicate: {}]", predicate));
                }
                if let Some(limit) = limit {
                    out.push_str(&format!(" [limit: {}]", limit));
                }
                out.push('\n');
            }
            LogicalPlan::Filter { input, predicate } => {
                out.push_str(&format!("FILTER {}\n", predicate));
                input.explain_into(out, depth + 1);
            }
            LogicalPlan::Project { input, exprs } => {
                out.push_str(&format!("PROJECT [{}]\n", join_display(exprs)));
                input.explain_into(out, depth + 1);
            }
            LogicalPlan::WithColumns { input, exprs } => {
                out.push_str(&format!("WITH_COLUMNS [{}]\n", join_display(exprs)));
                input.explain_into(out, depth + 1);
            }
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggs,
            } => {
                out.push_str(&format!(
                    "AGGREGATE [{}] BY [{}]\n",
                    join_display(aggs),
                    join_display(group_by)
                ));
                input.explain_into(out, depth + 1);
            }
            LogicalPlan::Sort { input, keys } => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        let dir = match k.order {
                            SortOrder::Asc => "asc",
                            SortOrder::Desc => "desc",
                        };
                        format!("{} {}", k.expr, dir)
                    })
                    .collect();
                out.push_str(&format!("SORT [{}]\n", keys.join(", ")));
                input.explain_into(out, depth + 1);
            }
            LogicalPlan::Limit {
                input,
                offset,
                limit,
            } => {
                if *offset == 0 {
                    out.push_str(&format!("LIMIT {}\n", limit));
                } else {
                    out.push_str(&format!("LIMIT {} OFFSET {}\n", limit, offset));
                }
                input.explain_into(out, depth + 1);
            }
            LogicalPlan::Union { inputs } => {
                out.push_str("UNION\n");
                for input in inputs {
                    input.explain_into(out, depth + 1);
                }
            }
            LogicalPlan::Cache { input, id } => {
                out.push_str(&format!("CACHE #{}\n", id));
                input.explain_into(out, depth + 1);
            }
        }
    }
}

fn join_display<T: core::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves the output field of a projection expression.
pub(crate) fn output_field(expr: &Expr, schema: &Schema) -> Result<Field> {
    let name = expr
        .output_name()
        .ok_or_else(|| Error::internal(format!("expression {} needs an alias", expr)))?;
    let ty = expr.resolve_type(schema)?;
    Ok(Field::new(name, ty))
}

impl core::fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.explain().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit};
    use rivulet_core::DataType;

    fn taxi_schema() -> Schema {
        Schema::new(vec![
            Field::new("pickup_date", DataType::Date),
            Field::new("zone", DataType::Utf8),
            Field::new("fare", DataType::Float64),
            Field::new("passengers", DataType::Int32),
        ])
        .unwrap()
    }

    #[test]
    fn test_scan_schema_with_projection() {
        let plan = LogicalPlan::Scan {
            source: "taxi".into(),
            schema: taxi_schema(),
            projection: Some(vec!["fare".into(), "zone".into()]),
            predicate: None,
            limit: None,
        };
        // Scan projection narrows but keeps declaration order.
        assert_eq!(plan.schema().unwrap().names(), vec!["zone", "fare"]);
    }

    #[test]
    fn test_project_schema_in_request_order() {
        let plan = LogicalPlan::scan("taxi", taxi_schema())
            .project(vec![col("fare"), col("zone")]);
        assert_eq!(plan.schema().unwrap().names(), vec!["fare", "zone"]);
    }

    #[test]
    fn test_with_columns_replaces_in_place() {
        let plan = LogicalPlan::scan("taxi", taxi_schema()).with_columns(vec![
            col("fare").mul(lit(2.0)).alias("fare"),
            col("passengers").cast(DataType::Int64).alias("pax"),
        ]);
        let schema = plan.schema().unwrap();
        assert_eq!(
            schema.names(),
            vec!["pickup_date", "zone", "fare", "passengers", "pax"]
        );
        assert_eq!(schema.data_type("pax").unwrap(), DataType::Int64);
    }

    #[test]
    fn test_aggregate_schema() {
        let plan = LogicalPlan::scan("taxi", taxi_schema()).aggregate(
            vec![col("zone")],
            vec![
                AggExpr::count(),
                AggExpr::sum(col("fare")).alias("total_fare"),
            ],
        );
        let schema = plan.schema().unwrap();
        assert_eq!(schema.names(), vec!["zone", "count", "total_fare"]);
        assert_eq!(schema.data_type("count").unwrap(), DataType::Int64);
        assert_eq!(schema.data_type("total_fare").unwrap(), DataType::Float64);
    }

    #[test]
    fn test_filter_requires_boolean() {
        let plan = LogicalPlan::scan("taxi", taxi_schema()).filter(col("fare"));
        assert!(plan.schema().is_err());
    }

    #[test]
    fn test_unknown_column_fails_resolution() {
        let plan = LogicalPlan::scan("taxi", taxi_schema())
            .filter(col("missing").gt(lit(1i64)));
        assert!(matches!(
            plan.schema(),
            Err(Error::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_union_schema_must_agree() {
        let a = LogicalPlan::scan("a", taxi_schema());
        let b = LogicalPlan::scan("b", taxi_schema()).project(vec![col("fare")]);
        assert!(LogicalPlan::union(vec![a.clone(), a.clone()]).schema().is_ok());
        assert!(LogicalPlan::union(vec![a, b]).schema().is_err());
    }

    #[test]
    fn test_explain_tree() {
        let plan = LogicalPlan::scan("taxi", taxi_schema())
            .filter(col("fare").gt(lit(5.0)))
            .limit(10);
        let text = plan.explain();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "LIMIT 10");
        assert!(lines[1].starts_with("  FILTER"));
        assert!(lines[2].starts_with("    SCAN taxi"));
    }
}
