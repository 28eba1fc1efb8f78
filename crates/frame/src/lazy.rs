//! The lazy frame: a plan that pretends to be a table.

use crate::catalog::Catalog;
use crate::dataframe::DataFrame;
use rivulet_core::{Result, Schema};
use rivulet_query::{
    AggExpr, ExecConfig, Expr, LogicalPlan, Optimizer, PlanRunner, SortKey, SortOrder,
};

/// A deferred query. Every method appends a plan node; no I/O or
/// computation happens until `collect`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LazyFrame {
    plan: LogicalPlan,
}

impl LazyFrame {
    /// Wraps an existing plan.
    pub fn from_plan(plan: LogicalPlan) -> Self {
        Self { plan }
    }

    /// Returns the underlying plan.
    pub fn plan(&self) -> &LogicalPlan {
        &self.plan
    }

    /// Resolves the output schema without running anything.
    pub fn schema(&self) -> Result<Schema> {
        self.plan.schema()
    }

    /// Keeps rows where the predicate is true.
    pub fn filter(self, predicate: Expr) -> Self {
        Self::from_plan(self.plan.filter(predicate))
    }

    /// Replaces the column set with the given expressions.
    pub fn select(self, exprs: Vec<Expr>) -> Self {
        Self::from_plan(self.plan.project(exprs))
    }

    /// Adds or replaces one column.
    pub fn with_column(self, expr: Expr) -> Self {
        self.with_columns(vec![expr])
    }

    /// Adds or replaces columns, keeping the rest.
    pub fn with_columns(self, exprs: Vec<Expr>) -> Self {
        Self::from_plan(self.plan.with_columns(exprs))
    }

    /// Starts a grouped aggregation.
    pub fn group_by(self, keys: Vec<Expr>) -> GroupBy {
        GroupBy { frame: self, keys }
    }

    /// Sorts ascending by one expression.
    pub fn sort(self, expr: Expr) -> Self {
        self.sort_by(vec![SortKey::asc(expr)])
    }

    /// Stable multi-key sort.
    pub fn sort_by(self, keys: Vec<SortKey>) -> Self {
        Self::from_plan(self.plan.sort(keys))
    }

    /// Sorts descending by one expression.
    pub fn sort_desc(self, expr: Expr) -> Self {
        self.sort_by(vec![SortKey {
            expr,
            order: SortOrder::Desc,
        }])
    }

    /// Keeps at most `n` rows.
    pub fn limit(self, n: usize) -> Self {
        Self::from_plan(self.plan.limit(n))
    }

    /// Skips `offset` rows, then keeps at most `len` rows.
    pub fn slice(self, offset: usize, len: usize) -> Self {
        Self::from_plan(self.plan.slice(offset, len))
    }

    /// Counts rows, as a one-row frame with an Int64 `count` column.
    ///
    /// Over a bare scan this is answered from file metadata without
    /// reading row bodies.
    pub fn count(self) -> Self {
        Self::from_plan(self.plan.aggregate(Vec::new(), vec![AggExpr::count()]))
    }

    /// Concatenates frames in order. All frames must share a schema.
    pub fn concat(frames: Vec<LazyFrame>) -> Self {
        Self::from_plan(LogicalPlan::union(
            frames.into_iter().map(|f| f.plan).collect(),
        ))
    }

    /// Renders the plan as written.
    pub fn explain(&self) -> String {
        self.plan.explain()
    }

    /// Renders the plan after optimization.
    pub fn explain_optimized(&self) -> Result<String> {
        Ok(Optimizer::new().optimize(self.plan.clone())?.explain())
    }

    /// Optimizes and runs the plan against the catalog's sources.
    pub fn collect(self, catalog: &Catalog) -> Result<DataFrame> {
        self.collect_with(catalog, ExecConfig::default())
    }

    /// Runs with explicit optimizer toggles.
    pub fn collect_with(self, catalog: &Catalog, config: ExecConfig) -> Result<DataFrame> {
        // Resolve schema errors before any file is touched.
        self.plan.schema()?;
        let optimized = Optimizer::from_config(&config).optimize(self.plan)?;
        log::debug!("executing plan:\n{}", optimized.explain());
        let runner = PlanRunner::new(catalog.registry());
        let relation = runner.run(&optimized)?;
        Ok(DataFrame::from_relation(relation))
    }
}

/// A pending grouped aggregation, completed by `agg`.
pub struct GroupBy {
    frame: LazyFrame,
    keys: Vec<Expr>,
}

impl GroupBy {
    /// Applies aggregates per group.
    pub fn agg(self, aggs: Vec<AggExpr>) -> LazyFrame {
        LazyFrame::from_plan(self.frame.plan.aggregate(self.keys, aggs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivulet_core::{DataType, Field, Row, Value};
    use rivulet_query::{col, lit};

    fn catalog() -> Catalog {
        let schema = Schema::new(vec![
            Field::new("zone", DataType::Utf8),
            Field::new("fare", DataType::Float64),
        ])
        .unwrap();
        let rows = vec![
            Row::new(vec![Value::Utf8("a".into()), Value::Float64(10.0)]),
            Row::new(vec![Value::Utf8("b".into()), Value::Float64(30.0)]),
            Row::new(vec![Value::Utf8("a".into()), Value::Float64(20.0)]),
        ];
        let mut catalog = Catalog::new();
        catalog.register_rows("taxi", schema, rows).unwrap();
        catalog
    }

    #[test]
    fn test_building_is_pure() {
        let catalog = catalog();
        let frame = catalog
            .scan("taxi")
            .unwrap()
            .filter(col("fare").gt(lit(15.0)));
        // Nothing has run; the frame is just a plan.
        assert!(frame.explain().contains("FILTER"));
        assert_eq!(frame.schema().unwrap().names(), vec!["zone", "fare"]);
    }

    #[test]
    fn test_collect_runs_the_plan() {
        let catalog = catalog();
        let out = catalog
            .scan("taxi")
            .unwrap()
            .filter(col("fare").gt(lit(15.0)))
            .select(vec![col("zone")])
            .collect(&catalog)
            .unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.schema().names(), vec!["zone"]);
    }

    #[test]
    fn test_group_by_agg() {
        let catalog = catalog();
        let out = catalog
            .scan("taxi")
            .unwrap()
            .group_by(vec![col("zone")])
            .agg(vec![AggExpr::sum(col("fare")).alias("total")])
            .sort(col("zone"))
            .collect(&catalog)
            .unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(
            out.column("total").unwrap(),
            vec![&Value::Float64(30.0), &Value::Float64(30.0)]
        );
    }

    #[test]
    fn test_concat() {
        let catalog = catalog();
        let a = catalog.scan("taxi").unwrap();
        let b = catalog.scan("taxi").unwrap();
        let out = LazyFrame::concat(vec![a, b]).collect(&catalog).unwrap();
        assert_eq!(out.height(), 6);
    }

    #[test]
    fn test_count() {
        let catalog = catalog();
        let out = catalog.scan("taxi").unwrap().count().collect(&catalog).unwrap();
        assert_eq!(out.column("count").unwrap(), vec![&Value::Int64(3)]);
    }

    #[test]
    fn test_schema_error_before_io() {
        let catalog = catalog();
        let result = catalog
            .scan("taxi")
            .unwrap()
            .filter(col("missing").gt(lit(1i64)))
            .collect(&catalog);
        assert!(result.is_err());
    }

    #[test]
    fn test_explain_optimized_shows_pushdown() {
        let catalog = catalog();
        let frame = catalog
            .scan("taxi")
            .unwrap()
            .filter(col("fare").gt(lit(15.0)))
            .select(vec![col("zone")]);
        let text = frame.explain_optimized().unwrap();
        assert!(text.contains("predicate:"));
        assert!(text.contains("projection:"));
    }
}
