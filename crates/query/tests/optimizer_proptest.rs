//! Property tests for optimizer correctness.
//!
//! The core contract: for any plan, the optimized plan produces exactly
//! the same relation as the plan run as written. Optimization may only
//! change the access pattern.

use proptest::prelude::*;
use rivulet_core::{DataType, Field, Row, Schema, Value};
use rivulet_query::{
    col, lit, AggExpr, ExecConfig, InMemorySource, LogicalPlan, Optimizer, PlanRunner,
    SortKey, SourceRegistry,
};

fn taxi_schema() -> Schema {
    Schema::new(vec![
        Field::new("zone", DataType::Utf8),
        Field::new("passengers", DataType::Int32),
        Field::new("fare", DataType::Float64),
    ])
    .unwrap()
}

fn zone_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => prop::sample::select(vec!["JFK", "LGA", "EWR", "MID"])
            .prop_map(|z| Value::Utf8(z.to_string())),
        1 => Just(Value::Null),
    ]
}

fn fare_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => (0.0f64..100.0).prop_map(Value::Float64),
        1 => Just(Value::Null),
    ]
}

fn row() -> impl Strategy<Value = Row> {
    (zone_value(), 1i32..7, fare_value())
        .prop_map(|(zone, passengers, fare)| {
            Row::new(vec![zone, Value::Int32(passengers), fare])
        })
}

fn rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(row(), 0..60)
}

/// A plan over the `taxi` source, drawn from the shapes the optimizer
/// rewrites: filters that push into scans, projections that narrow them,
/// limits that bound them, repeated subtrees that get shared, constant
/// subexpressions that fold, and mixed-type comparisons that get casts.
fn plan() -> impl Strategy<Value = LogicalPlan> {
    let scan = || LogicalPlan::scan("taxi", taxi_schema());
    prop_oneof![
        (0.0f64..100.0).prop_map(move |t| {
            LogicalPlan::scan("taxi", taxi_schema())
                .filter(col("fare").gt(lit(t)))
                .project(vec![col("zone"), col("fare")])
        }),
        (0.0f64..100.0, 0usize..20).prop_map(move |(t, n)| {
            LogicalPlan::scan("taxi", taxi_schema())
                .project(vec![col("fare")])
                .filter(col("fare").le(lit(t)))
                .limit(n)
        }),
        (1i64..7).prop_map(move |p| {
            // Int32 column against an Int64 literal exercises coercion.
            LogicalPlan::scan("taxi", taxi_schema())
                .filter(col("passengers").ge(lit(p)))
                .aggregate(
                    vec![col("zone")],
                    vec![AggExpr::count(), AggExpr::sum(col("fare")).alias("total")],
                )
        }),
        (0.0f64..100.0).prop_map(move |t| {
            // Constant subexpression folds; the filter may disappear.
            LogicalPlan::scan("taxi", taxi_schema())
                .filter(col("fare").gt(lit(t)).or(lit(1i64).lt(lit(2i64))))
                .project(vec![col("zone")])
        }),
        (0.0f64..100.0, 1usize..10).prop_map(move |(t, n)| {
            let shared = LogicalPlan::scan("taxi", taxi_schema())
                .filter(col("fare").gt(lit(t)));
            LogicalPlan::union(vec![shared.clone(), shared]).limit(n)
        }),
        Just(
            scan()
                .with_columns(vec![col("fare").mul(lit(2.0)).alias("double_fare")])
                .sort(vec![SortKey::asc(col("zone")), SortKey::desc(col("fare"))])
        ),
        Just(scan().aggregate(Vec::new(), vec![AggExpr::count()])),
    ]
}

fn run_both(plan: &LogicalPlan, rows: Vec<Row>) {
    let mut registry = SourceRegistry::new();
    registry.register("taxi", Box::new(InMemorySource::new(taxi_schema(), rows)));
    let runner = PlanRunner::new(&registry);

    let raw = runner.run(plan).expect("unoptimized run");
    let optimized_plan = Optimizer::new().optimize(plan.clone()).expect("optimize");
    let optimized = runner.run(&optimized_plan).expect("optimized run");

    assert_eq!(raw, optimized, "optimizer changed the result");
}

proptest! {
    #[test]
    fn optimized_plan_matches_unoptimized(plan in plan(), rows in rows()) {
        run_both(&plan, rows);
    }

    #[test]
    fn optimizer_is_idempotent(plan in plan()) {
        let optimizer = Optimizer::new();
        let once = optimizer.optimize(plan).unwrap();
        let twice = optimizer.optimize(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn each_pass_alone_preserves_results(plan in plan(), rows in rows()) {
        let configs = [
            ExecConfig { predicate_pushdown: true, ..ExecConfig::no_optimizations() },
            ExecConfig { projection_pushdown: true, ..ExecConfig::no_optimizations() },
            ExecConfig { slice_pushdown: true, ..ExecConfig::no_optimizations() },
            ExecConfig { common_subplan_elimination: true, ..ExecConfig::no_optimizations() },
            ExecConfig { simplify_expressions: true, ..ExecConfig::no_optimizations() },
            ExecConfig { type_coercion: true, ..ExecConfig::no_optimizations() },
        ];
        let mut registry = SourceRegistry::new();
        registry.register("taxi", Box::new(InMemorySource::new(taxi_schema(), rows)));
        let runner = PlanRunner::new(&registry);
        let raw = runner.run(&plan).expect("unoptimized run");
        for config in configs {
            let rewritten = Optimizer::from_config(&config)
                .optimize(plan.clone())
                .expect("optimize");
            let out = runner.run(&rewritten).expect("optimized run");
            prop_assert_eq!(&raw, &out);
        }
    }
}
