//! Optimizer and executor benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rivulet_core::{DataType, Field, Row, Schema, Value};
use rivulet_query::{
    col, lit, AggExpr, InMemorySource, LogicalPlan, Optimizer, PlanRunner, SortKey,
    SourceRegistry,
};

fn taxi_schema() -> Schema {
    Schema::new(vec![
        Field::new("day", DataType::Int64),
        Field::new("zone", DataType::Utf8),
        Field::new("passengers", DataType::Int32),
        Field::new("fare", DataType::Float64),
    ])
    .unwrap()
}

fn taxi_rows(n: usize) -> Vec<Row> {
    let zones = ["JFK", "LGA", "EWR", "MID"];
    (0..n)
        .map(|i| {
            Row::new(vec![
                Value::Int64((i / 100) as i64),
                Value::Utf8(zones[i % zones.len()].to_string()),
                Value::Int32((i % 5) as i32 + 1),
                Value::Float64((i % 97) as f64 + 2.5),
            ])
        })
        .collect()
}

fn daily_report_plan() -> LogicalPlan {
    LogicalPlan::scan("taxi", taxi_schema())
        .filter(col("fare").gt(lit(10.0)).and(col("passengers").ge(lit(2i64))))
        .aggregate(
            vec![col("day")],
            vec![
                AggExpr::count(),
                AggExpr::sum(col("fare")).alias("total_fare"),
                AggExpr::mean(col("fare")).alias("avg_fare"),
            ],
        )
        .sort(vec![SortKey::desc(col("total_fare"))])
        .limit(10)
}

fn bench_optimize(c: &mut Criterion) {
    let optimizer = Optimizer::new();
    let plan = daily_report_plan();
    c.bench_function("optimize_daily_report", |b| {
        b.iter(|| optimizer.optimize(black_box(plan.clone())).unwrap())
    });
}

fn bench_execute(c: &mut Criterion) {
    let mut registry = SourceRegistry::new();
    let groups: Vec<Vec<Row>> = taxi_rows(10_000)
        .chunks(1_000)
        .map(|chunk| chunk.to_vec())
        .collect();
    registry.register(
        "taxi",
        Box::new(InMemorySource::with_groups(taxi_schema(), groups)),
    );
    let runner = PlanRunner::new(&registry);
    let optimizer = Optimizer::new();

    let raw = daily_report_plan();
    let optimized = optimizer.optimize(raw.clone()).unwrap();

    c.bench_function("execute_unoptimized", |b| {
        b.iter(|| runner.run(black_box(&raw)).unwrap())
    });
    c.bench_function("execute_optimized", |b| {
        b.iter(|| runner.run(black_box(&optimized)).unwrap())
    });
}

criterion_group!(benches, bench_optimize, bench_execute);
criterion_main!(benches);
