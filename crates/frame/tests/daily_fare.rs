//! End-to-end: monthly frame files on disk, queried through the lazy API.

use rivulet_core::{DataType, Field, Row, Schema, Value};
use rivulet_frame::{Catalog, LazyFrame};
use rivulet_query::{col, lit, AggExpr, ExecConfig};
use rivulet_source::write_file;
use tempfile::TempDir;

fn trip_schema() -> Schema {
    Schema::new(vec![
        Field::new("pickup_date", DataType::Date),
        Field::new("zone", DataType::Utf8),
        Field::new("fare", DataType::Float64),
        Field::new("tip", DataType::Float64),
    ])
    .unwrap()
}

fn trip(date: i32, zone: &str, fare: Option<f64>, tip: Option<f64>) -> Row {
    Row::new(vec![
        Value::Date(date),
        Value::Utf8(zone.into()),
        fare.map(Value::Float64).unwrap_or(Value::Null),
        tip.map(Value::Float64).unwrap_or(Value::Null),
    ])
}

/// Two months of trips, written as one frame file per month.
fn setup() -> (TempDir, Catalog) {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path().join("2016-01.rvf"),
        trip_schema(),
        vec![
            trip(10, "JFK", Some(10.0), Some(1.0)),
            trip(11, "JFK", Some(20.0), Some(2.0)),
            trip(11, "LGA", None, Some(5.0)),
            trip(12, "EWR", Some(30.0), Some(0.0)),
        ],
        2,
    )
    .unwrap();
    write_file(
        dir.path().join("2016-02.rvf"),
        trip_schema(),
        vec![
            trip(40, "JFK", Some(5.0), Some(0.5)),
            trip(42, "LGA", Some(7.0), Some(1.0)),
            trip(43, "JFK", Some(50.0), Some(5.0)),
        ],
        2,
    )
    .unwrap();

    let mut catalog = Catalog::new();
    catalog.register_dir("trips", dir.path()).unwrap();
    (dir, catalog)
}

fn daily_revenue(catalog: &Catalog) -> LazyFrame {
    catalog
        .scan("trips")
        .unwrap()
        .filter(
            col("pickup_date")
                .is_between(lit(Value::Date(11)), lit(Value::Date(42)))
                .and(col("fare").is_not_null()),
        )
        .with_column(col("fare").add(col("tip")).alias("total"))
        .group_by(vec![col("pickup_date")])
        .agg(vec![
            AggExpr::sum(col("total")).alias("revenue"),
            AggExpr::count(),
        ])
        .sort_desc(col("revenue"))
        .limit(3)
}

#[test]
fn test_daily_revenue_report() {
    let (_dir, catalog) = setup();
    let out = daily_revenue(&catalog).collect(&catalog).unwrap();

    assert_eq!(out.schema().names(), vec!["pickup_date", "revenue", "count"]);
    assert_eq!(
        out.column("pickup_date").unwrap(),
        vec![&Value::Date(12), &Value::Date(11), &Value::Date(42)]
    );
    assert_eq!(
        out.column("revenue").unwrap(),
        vec![
            &Value::Float64(30.0),
            &Value::Float64(22.0),
            &Value::Float64(8.0)
        ]
    );
}

#[test]
fn test_optimized_matches_unoptimized() {
    let (_dir, catalog) = setup();
    let frame = daily_revenue(&catalog);
    let optimized = frame.clone().collect(&catalog).unwrap();
    let raw = frame
        .collect_with(&catalog, ExecConfig::no_optimizations())
        .unwrap();
    assert_eq!(optimized, raw);
}

#[test]
fn test_daily_fare_sum_sorted_by_date() {
    let (_dir, catalog) = setup();
    let out = catalog
        .scan("trips")
        .unwrap()
        .group_by(vec![col("pickup_date")])
        .agg(vec![AggExpr::sum(col("fare")).alias("fare")])
        .sort(col("pickup_date"))
        .collect(&catalog)
        .unwrap();

    // One row per distinct date, ascending; null fares are skipped.
    assert_eq!(
        out.column("pickup_date").unwrap(),
        vec![
            &Value::Date(10),
            &Value::Date(11),
            &Value::Date(12),
            &Value::Date(40),
            &Value::Date(42),
            &Value::Date(43)
        ]
    );
    assert_eq!(
        out.column("fare").unwrap(),
        vec![
            &Value::Float64(10.0),
            &Value::Float64(20.0),
            &Value::Float64(30.0),
            &Value::Float64(5.0),
            &Value::Float64(7.0),
            &Value::Float64(50.0)
        ]
    );
}

#[test]
fn test_count_answered_from_metadata() {
    let (_dir, catalog) = setup();
    let out = catalog
        .scan("trips")
        .unwrap()
        .count()
        .collect(&catalog)
        .unwrap();
    assert_eq!(out.column("count").unwrap(), vec![&Value::Int64(7)]);
}

#[test]
fn test_projection_only_reads_needed_columns() {
    let (_dir, catalog) = setup();
    let out = catalog
        .scan("trips")
        .unwrap()
        .select(vec![col("zone")])
        .collect(&catalog)
        .unwrap();
    assert_eq!(out.width(), 1);
    assert_eq!(out.height(), 7);
}

#[test]
fn test_month_order_follows_file_names() {
    let (_dir, catalog) = setup();
    let out = catalog
        .scan("trips")
        .unwrap()
        .select(vec![col("pickup_date")])
        .limit(1)
        .collect(&catalog)
        .unwrap();
    // The earliest file sorts first, so the first row is from January.
    assert_eq!(out.column("pickup_date").unwrap(), vec![&Value::Date(10)]);
}

#[test]
fn test_concat_of_filtered_views() {
    let (_dir, catalog) = setup();
    let jfk = catalog
        .scan("trips")
        .unwrap()
        .filter(col("zone").eq(lit("JFK")));
    let lga = catalog
        .scan("trips")
        .unwrap()
        .filter(col("zone").eq(lit("LGA")));
    let out = LazyFrame::concat(vec![jfk, lga]).collect(&catalog).unwrap();
    assert_eq!(out.height(), 6);
}
