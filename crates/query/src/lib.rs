//! Rivulet Query - lazy query engine for Rivulet dataframes.
//!
//! This crate provides the query half of the engine:
//!
//! - `ast`: expression AST and builders (`col`, `lit`, aggregates)
//! - `planner`: the logical plan tree built by the frame API
//! - `optimizer`: plan rewriting passes (pushdowns, subplan elimination,
//!   expression simplification, type coercion)
//! - `executor`: the plan runner, per-operator executors, and the
//!   `DataSource` seam scans read through
//! - `config`: per-pass toggles passed to the terminal collect call

pub mod ast;
pub mod config;
pub mod executor;
pub mod optimizer;
pub mod planner;

pub use ast::{col, lit, AggExpr, AggFunc, BinaryOp, Expr, SortOrder, UnaryOp};
pub use config::ExecConfig;
pub use executor::{DataSource, InMemorySource, PlanRunner, Relation, SourceRegistry};
pub use optimizer::Optimizer;
pub use planner::{LogicalPlan, SortKey};
