//! Plan execution.

mod aggregate;
pub mod eval;
mod filter;
mod limit;
mod project;
mod relation;
mod runner;
mod scan;
mod sort;
mod source;

pub use aggregate::AggState;
pub use relation::Relation;
pub use runner::PlanRunner;
pub use source::{DataSource, GroupInfo, InMemorySource, SourceRegistry};
