//! Logical plan construction.

mod logical;

pub use logical::{LogicalPlan, SortKey};
pub(crate) use logical::output_field;
