//! Query optimizer module.

mod common_subplan;
mod pass;
mod predicate_pushdown;
mod projection_pushdown;
mod simplify;
mod slice_pushdown;
mod type_coercion;

pub use common_subplan::CommonSubplanElimination;
pub use pass::OptimizerPass;
pub use predicate_pushdown::PredicatePushdown;
pub use projection_pushdown::ProjectionPushdown;
pub use simplify::SimplifyExpressions;
pub use slice_pushdown::SlicePushdown;
pub use type_coercion::TypeCoercion;

use crate::config::ExecConfig;
use crate::planner::LogicalPlan;
use rivulet_core::Result;

/// Query optimizer that applies optimization passes in a fixed order.
pub struct Optimizer {
    passes: Vec<Box<dyn OptimizerPass>>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Creates a new optimizer with the default passes.
    ///
    /// The default passes run in this order:
    /// 1. PredicatePushdown - move filters toward scans
    /// 2. ProjectionPushdown - narrow scans to the columns the plan reads
    /// 3. SlicePushdown - bound scans by downstream limits
    /// 4. CommonSubplanElimination - share repeated subtrees
    /// 5. SimplifyExpressions - constant folding, to a fixed point
    /// 6. TypeCoercion - insert casts for mixed-type operations
    pub fn new() -> Self {
        Self::from_config(&ExecConfig::default())
    }

    /// Creates an optimizer with the passes the config enables.
    pub fn from_config(config: &ExecConfig) -> Self {
        let mut passes: Vec<Box<dyn OptimizerPass>> = Vec::new();
        if config.predicate_pushdown {
            passes.push(Box::new(PredicatePushdown));
        }
        if config.projection_pushdown {
            passes.push(Box::new(ProjectionPushdown));
        }
        if config.slice_pushdown {
            passes.push(Box::new(SlicePushdown));
        }
        if config.common_subplan_elimination {
            passes.push(Box::new(CommonSubplanElimination));
        }
        if config.simplify_expressions {
            passes.push(Box::new(SimplifyExpressions));
        }
        if config.type_coercion {
            passes.push(Box::new(TypeCoercion));
        }
        Self { passes }
    }

    /// Creates an optimizer with custom passes.
    pub fn with_passes(passes: Vec<Box<dyn OptimizerPass>>) -> Self {
        Self { passes }
    }

    /// Optimizes a logical plan.
    pub fn optimize(&self, mut plan: LogicalPlan) -> Result<LogicalPlan> {
        for pass in &self.passes {
            plan = pass.optimize(plan)?;
            log::trace!("after {}:\n{}", pass.name(), plan.explain());
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit};
    use rivulet_core::{DataType, Field, Schema};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("a", DataType::Int64),
            Field::new("b", DataType::Float64),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_pass_count() {
        let optimizer = Optimizer::new();
        assert_eq!(optimizer.passes.len(), 6);
    }

    #[test]
    fn test_config_disables_passes() {
        let optimizer = Optimizer::from_config(&ExecConfig::no_optimizations());
        assert!(optimizer.passes.is_empty());
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let optimizer = Optimizer::new();
        let plan = LogicalPlan::scan("t", schema())
            .filter(col("a").gt(lit(10i64)))
            .project(vec![col("b")])
            .limit(5);
        let once = optimizer.optimize(plan).unwrap();
        let twice = optimizer.optimize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
