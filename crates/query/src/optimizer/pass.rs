//! Optimizer pass trait.

use crate::planner::LogicalPlan;
use rivulet_core::Result;

/// An optimization pass that rewrites a logical plan.
///
/// Passes must preserve plan semantics: the rewritten plan produces the
/// same rows as the input plan. Passes are also idempotent, so running a
/// pass on its own output is a no-op.
pub trait OptimizerPass {
    /// Rewrites the given logical plan.
    ///
    /// Returns an error only for plans that cannot execute at all, such
    /// as operand types with no common supertype.
    fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan>;

    /// Returns the name of this pass.
    fn name(&self) -> &'static str;
}
