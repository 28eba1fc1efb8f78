//! Execution configuration.

/// Per-pass optimizer toggles handed to the terminal collect call.
///
/// Every pass defaults to on. Toggles exist so a caller can compare
/// optimized and unoptimized results, or bisect a rewrite, without
/// touching the plan itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecConfig {
    /// Move filters into scan predicate slots.
    pub predicate_pushdown: bool,
    /// Narrow scans to the columns the plan reads.
    pub projection_pushdown: bool,
    /// Bound scans by downstream limits.
    pub slice_pushdown: bool,
    /// Deduplicate repeated subtrees behind cache nodes.
    pub common_subplan_elimination: bool,
    /// Fold constants and drop vacuous filters.
    pub simplify_expressions: bool,
    /// Insert casts where operand types disagree.
    pub type_coercion: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            predicate_pushdown: true,
            projection_pushdown: true,
            slice_pushdown: true,
            common_subplan_elimination: true,
            simplify_expressions: true,
            type_coercion: true,
        }
    }
}

impl ExecConfig {
    /// Every pass disabled. The plan runs exactly as written.
    pub fn no_optimizations() -> Self {
        Self {
            predicate_pushdown: false,
            projection_pushdown: false,
            slice_pushdown: false,
            common_subplan_elimination: false,
            simplify_expressions: false,
            type_coercion: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_all_on() {
        let config = ExecConfig::default();
        assert!(config.predicate_pushdown);
        assert!(config.common_subplan_elimination);
    }

    #[test]
    fn test_no_optimizations_all_off() {
        let config = ExecConfig::no_optimizations();
        assert!(!config.predicate_pushdown);
        assert!(!config.type_coercion);
    }
}
