//! Plan execution.
//!
//! Walks the plan bottom-up, materializing one relation per node. Cached
//! subtrees are computed once per run and reused by id. The output of an
//! optimized plan equals the output of the plan as written; optimizer
//! passes only change the access pattern.

use crate::ast::AggFunc;
use crate::executor::aggregate::execute_aggregate;
use crate::executor::filter::execute_filter;
use crate::executor::limit::execute_limit;
use crate::executor::project::{execute_project, execute_with_columns};
use crate::executor::relation::Relation;
use crate::executor::scan::execute_scan;
use crate::executor::sort::execute_sort;
use crate::executor::source::SourceRegistry;
use crate::planner::LogicalPlan;
use core::cell::RefCell;
use hashbrown::HashMap;
use rivulet_core::{Error, Field, Result, Row, Schema, Value};

/// Executes logical plans against registered sources.
pub struct PlanRunner<'a> {
    registry: &'a SourceRegistry,
    cache: RefCell<HashMap<u64, Relation>>,
}

impl<'a> PlanRunner<'a> {
    /// Creates a runner over the given sources.
    pub fn new(registry: &'a SourceRegistry) -> Self {
        Self {
            registry,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Runs a plan to a materialized relation.
    pub fn run(&self, plan: &LogicalPlan) -> Result<Relation> {
        // Cache ids are only unique within one optimized plan.
        self.cache.borrow_mut().clear();
        self.run_node(plan)
    }

    fn run_node(&self, plan: &LogicalPlan) -> Result<Relation> {
        if let Some(counted) = self.metadata_count(plan)? {
            return Ok(counted);
        }
        match plan {
            LogicalPlan::Scan {
                source,
                projection,
                predicate,
                limit,
                ..
            } => {
                let source = self.registry.get(source)?;
                execute_scan(
                    source,
                    projection.as_deref(),
                    predicate.as_ref(),
                    *limit,
                )
            }
            LogicalPlan::Filter { input, predicate } => {
                execute_filter(self.run_node(input)?, predicate)
            }
            LogicalPlan::Project { input, exprs } => {
                execute_project(self.run_node(input)?, exprs)
            }
            LogicalPlan::WithColumns { input, exprs } => {
                execute_with_columns(self.run_node(input)?, exprs)
            }
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggs,
            } => execute_aggregate(self.run_node(input)?, group_by, aggs),
            LogicalPlan::Sort { input, keys } => execute_sort(self.run_node(input)?, keys),
            LogicalPlan::Limit {
                input,
                offset,
                limit,
            } => Ok(execute_limit(self.run_node(input)?, *offset, *limit)),
            LogicalPlan::Union { inputs } => self.run_union(inputs),
            LogicalPlan::Cache { input, id } => {
                if let Some(hit) = self.cache.borrow().get(id) {
                    log::debug!("cache hit for subplan #{}", id);
                    return Ok(hit.clone());
                }
                let relation = self.run_node(input)?;
                self.cache.borrow_mut().insert(*id, relation.clone());
                Ok(relation)
            }
        }
    }

    fn run_union(&self, inputs: &[LogicalPlan]) -> Result<Relation> {
        let mut iter = inputs.iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::internal("union of zero inputs"))?;
        let (schema, mut rows) = self.run_node(first)?.into_parts();
        for input in iter {
            let (other_schema, other_rows) = self.run_node(input)?.into_parts();
            if other_schema != schema {
                return Err(Error::schema_mismatch(
                    "union inputs disagree on schema",
                ));
            }
            rows.extend(other_rows);
        }
        Ok(Relation::new(schema, rows))
    }

    /// Answers a bare count over an unfiltered, unsliced scan from
    /// source metadata, without reading any row bodies.
    fn metadata_count(&self, plan: &LogicalPlan) -> Result<Option<Relation>> {
        let (name, source_name) = match plan {
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggs,
            } if group_by.is_empty() && aggs.len() == 1 => {
                let agg = &aggs[0];
                let countable = agg.func == AggFunc::Count && agg.input.is_none();
                match input.as_ref() {
                    LogicalPlan::Scan {
                        source,
                        predicate: None,
                        limit: None,
                        ..
                    } if countable => (agg.output_name()?, source),
                    _ => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        let source = self.registry.get(source_name)?;
        let total = source.row_count()?;
        log::debug!("answered count over {} from metadata", source_name);
        let schema = Schema::new(vec![Field::new(name, rivulet_core::DataType::Int64)])?;
        let rows = vec![Row::new(vec![Value::Int64(total as i64)])];
        Ok(Some(Relation::new(schema, rows)))
    }
}
