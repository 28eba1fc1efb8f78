//! Aggregation execution.
//!
//! Groups are hashed on their key values and accumulated in one pass.
//! Accumulator state merges associatively and commutatively, so states
//! built over separate partitions can be combined in any order and still
//! match a single-pass run.
//!
//! Null handling: every aggregate skips null inputs. A group with no
//! non-null input yields null for sum, min, max and mean; `count()` with
//! no input counts rows, `count(expr)` counts non-null values.

use crate::ast::{AggExpr, AggFunc, Expr};
use crate::executor::eval::eval_expr;
use crate::executor::relation::Relation;
use crate::planner::output_field;
use hashbrown::HashMap;
use rivulet_core::{DataType, Error, Field, Result, Row, Schema, Value};

/// Accumulator for one aggregate over one group.
#[derive(Clone, Debug)]
pub enum AggState {
    /// Row or non-null value count.
    Count(i64),
    /// Integer sum; null until the first non-null input.
    SumInt(Option<i64>),
    /// Float sum; null until the first non-null input.
    SumFloat(Option<f64>),
    /// Running minimum.
    Min(Option<Value>),
    /// Running maximum.
    Max(Option<Value>),
    /// Running mean as sum and non-null count.
    Mean { sum: f64, count: i64 },
}

impl AggState {
    /// Creates the starting state for an aggregate over the given input
    /// type (`None` for count-rows).
    pub fn new(func: AggFunc, input_type: Option<DataType>) -> AggState {
        match func {
            AggFunc::Count => AggState::Count(0),
            AggFunc::Sum => match input_type {
                Some(DataType::Float64) => AggState::SumFloat(None),
                _ => AggState::SumInt(None),
            },
            AggFunc::Min => AggState::Min(None),
            AggFunc::Max => AggState::Max(None),
            AggFunc::Mean => AggState::Mean { sum: 0.0, count: 0 },
        }
    }

    /// Folds one input into the state. `None` marks a plain row for
    /// count-rows; a null value is skipped by every other aggregate.
    pub fn update(&mut self, value: Option<&Value>) -> Result<()> {
        match self {
            AggState::Count(count) => {
                let counted = match value {
                    None => true,
                    Some(v) => !v.is_null(),
                };
                if counted {
                    *count += 1;
                }
            }
            AggState::SumInt(acc) => {
                if let Some(v) = int_input(value)? {
                    *acc = Some(match acc {
                        None => v,
                        Some(sum) => sum
                            .checked_add(v)
                            .ok_or_else(|| Error::internal("i64 overflow in sum"))?,
                    });
                }
            }
            AggState::SumFloat(acc) => {
                if let Some(v) = float_input(value) {
                    *acc = Some(acc.unwrap_or(0.0) + v);
                }
            }
            AggState::Min(acc) => {
                if let Some(v) = value.filter(|v| !v.is_null()) {
                    match acc {
                        Some(min) if *min <= *v => {}
                        _ => *acc = Some(v.clone()),
                    }
                }
            }
            AggState::Max(acc) => {
                if let Some(v) = value.filter(|v| !v.is_null()) {
                    match acc {
                        Some(max) if *max >= *v => {}
                        _ => *acc = Some(v.clone()),
                    }
                }
            }
            AggState::Mean { sum, count } => {
                if let Some(v) = float_input(value) {
                    *sum += v;
                    *count += 1;
                }
            }
        }
        Ok(())
    }

    /// Combines two states built over disjoint row sets.
    pub fn merge(&mut self, other: AggState) -> Result<()> {
        match (self, other) {
            (AggState::Count(a), AggState::Count(b)) => *a += b,
            (AggState::SumInt(a), AggState::SumInt(b)) => {
                *a = match (*a, b) {
                    (None, b) => b,
                    (a, None) => a,
                    (Some(x), Some(y)) => Some(
                        x.checked_add(y)
                            .ok_or_else(|| Error::internal("i64 overflow in sum"))?,
                    ),
                };
            }
            (AggState::SumFloat(a), AggState::SumFloat(b)) => {
                *a = match (*a, b) {
                    (None, b) => b,
                    (a, None) => a,
                    (Some(x), Some(y)) => Some(x + y),
                };
            }
            (AggState::Min(a), AggState::Min(b)) => {
                if let Some(v) = b {
                    match a {
                        Some(min) if *min <= v => {}
                        _ => *a = Some(v),
                    }
                }
            }
            (AggState::Max(a), AggState::Max(b)) => {
                if let Some(v) = b {
                    match a {
                        Some(max) if *max >= v => {}
                        _ => *a = Some(v),
                    }
                }
            }
            (
                AggState::Mean { sum, count },
                AggState::Mean {
                    sum: other_sum,
                    count: other_count,
                },
            ) => {
                *sum += other_sum;
                *count += other_count;
            }
            _ => return Err(Error::internal("mismatched aggregate states")),
        }
        Ok(())
    }

    /// Produces the final value.
    pub fn finish(self) -> Value {
        match self {
            AggState::Count(count) => Value::Int64(count),
            AggState::SumInt(acc) => acc.map(Value::Int64).unwrap_or(Value::Null),
            AggState::SumFloat(acc) => acc.map(Value::Float64).unwrap_or(Value::Null),
            AggState::Min(acc) | AggState::Max(acc) => acc.unwrap_or(Value::Null),
            AggState::Mean { sum, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    Value::Float64(sum / count as f64)
                }
            }
        }
    }
}

fn int_input(value: Option<&Value>) -> Result<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int32(v)) => Ok(Some(*v as i64)),
        Some(Value::Int64(v)) => Ok(Some(*v)),
        Some(other) => Err(Error::type_mismatch(
            other.data_type().unwrap_or(DataType::Int64),
            DataType::Int64,
        )),
    }
}

fn float_input(value: Option<&Value>) -> Option<f64> {
    value.and_then(|v| v.to_f64())
}

/// Groups rows by key expressions and accumulates the aggregates.
///
/// Output groups appear in first-seen input order. Without group keys a
/// single group is produced, even over an empty input.
pub fn execute_aggregate(
    input: Relation,
    group_by: &[Expr],
    aggs: &[AggExpr],
) -> Result<Relation> {
    let (input_schema, input_rows) = input.into_parts();

    let mut fields = Vec::with_capacity(group_by.len() + aggs.len());
    for key in group_by {
        fields.push(output_field(key, &input_schema)?);
    }
    let mut agg_types = Vec::with_capacity(aggs.len());
    for agg in aggs {
        let name = agg.output_name()?;
        let ty = agg.resolve_type(&input_schema)?;
        let input_type = match &agg.input {
            None => None,
            Some(expr) => Some(expr.resolve_type(&input_schema)?),
        };
        fields.push(Field::new(name, ty));
        agg_types.push(input_type);
    }
    let schema = Schema::new(fields)?;

    let new_states = || -> Vec<AggState> {
        aggs.iter()
            .zip(&agg_types)
            .map(|(agg, input_type)| AggState::new(agg.func, *input_type))
            .collect()
    };

    // Insertion-ordered grouping: the map tracks positions into `groups`.
    let mut positions: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, Vec<AggState>)> = Vec::new();
    if group_by.is_empty() {
        positions.insert(Vec::new(), 0);
        groups.push((Vec::new(), new_states()));
    }

    for row in &input_rows {
        let key = group_by
            .iter()
            .map(|k| eval_expr(k, &input_schema, row))
            .collect::<Result<Vec<_>>>()?;
        let position = match positions.get(&key) {
            Some(p) => *p,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, new_states()));
                groups.len() - 1
            }
        };
        let states = &mut groups[position].1;
        for (state, agg) in states.iter_mut().zip(aggs) {
            let value = match &agg.input {
                None => None,
                Some(expr) => Some(eval_expr(expr, &input_schema, row)?),
            };
            state.update(value.as_ref())?;
        }
    }

    let rows = groups
        .into_iter()
        .map(|(mut key, states)| {
            key.extend(states.into_iter().map(AggState::finish));
            Row::new(key)
        })
        .collect();
    Ok(Relation::new(schema, rows))
}
