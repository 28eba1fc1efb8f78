//! Row structure for the Rivulet engine.

use crate::value::Value;

/// A positional row of values.
///
/// Rows carry no identity of their own; their meaning comes from the
/// `Schema` of the relation they belong to.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from the given values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at the given column position.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the number of columns in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the row and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Returns a new row keeping only the given column positions, in order.
    pub fn project(&self, indices: &[usize]) -> Row {
        Row::new(
            indices
                .iter()
                .map(|&i| self.values.get(i).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access() {
        let row = Row::new(vec![Value::Int64(1), Value::Utf8("a".into())]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&Value::Int64(1)));
        assert_eq!(row.get(2), None);
    }

    #[test]
    fn test_row_project() {
        let row = Row::new(vec![
            Value::Int64(1),
            Value::Utf8("a".into()),
            Value::Float64(2.5),
        ]);
        let projected = row.project(&[2, 0]);
        assert_eq!(
            projected.values(),
            &[Value::Float64(2.5), Value::Int64(1)]
        );
    }
}
