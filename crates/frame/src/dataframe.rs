//! Materialized query results.

use rivulet_core::{Error, Result, Row, Schema, Value};
use rivulet_query::Relation;

/// An in-memory table: the output of `collect`.
#[derive(Clone, Debug, PartialEq)]
pub struct DataFrame {
    relation: Relation,
}

impl DataFrame {
    /// Wraps an executor relation.
    pub fn from_relation(relation: Relation) -> Self {
        Self { relation }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Schema {
        self.relation.schema()
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Row] {
        self.relation.rows()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.relation.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.relation.schema().len()
    }

    /// Returns true if the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.relation.is_empty()
    }

    /// Returns one column's values top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let index = self
            .relation
            .schema()
            .index_of(name)
            .ok_or_else(|| Error::column_not_found(name))?;
        Ok(self
            .relation
            .rows()
            .iter()
            .map(|row| row.get(index).unwrap_or(&Value::Null))
            .collect())
    }
}

impl core::fmt::Display for DataFrame {
    /// Renders an aligned text table with a header row.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let names = self.schema().names();
        let mut widths: Vec<usize> = names.iter().map(|n| n.len()).collect();
        let cells: Vec<Vec<String>> = self
            .rows()
            .iter()
            .map(|row| {
                row.values()
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let text = v.to_string();
                        if let Some(w) = widths.get_mut(i) {
                            *w = (*w).max(text.len());
                        }
                        text
                    })
                    .collect()
            })
            .collect();

        let write_line = |f: &mut core::fmt::Formatter<'_>,
                          cells: &[String]|
         -> core::fmt::Result {
            write!(f, "|")?;
            for (i, cell) in cells.iter().enumerate() {
                write!(f, " {:<width$} |", cell, width = widths[i])?;
            }
            writeln!(f)
        };

        write_line(f, &names.iter().map(String::from).collect::<Vec<_>>())?;
        write!(f, "|")?;
        for width in &widths {
            write!(f, "{:-<width$}|", "", width = width + 2)?;
        }
        writeln!(f)?;
        for row in &cells {
            write_line(f, row)?;
        }
        write!(f, "({} rows)", self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivulet_core::{DataType, Field};

    fn frame() -> DataFrame {
        let schema = Schema::new(vec![
            Field::new("zone", DataType::Utf8),
            Field::new("fare", DataType::Float64),
        ])
        .unwrap();
        let rows = vec![
            Row::new(vec![Value::Utf8("JFK".into()), Value::Float64(10.5)]),
            Row::new(vec![Value::Null, Value::Float64(2.0)]),
        ];
        DataFrame::from_relation(Relation::new(schema, rows))
    }

    #[test]
    fn test_shape() {
        let df = frame();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_column_access() {
        let df = frame();
        let fares = df.column("fare").unwrap();
        assert_eq!(fares, vec![&Value::Float64(10.5), &Value::Float64(2.0)]);
        assert!(df.column("missing").is_err());
    }

    #[test]
    fn test_display_has_header_and_rows() {
        let text = frame().to_string();
        assert!(text.contains("zone"));
        assert!(text.contains("JFK"));
        assert!(text.ends_with("(2 rows)"));
    }
}
