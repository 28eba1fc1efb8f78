//! Schema definitions for the Rivulet engine.
//!
//! A `Schema` is an ordered mapping from column name to semantic type.
//! Column order is significant: projection preserves declaration order and
//! output rows are positional.

use crate::error::{Error, Result};
use crate::types::DataType;

/// A named, typed column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    data_type: DataType,
}

impl Field {
    /// Creates a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Returns the field name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// An ordered collection of fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a schema from fields, rejecting duplicate column names.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(Error::duplicate_column(field.name()));
            }
        }
        Ok(Self { fields })
    }

    /// Creates an empty schema.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Returns the fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the position of the named column, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Returns the named field, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns the field at the given position, if present.
    pub fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Returns the data type of the named column, or a schema error.
    pub fn data_type(&self, name: &str) -> Result<DataType> {
        self.field(name)
            .map(|f| f.data_type())
            .ok_or_else(|| Error::column_not_found(name))
    }

    /// Returns true if the named column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns a narrowed schema keeping only the named columns, in this
    /// schema's declaration order. Unknown names are a schema error.
    pub fn project(&self, names: &[String]) -> Result<Schema> {
        for name in names {
            if !self.contains(name) {
                return Err(Error::column_not_found(name));
            }
        }
        let fields = self
            .fields
            .iter()
            .filter(|f| names.iter().any(|n| n == f.name()))
            .cloned()
            .collect();
        Ok(Schema { fields })
    }

    /// Returns the positions of the named columns, in this schema's
    /// declaration order.
    pub fn projection_indices(&self, names: &[String]) -> Result<Vec<usize>> {
        for name in names {
            if !self.contains(name) {
                return Err(Error::column_not_found(name));
            }
        }
        Ok(self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| names.iter().any(|n| n == f.name()))
            .map(|(i, _)| i)
            .collect())
    }

    /// Appends a field, replacing an existing field with the same name in
    /// place (the `with_columns` contract).
    pub fn upsert(&mut self, field: Field) {
        match self.index_of(field.name()) {
            Some(i) => self.fields[i] = field,
            None => self.fields.push(field),
        }
    }

    /// Returns the column names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new(vec![
            Field::new("a", DataType::Int64),
            Field::new("b", DataType::Utf8),
            Field::new("c", DataType::Float64),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Schema::new(vec![
            Field::new("a", DataType::Int64),
            Field::new("a", DataType::Utf8),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup() {
        let schema = sample();
        assert_eq!(schema.index_of("b"), Some(1));
        assert_eq!(schema.data_type("c").unwrap(), DataType::Float64);
        assert!(schema.data_type("missing").is_err());
    }

    #[test]
    fn test_project_preserves_declaration_order() {
        let schema = sample();
        let narrowed = schema.project(&["c".into(), "a".into()]).unwrap();
        assert_eq!(narrowed.names(), vec!["a", "c"]);
        assert_eq!(
            schema.projection_indices(&["c".into(), "a".into()]).unwrap(),
            vec![0, 2]
        );
    }

    #[test]
    fn test_project_unknown_column() {
        assert!(sample().project(&["z".into()]).is_err());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut schema = sample();
        schema.upsert(Field::new("b", DataType::Int32));
        assert_eq!(schema.index_of("b"), Some(1));
        assert_eq!(schema.data_type("b").unwrap(), DataType::Int32);

        schema.upsert(Field::new("d", DataType::Boolean));
        assert_eq!(schema.index_of("d"), Some(3));
    }
}
