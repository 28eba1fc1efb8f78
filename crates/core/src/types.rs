//! Data type definitions for the Rivulet engine.
//!
//! This module defines the semantic types a column can carry and the
//! ordering the type-coercion pass uses to pick a common supertype.

/// Supported column data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    Utf8,
    /// Calendar date stored as days since the Unix epoch
    Date,
    /// Instant stored as Unix timestamp (milliseconds)
    Datetime,
}

impl DataType {
    /// Returns whether this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64 | DataType::Float64)
    }

    /// Returns whether this is a temporal type.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Datetime)
    }

    /// Representation width used to pick the narrowest common supertype.
    ///
    /// Only meaningful within the numeric family and within the temporal
    /// family; comparing widths across families is not.
    pub fn width(&self) -> u8 {
        match self {
            DataType::Boolean => 1,
            DataType::Int32 => 4,
            DataType::Int64 => 8,
            DataType::Float64 => 9,
            DataType::Utf8 => 0,
            DataType::Date => 4,
            DataType::Datetime => 8,
        }
    }

    /// Returns the narrowest type both operands can be widened to, or
    /// `None` when no lossless common supertype exists.
    pub fn common_super_type(a: DataType, b: DataType) -> Option<DataType> {
        if a == b {
            return Some(a);
        }
        if a.is_numeric() && b.is_numeric() {
            return Some(if a.width() >= b.width() { a } else { b });
        }
        if a.is_temporal() && b.is_temporal() {
            return Some(if a.width() >= b.width() { a } else { b });
        }
        None
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            DataType::Boolean => "bool",
            DataType::Int32 => "i32",
            DataType::Int64 => "i64",
            DataType::Float64 => "f64",
            DataType::Utf8 => "str",
            DataType::Date => "date",
            DataType::Datetime => "datetime",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_family() {
        assert!(DataType::Int32.is_numeric());
        assert!(DataType::Float64.is_numeric());
        assert!(!DataType::Utf8.is_numeric());
        assert!(!DataType::Date.is_numeric());
    }

    #[test]
    fn test_common_super_type_numeric() {
        assert_eq!(
            DataType::common_super_type(DataType::Int32, DataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(
            DataType::common_super_type(DataType::Int64, DataType::Float64),
            Some(DataType::Float64)
        );
        assert_eq!(
            DataType::common_super_type(DataType::Int32, DataType::Int32),
            Some(DataType::Int32)
        );
    }

    #[test]
    fn test_common_super_type_temporal() {
        assert_eq!(
            DataType::common_super_type(DataType::Date, DataType::Datetime),
            Some(DataType::Datetime)
        );
    }

    #[test]
    fn test_no_common_super_type_across_families() {
        assert_eq!(
            DataType::common_super_type(DataType::Utf8, DataType::Int64),
            None
        );
        assert_eq!(
            DataType::common_super_type(DataType::Date, DataType::Float64),
            None
        );
        assert_eq!(
            DataType::common_super_type(DataType::Boolean, DataType::Int32),
            None
        );
    }
}
