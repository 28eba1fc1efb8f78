//! Frame file format definitions.

use rivulet_core::{DataType, Schema, Value};
use std::path::PathBuf;

/// File magic bytes.
pub const MAGIC: &[u8; 4] = b"RVF1";

/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

/// Data type ids for on-disk encoding.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeId {
    Boolean = 0,
    Int32 = 1,
    Int64 = 2,
    Float64 = 3,
    Utf8 = 4,
    Date = 5,
    Datetime = 6,
}

impl TypeId {
    /// Decodes a type id byte.
    pub fn from_u8(byte: u8) -> Option<TypeId> {
        match byte {
            0 => Some(TypeId::Boolean),
            1 => Some(TypeId::Int32),
            2 => Some(TypeId::Int64),
            3 => Some(TypeId::Float64),
            4 => Some(TypeId::Utf8),
            5 => Some(TypeId::Date),
            6 => Some(TypeId::Datetime),
            _ => None,
        }
    }

    /// Fixed encoded size in bytes, or None for variable-length types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeId::Boolean => Some(1),
            TypeId::Int32 | TypeId::Date => Some(4),
            TypeId::Int64 | TypeId::Float64 | TypeId::Datetime => Some(8),
            TypeId::Utf8 => None,
        }
    }
}

impl From<DataType> for TypeId {
    fn from(dt: DataType) -> Self {
        match dt {
            DataType::Boolean => TypeId::Boolean,
            DataType::Int32 => TypeId::Int32,
            DataType::Int64 => TypeId::Int64,
            DataType::Float64 => TypeId::Float64,
            DataType::Utf8 => TypeId::Utf8,
            DataType::Date => TypeId::Date,
            DataType::Datetime => TypeId::Datetime,
        }
    }
}

impl From<TypeId> for DataType {
    fn from(id: TypeId) -> Self {
        match id {
            TypeId::Boolean => DataType::Boolean,
            TypeId::Int32 => DataType::Int32,
            TypeId::Int64 => DataType::Int64,
            TypeId::Float64 => DataType::Float64,
            TypeId::Utf8 => DataType::Utf8,
            TypeId::Date => DataType::Date,
            TypeId::Datetime => DataType::Datetime,
        }
    }
}

/// Per-column statistics for one row group.
///
/// `min`/`max` are over non-null values only and are `None` when the
/// column holds no non-null values in the group.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnStats {
    pub null_count: u64,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

impl ColumnStats {
    /// Computes statistics over one column of values.
    pub fn compute(values: &[&Value]) -> ColumnStats {
        let mut stats = ColumnStats {
            null_count: 0,
            min: None,
            max: None,
        };
        for value in values {
            stats.observe(value);
        }
        stats
    }

    /// Folds a single value into the statistics.
    pub fn observe(&mut self, value: &Value) {
        if value.is_null() {
            self.null_count += 1;
            return;
        }
        match &self.min {
            Some(min) if *value >= *min => {}
            _ => self.min = Some(value.clone()),
        }
        match &self.max {
            Some(max) if *value <= *max => {}
            _ => self.max = Some(value.clone()),
        }
    }
}

/// Metadata for one row group, read without touching the group body.
#[derive(Clone, Debug)]
pub struct RowGroupMeta {
    /// Number of rows in the group.
    pub row_count: u64,
    /// File offset of the group body.
    pub body_offset: u64,
    /// Byte length of the group body.
    pub body_len: u64,
    /// Encoded byte length of each column chunk, in schema order.
    pub chunk_lens: Vec<u64>,
    /// Per-column statistics, in schema order.
    pub stats: Vec<ColumnStats>,
}

/// Metadata for a whole frame file.
#[derive(Clone, Debug)]
pub struct FileMetadata {
    /// Path the metadata was read from.
    pub path: PathBuf,
    /// Column schema shared by all groups.
    pub schema: Schema,
    /// Row groups in file order.
    pub groups: Vec<RowGroupMeta>,
}

impl FileMetadata {
    /// Total row count, answered from metadata alone.
    pub fn row_count(&self) -> u64 {
        self.groups.iter().map(|g| g.row_count).sum()
    }
}
