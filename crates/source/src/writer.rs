//! Frame file writer.
//!
//! Rows are buffered and cut into row groups of a configurable size;
//! per-column statistics are computed as each group is sealed. The whole
//! file is assembled at `finish` so the group directory in each header is
//! exact.

use crate::format::{ColumnStats, TypeId, FORMAT_VERSION, MAGIC};
use rivulet_core::{Error, Result, Row, Schema, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default number of rows per row group.
pub const DEFAULT_ROWS_PER_GROUP: usize = 4096;

/// One sealed row group awaiting serialization.
struct EncodedGroup {
    row_count: u64,
    stats: Vec<ColumnStats>,
    chunks: Vec<Vec<u8>>,
}

/// Writes rows into a frame file.
pub struct FrameWriter {
    path: PathBuf,
    schema: Schema,
    rows_per_group: usize,
    pending: Vec<Row>,
    groups: Vec<EncodedGroup>,
}

impl FrameWriter {
    /// Creates a writer targeting the given path.
    pub fn new(path: impl Into<PathBuf>, schema: Schema, rows_per_group: usize) -> Result<Self> {
        if rows_per_group == 0 {
            return Err(Error::internal("rows_per_group must be positive"));
        }
        if schema.is_empty() {
            return Err(Error::internal("cannot write a file with no columns"));
        }
        Ok(Self {
            path: path.into(),
            schema,
            rows_per_group,
            pending: Vec::new(),
            groups: Vec::new(),
        })
    }

    /// Appends a row, sealing a group when the configured size is reached.
    pub fn write_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(Error::internal(format!(
                "row arity {} does not match schema arity {}",
                row.len(),
                self.schema.len()
            )));
        }
        for (i, value) in row.values().iter().enumerate() {
            let expected = self.schema.fields()[i].data_type();
            if let Some(actual) = value.data_type() {
                if actual != expected {
                    return Err(Error::type_mismatch(expected, actual));
                }
            }
        }
        self.pending.push(row);
        if self.pending.len() >= self.rows_per_group {
            self.seal_group();
        }
        Ok(())
    }

    /// Seals the pending rows into an encoded group.
    fn seal_group(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.pending);
        let mut stats = Vec::with_capacity(self.schema.len());
        let mut chunks = Vec::with_capacity(self.schema.len());

        for (col, field) in self.schema.fields().iter().enumerate() {
            let type_id = TypeId::from(field.data_type());
            let mut col_stats = ColumnStats {
                null_count: 0,
                min: None,
                max: None,
            };
            let mut chunk = vec![0u8; rows.len().div_ceil(8)];
            for (r, row) in rows.iter().enumerate() {
                let value = row.get(col).unwrap_or(&Value::Null);
                col_stats.observe(value);
                if value.is_null() {
                    chunk[r / 8] |= 1 << (r % 8);
                }
            }
            for row in &rows {
                let value = row.get(col).unwrap_or(&Value::Null);
                encode_value(&mut chunk, type_id, value);
            }
            stats.push(col_stats);
            chunks.push(chunk);
        }

        self.groups.push(EncodedGroup {
            row_count: rows.len() as u64,
            stats,
            chunks,
        });
    }

    /// Seals the last group and writes the file.
    pub fn finish(mut self) -> Result<()> {
        self.seal_group();

        let file = File::create(&self.path).map_err(|e| Error::source(&self.path, e))?;
        let mut out = BufWriter::new(file);
        let io = |e| Error::source(&self.path, e);

        out.write_all(MAGIC).map_err(io)?;
        out.write_all(&FORMAT_VERSION.to_le_bytes()).map_err(io)?;
        out.write_all(&(self.schema.len() as u16).to_le_bytes())
            .map_err(io)?;
        for field in self.schema.fields() {
            let name = field.name().as_bytes();
            out.write_all(&(name.len() as u16).to_le_bytes()).map_err(io)?;
            out.write_all(name).map_err(io)?;
            out.write_all(&[TypeId::from(field.data_type()) as u8])
                .map_err(io)?;
        }
        out.write_all(&fits_u32(self.groups.len() as u64, "group count")?.to_le_bytes())
            .map_err(io)?;

        for group in &self.groups {
            let body_len: u64 = group.chunks.iter().map(|c| c.len() as u64).sum();
            out.write_all(&fits_u32(group.row_count, "group row count")?.to_le_bytes())
                .map_err(io)?;
            out.write_all(&fits_u32(body_len, "group body length")?.to_le_bytes())
                .map_err(io)?;
            for (col, stats) in group.stats.iter().enumerate() {
                let type_id = TypeId::from(self.schema.fields()[col].data_type());
                out.write_all(&fits_u32(stats.null_count, "null count")?.to_le_bytes())
                    .map_err(io)?;
                out.write_all(
                    &fits_u32(group.chunks[col].len() as u64, "column chunk length")?
                        .to_le_bytes(),
                )
                .map_err(io)?;
                let mut bound = Vec::new();
                write_bound(&mut bound, type_id, stats.min.as_ref());
                write_bound(&mut bound, type_id, stats.max.as_ref());
                out.write_all(&bound).map_err(io)?;
            }
            for chunk in &group.chunks {
                out.write_all(chunk).map_err(io)?;
            }
        }
        out.flush().map_err(io)?;
        Ok(())
    }
}

/// The group directory encodes sizes as u32; refuse to truncate.
fn fits_u32(n: u64, what: &str) -> Result<u32> {
    u32::try_from(n)
        .map_err(|_| Error::internal(format!("{} {} exceeds the file format limit", what, n)))
}

/// Writes a whole file in one call.
pub fn write_file(
    path: impl AsRef<Path>,
    schema: Schema,
    rows: Vec<Row>,
    rows_per_group: usize,
) -> Result<()> {
    let mut writer = FrameWriter::new(path.as_ref(), schema, rows_per_group)?;
    for row in rows {
        writer.write_row(row)?;
    }
    writer.finish()
}

/// Encodes a single value at the end of `buf`.
///
/// Null fixed-width values occupy their slot as zeros so chunk offsets
/// stay computable; null strings encode as a zero length.
pub(crate) fn encode_value(buf: &mut Vec<u8>, type_id: TypeId, value: &Value) {
    match type_id {
        TypeId::Boolean => buf.push(match value {
            Value::Boolean(true) => 1,
            _ => 0,
        }),
        TypeId::Int32 => {
            buf.extend_from_slice(&value.as_i32().unwrap_or(0).to_le_bytes());
        }
        TypeId::Int64 => {
            buf.extend_from_slice(&value.as_i64().unwrap_or(0).to_le_bytes());
        }
        TypeId::Float64 => {
            buf.extend_from_slice(&value.as_f64().unwrap_or(0.0).to_le_bytes());
        }
        TypeId::Utf8 => {
            let bytes = value.as_str().unwrap_or("").as_bytes();
            buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            buf.extend_from_slice(bytes);
        }
        TypeId::Date => {
            buf.extend_from_slice(&value.as_date().unwrap_or(0).to_le_bytes());
        }
        TypeId::Datetime => {
            buf.extend_from_slice(&value.as_datetime().unwrap_or(0).to_le_bytes());
        }
    }
}

/// Writes an optional stats bound: presence byte, then the value.
fn write_bound(buf: &mut Vec<u8>, type_id: TypeId, bound: Option<&Value>) {
    match bound {
        Some(value) => {
            buf.push(1);
            encode_value(buf, type_id, value);
        }
        None => buf.push(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivulet_core::{DataType, Field};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            FrameWriter::new(dir.path().join("t.rvf"), schema(), 8).unwrap();
        let err = writer.write_row(Row::new(vec![Value::Int64(1)]));
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            FrameWriter::new(dir.path().join("t.rvf"), schema(), 8).unwrap();
        let err = writer.write_row(Row::new(vec![
            Value::Utf8("oops".into()),
            Value::Utf8("x".into()),
        ]));
        assert!(err.is_err());
    }

    #[test]
    fn test_oversized_directory_field_rejected() {
        assert_eq!(fits_u32(u32::MAX as u64, "x").unwrap(), u32::MAX);
        assert!(fits_u32(u32::MAX as u64 + 1, "group body length").is_err());
    }

    #[test]
    fn test_null_allowed_for_any_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            FrameWriter::new(dir.path().join("t.rvf"), schema(), 8).unwrap();
        writer
            .write_row(Row::new(vec![Value::Null, Value::Null]))
            .unwrap();
        writer.finish().unwrap();
    }
}
