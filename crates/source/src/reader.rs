//! Frame file reader.
//!
//! Opening a file parses only headers and group directories; group bodies
//! are read on demand, per group and per projected column.

use crate::format::{ColumnStats, FileMetadata, RowGroupMeta, TypeId, FORMAT_VERSION, MAGIC};
use rivulet_core::{Error, Field, Result, Row, Schema, Value};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Reads a frame file.
#[derive(Debug)]
pub struct FrameReader {
    path: PathBuf,
    file: BufReader<File>,
    meta: FileMetadata,
}

impl FrameReader {
    /// Opens a file and parses its metadata without reading group bodies.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| Error::source(&path, e))?;
        let mut file = BufReader::new(file);
        let meta = parse_metadata(&path, &mut file)?;
        Ok(Self { path, file, meta })
    }

    /// Returns the parsed file metadata.
    pub fn metadata(&self) -> &FileMetadata {
        &self.meta
    }

    /// Reads one row group, materializing only the projected column
    /// positions (in the order given). `None` reads every column.
    pub fn read_group(
        &mut self,
        group_index: usize,
        projection: Option<&[usize]>,
    ) -> Result<Vec<Row>> {
        read_group_body(&self.path, &mut self.file, &self.meta, group_index, projection)
    }

    /// Reads every group in file order.
    pub fn read_all(&mut self, projection: Option<&[usize]>) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for g in 0..self.meta.groups.len() {
            rows.extend(self.read_group(g, projection)?);
        }
        Ok(rows)
    }
}

/// Reads only the metadata of a frame file.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<FileMetadata> {
    FrameReader::open(path).map(|r| r.meta)
}

/// Reads one group of a file whose metadata is already in hand, seeking
/// straight to the group body instead of re-parsing headers.
pub fn read_group_at(
    meta: &FileMetadata,
    group_index: usize,
    projection: Option<&[usize]>,
) -> Result<Vec<Row>> {
    let file = File::open(&meta.path).map_err(|e| Error::source(&meta.path, e))?;
    let mut file = BufReader::new(file);
    read_group_body(&meta.path, &mut file, meta, group_index, projection)
}

fn read_group_body(
    path: &Path,
    file: &mut BufReader<File>,
    meta: &FileMetadata,
    group_index: usize,
    projection: Option<&[usize]>,
) -> Result<Vec<Row>> {
    let group = meta
        .groups
        .get(group_index)
        .ok_or_else(|| Error::internal(format!("row group {} out of range", group_index)))?;

    let wanted: Vec<usize> = match projection {
        Some(indices) => indices.to_vec(),
        None => (0..meta.schema.len()).collect(),
    };
    for &col in &wanted {
        if col >= meta.schema.len() {
            return Err(Error::internal(format!("column index {} out of range", col)));
        }
    }

    file.seek(SeekFrom::Start(group.body_offset))
        .map_err(|e| Error::source(path, e))?;

    let n = group.row_count as usize;
    let mut columns: Vec<Option<Vec<Value>>> = vec![None; meta.schema.len()];
    for col in 0..meta.schema.len() {
        let chunk_len = group.chunk_lens[col];
        if wanted.contains(&col) {
            let mut chunk = vec![0u8; chunk_len as usize];
            file.read_exact(&mut chunk)
                .map_err(|e| Error::source(path, e))?;
            let type_id = TypeId::from(meta.schema.fields()[col].data_type());
            columns[col] = Some(decode_chunk(path, &chunk, type_id, n)?);
        } else {
            file.seek(SeekFrom::Current(chunk_len as i64))
                .map_err(|e| Error::source(path, e))?;
        }
    }

    let mut rows = Vec::with_capacity(n);
    for r in 0..n {
        let values = wanted
            .iter()
            .map(|&col| {
                columns[col]
                    .as_ref()
                    .map(|c| c[r].clone())
                    .unwrap_or(Value::Null)
            })
            .collect();
        rows.push(Row::new(values));
    }
    Ok(rows)
}

fn parse_metadata(path: &Path, file: &mut BufReader<File>) -> Result<FileMetadata> {
    let mut magic = [0u8; 4];
    read_exact(path, file, &mut magic)?;
    if &magic != MAGIC {
        return Err(Error::corrupt(path, "bad magic bytes"));
    }
    let version = read_u16(path, file)?;
    if version != FORMAT_VERSION {
        return Err(Error::corrupt(
            path,
            format!("unsupported format version {}", version),
        ));
    }

    let col_count = read_u16(path, file)? as usize;
    let mut fields = Vec::with_capacity(col_count);
    for _ in 0..col_count {
        let name_len = read_u16(path, file)? as usize;
        let mut name = vec![0u8; name_len];
        read_exact(path, file, &mut name)?;
        let name = String::from_utf8(name)
            .map_err(|_| Error::corrupt(path, "column name is not valid UTF-8"))?;
        let mut id = [0u8; 1];
        read_exact(path, file, &mut id)?;
        let type_id = TypeId::from_u8(id[0])
            .ok_or_else(|| Error::corrupt(path, format!("unknown type id {}", id[0])))?;
        fields.push(Field::new(name, type_id.into()));
    }
    let schema = Schema::new(fields).map_err(|e| Error::corrupt(path, e.to_string()))?;

    let group_count = read_u32(path, file)? as usize;
    let mut groups = Vec::with_capacity(group_count);
    for _ in 0..group_count {
        let row_count = read_u32(path, file)? as u64;
        let body_len = read_u32(path, file)? as u64;
        let mut chunk_lens = Vec::with_capacity(schema.len());
        let mut stats = Vec::with_capacity(schema.len());
        for field in schema.fields() {
            let type_id = TypeId::from(field.data_type());
            let null_count = read_u32(path, file)? as u64;
            chunk_lens.push(read_u32(path, file)? as u64);
            let min = read_bound(path, file, type_id)?;
            let max = read_bound(path, file, type_id)?;
            stats.push(ColumnStats {
                null_count,
                min,
                max,
            });
        }
        if chunk_lens.iter().sum::<u64>() != body_len {
            return Err(Error::corrupt(path, "group body length mismatch"));
        }
        let body_offset = file
            .stream_position()
            .map_err(|e| Error::source(path, e))?;
        file.seek(SeekFrom::Current(body_len as i64))
            .map_err(|e| Error::source(path, e))?;
        groups.push(RowGroupMeta {
            row_count,
            body_offset,
            body_len,
            chunk_lens,
            stats,
        });
    }

    Ok(FileMetadata {
        path: path.to_path_buf(),
        schema,
        groups,
    })
}

/// Decodes one column chunk: null bitmap, then `n` encoded values.
fn decode_chunk(path: &Path, chunk: &[u8], type_id: TypeId, n: usize) -> Result<Vec<Value>> {
    let bitmap_len = n.div_ceil(8);
    if chunk.len() < bitmap_len {
        return Err(Error::corrupt(path, "column chunk shorter than null bitmap"));
    }
    let (bitmap, mut data) = chunk.split_at(bitmap_len);
    let mut values = Vec::with_capacity(n);
    for r in 0..n {
        let is_null = bitmap[r / 8] & (1 << (r % 8)) != 0;
        let value = decode_value(path, &mut data, type_id)?;
        values.push(if is_null { Value::Null } else { value });
    }
    Ok(values)
}

/// Decodes a single value from the front of `data`, advancing it.
fn decode_value(path: &Path, data: &mut &[u8], type_id: TypeId) -> Result<Value> {
    let take = |data: &mut &[u8], n: usize| -> Result<Vec<u8>> {
        if data.len() < n {
            return Err(Error::corrupt(path, "unexpected end of column chunk"));
        }
        let (head, rest) = data.split_at(n);
        let bytes = head.to_vec();
        *data = rest;
        Ok(bytes)
    };
    Ok(match type_id {
        TypeId::Boolean => Value::Boolean(take(data, 1)?[0] != 0),
        TypeId::Int32 => {
            Value::Int32(i32::from_le_bytes(take(data, 4)?.try_into().unwrap()))
        }
        TypeId::Int64 => {
            Value::Int64(i64::from_le_bytes(take(data, 8)?.try_into().unwrap()))
        }
        TypeId::Float64 => {
            Value::Float64(f64::from_le_bytes(take(data, 8)?.try_into().unwrap()))
        }
        TypeId::Utf8 => {
            let len = u32::from_le_bytes(take(data, 4)?.try_into().unwrap()) as usize;
            let bytes = take(data, len)?;
            Value::Utf8(
                String::from_utf8(bytes)
                    .map_err(|_| Error::corrupt(path, "string value is not valid UTF-8"))?,
            )
        }
        TypeId::Date => {
            Value::Date(i32::from_le_bytes(take(data, 4)?.try_into().unwrap()))
        }
        TypeId::Datetime => {
            Value::Datetime(i64::from_le_bytes(take(data, 8)?.try_into().unwrap()))
        }
    })
}

fn read_bound(path: &Path, file: &mut BufReader<File>, type_id: TypeId) -> Result<Option<Value>> {
    let mut flag = [0u8; 1];
    read_exact(path, file, &mut flag)?;
    if flag[0] == 0 {
        return Ok(None);
    }
    let size = match type_id.fixed_size() {
        Some(size) => size,
        None => {
            let len = read_u32(path, file)? as usize;
            let mut bytes = vec![0u8; len];
            read_exact(path, file, &mut bytes)?;
            let s = String::from_utf8(bytes)
                .map_err(|_| Error::corrupt(path, "stats bound is not valid UTF-8"))?;
            return Ok(Some(Value::Utf8(s)));
        }
    };
    let mut bytes = vec![0u8; size];
    read_exact(path, file, &mut bytes)?;
    let mut slice: &[u8] = &bytes;
    // Fixed-size bounds reuse the chunk value decoding.
    decode_value(path, &mut slice, type_id).map(Some)
}

fn read_exact(path: &Path, file: &mut BufReader<File>, buf: &mut [u8]) -> Result<()> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::corrupt(path, "unexpected end of file")
        } else {
            Error::source(path, e)
        }
    })
}

fn read_u16(path: &Path, file: &mut BufReader<File>) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(path, file, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(path: &Path, file: &mut BufReader<File>) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(path, file, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
