//! Rivulet Source - columnar file format and directory sources.
//!
//! This crate defines the on-disk frame file format (`.rvf`) and the
//! directory source the scan stage reads from:
//!
//! - `format`: byte layout constants, type ids, row-group metadata and
//!   per-column statistics
//! - `writer`: encodes rows into frame files, computing statistics per
//!   row group
//! - `reader`: metadata-only reads, group skipping, and projected group
//!   reads
//! - `directory`: a directory of frame files treated as one partitioned
//!   source
//!
//! ## File layout
//!
//! ```text
//! Header:
//! +-------+---------+-----------+----------------------+-------------+
//! | magic | version | col_count | per-column name+type | group_count |
//! | 4B    | u16     | u16       | (u16 len, bytes, u8) | u32         |
//! +-------+---------+-----------+----------------------+-------------+
//!
//! Row group (repeated group_count times):
//!   row_count u32, body_len u32
//!   per column: null_count u32, chunk_len u32,
//!               has_min u8 [min], has_max u8 [max]
//!   body: per-column chunks (null bitmap, then values)
//! ```
//!
//! `body_len` and the per-column `chunk_len`s let a reader skip whole
//! groups, or non-projected columns within a group, without decoding them.

pub mod directory;
pub mod format;
pub mod reader;
pub mod writer;

pub use directory::DirectorySource;
pub use format::{ColumnStats, FileMetadata, RowGroupMeta, TypeId, FORMAT_VERSION, MAGIC};
pub use reader::FrameReader;
pub use writer::{write_file, FrameWriter};
