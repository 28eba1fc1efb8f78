//! Directory source: a directory of frame files as one partitioned source.
//!
//! Files are named by the producer (typically `YYYY-MM.rvf`) and are read
//! in lexicographic order, so month order falls out of name order. Every
//! file must carry the same schema; each file is one partition.

use crate::format::FileMetadata;
use crate::reader::{read_group_at, read_metadata};
use rivulet_core::{Error, Result, Row, Schema};
use std::path::{Path, PathBuf};

/// File extension the directory source picks up.
pub const FRAME_FILE_EXT: &str = "rvf";

/// A directory of frame files sharing one schema.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    schema: Schema,
    partitions: Vec<FileMetadata>,
}

impl DirectorySource {
    /// Opens a directory, reading metadata from every frame file in it.
    ///
    /// Fails if the directory holds no frame files or the files disagree
    /// on schema.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let entries =
            std::fs::read_dir(&dir).map_err(|e| Error::source(&dir, e))?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::source(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(FRAME_FILE_EXT) {
                paths.push(path);
            }
        }
        paths.sort();
        if paths.is_empty() {
            return Err(Error::source(
                &dir,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no frame files in directory",
                ),
            ));
        }

        let mut partitions = Vec::with_capacity(paths.len());
        let mut schema: Option<Schema> = None;
        for path in paths {
            let meta = read_metadata(&path)?;
            match &schema {
                None => schema = Some(meta.schema.clone()),
                Some(expected) if *expected != meta.schema => {
                    return Err(Error::schema_mismatch(format!(
                        "{} does not match the first file's schema",
                        path.display()
                    )));
                }
                Some(_) => {}
            }
            partitions.push(meta);
        }

        log::debug!(
            "opened directory source {} with {} partition(s)",
            dir.display(),
            partitions.len()
        );
        let schema = schema.ok_or_else(|| Error::internal("no partition metadata collected"))?;
        Ok(Self {
            dir,
            schema,
            partitions,
        })
    }

    /// Returns the directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the shared schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns partition metadata in file-name order.
    pub fn partitions(&self) -> &[FileMetadata] {
        &self.partitions
    }

    /// Total row count across all partitions, from metadata alone.
    pub fn row_count(&self) -> u64 {
        self.partitions.iter().map(|p| p.row_count()).sum()
    }

    /// Reads one row group of one partition with an optional projection.
    pub fn read_group(
        &self,
        partition: usize,
        group: usize,
        projection: Option<&[usize]>,
    ) -> Result<Vec<Row>> {
        let meta = self.partitions.get(partition).ok_or_else(|| {
            Error::internal(format!("partition {} out of range", partition))
        })?;
        read_group_at(meta, group, projection)
    }
}
