//! The seam scans read through.
//!
//! `DataSource` abstracts over where rows come from so the executor is
//! the same for frame files on disk and for in-memory tables in tests.
//! Sources expose partitions of row groups with per-group metadata, and
//! the scan uses that metadata to skip groups and answer row counts
//! without reading bodies.

use crate::executor::relation::Relation;
use hashbrown::HashMap;
use rivulet_core::{Error, Result, Row, Schema};
use rivulet_source::{ColumnStats, DirectorySource};

/// Metadata for one row group, enough to prune without reading it.
#[derive(Clone, Debug)]
pub struct GroupInfo {
    /// Rows in the group.
    pub row_count: u64,
    /// Per-column statistics, in schema order.
    pub stats: Vec<ColumnStats>,
}

/// A partitioned, row-grouped source of rows.
pub trait DataSource {
    /// Returns the source schema.
    fn schema(&self) -> &Schema;

    /// Returns the number of partitions.
    fn partition_count(&self) -> usize;

    /// Returns group metadata for one partition.
    fn group_infos(&self, partition: usize) -> Result<Vec<GroupInfo>>;

    /// Reads one row group, optionally narrowed to the given column
    /// positions (in schema order).
    fn read_group(
        &self,
        partition: usize,
        group: usize,
        projection: Option<&[usize]>,
    ) -> Result<Vec<Row>>;

    /// Total row count, answered from metadata alone.
    fn row_count(&self) -> Result<u64> {
        let mut total = 0;
        for partition in 0..self.partition_count() {
            for info in self.group_infos(partition)? {
                total += info.row_count;
            }
        }
        Ok(total)
    }
}

impl DataSource for DirectorySource {
    fn schema(&self) -> &Schema {
        DirectorySource::schema(self)
    }

    fn partition_count(&self) -> usize {
        self.partitions().len()
    }

    fn group_infos(&self, partition: usize) -> Result<Vec<GroupInfo>> {
        let meta = self
            .partitions()
            .get(partition)
            .ok_or_else(|| Error::internal(format!("partition {} out of range", partition)))?;
        Ok(meta
            .groups
            .iter()
            .map(|g| GroupInfo {
                row_count: g.row_count,
                stats: g.stats.clone(),
            })
            .collect())
    }

    fn read_group(
        &self,
        partition: usize,
        group: usize,
        projection: Option<&[usize]>,
    ) -> Result<Vec<Row>> {
        DirectorySource::read_group(self, partition, group, projection)
    }

    fn row_count(&self) -> Result<u64> {
        Ok(DirectorySource::row_count(self))
    }
}

/// An in-memory source, one partition of explicit row groups.
///
/// Group statistics are computed on construction, so stats-based pruning
/// behaves exactly as it does over files.
#[derive(Clone, Debug)]
pub struct InMemorySource {
    schema: Schema,
    groups: Vec<Vec<Row>>,
}

impl InMemorySource {
    /// Creates a source holding all rows in a single group.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            groups: vec![rows],
        }
    }

    /// Creates a source with explicit row groups.
    pub fn with_groups(schema: Schema, groups: Vec<Vec<Row>>) -> Self {
        Self { schema, groups }
    }
}

impl DataSource for InMemorySource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn partition_count(&self) -> usize {
        1
    }

    fn group_infos(&self, partition: usize) -> Result<Vec<GroupInfo>> {
        if partition != 0 {
            return Err(Error::internal(format!(
                "partition {} out of range",
                partition
            )));
        }
        Ok(self
            .groups
            .iter()
            .map(|rows| GroupInfo {
                row_count: rows.len() as u64,
                stats: (0..self.schema.len())
                    .map(|col| {
                        let column: Vec<&rivulet_core::Value> =
                            rows.iter().filter_map(|r| r.get(col)).collect();
                        ColumnStats::compute(&column)
                    })
                    .collect(),
            })
            .collect())
    }

    fn read_group(
        &self,
        partition: usize,
        group: usize,
        projection: Option<&[usize]>,
    ) -> Result<Vec<Row>> {
        if partition != 0 {
            return Err(Error::internal(format!(
                "partition {} out of range",
                partition
            )));
        }
        let rows = self
            .groups
            .get(group)
            .ok_or_else(|| Error::internal(format!("group {} out of range", group)))?;
        Ok(match projection {
            None => rows.clone(),
            Some(indices) => rows.iter().map(|r| r.project(indices)).collect(),
        })
    }
}

/// Named sources a plan runner resolves scans against.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Box<dyn DataSource>>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source under a name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, source: Box<dyn DataSource>) {
        self.sources.insert(name.into(), source);
    }

    /// Looks up a source, erroring with the unknown name.
    pub fn get(&self, name: &str) -> Result<&dyn DataSource> {
        self.sources
            .get(name)
            .map(|s| s.as_ref())
            .ok_or_else(|| Error::internal(format!("unknown source: {}", name)))
    }

    /// Reads a whole source as a relation, bypassing the planner. Test
    /// and debugging convenience.
    pub fn read_all(&self, name: &str) -> Result<Relation> {
        let source = self.get(name)?;
        let mut rows = Vec::new();
        for partition in 0..source.partition_count() {
            let groups = source.group_infos(partition)?;
            for group in 0..groups.len() {
                rows.extend(source.read_group(partition, group, None)?);
            }
        }
        Ok(Relation::new(source.schema().clone(), rows))
    }
}
