//! Named sources a session works with.

use crate::lazy::LazyFrame;
use rivulet_core::{Result, Row, Schema};
use rivulet_query::{LogicalPlan, SourceRegistry};
use rivulet_query::{DataSource, InMemorySource};
use rivulet_source::DirectorySource;
use std::path::Path;

/// Owns the sources plans execute against.
///
/// Frames themselves are plain values holding only a plan; the catalog
/// is handed to `collect`, so one frame can be built once and run
/// against different catalogs.
#[derive(Default)]
pub struct Catalog {
    registry: SourceRegistry,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory of frame files under a name.
    pub fn register_dir(&mut self, name: impl Into<String>, dir: impl AsRef<Path>) -> Result<()> {
        let name = name.into();
        let source = DirectorySource::open(dir)?;
        log::info!(
            "registered {} ({} partitions, {} rows)",
            name,
            source.partitions().len(),
            source.row_count()
        );
        self.registry.register(name, Box::new(source));
        Ok(())
    }

    /// Registers in-memory rows under a name.
    pub fn register_rows(
        &mut self,
        name: impl Into<String>,
        schema: Schema,
        rows: Vec<Row>,
    ) -> Result<()> {
        self.registry
            .register(name.into(), Box::new(InMemorySource::new(schema, rows)));
        Ok(())
    }

    /// Starts a lazy scan of a registered source.
    pub fn scan(&self, name: &str) -> Result<LazyFrame> {
        let schema = self.registry.get(name)?.schema().clone();
        Ok(LazyFrame::from_plan(LogicalPlan::scan(name, schema)))
    }

    /// Returns the schema of a registered source.
    pub fn schema(&self, name: &str) -> Result<Schema> {
        Ok(self.registry.get(name)?.schema().clone())
    }

    pub(crate) fn registry(&self) -> &SourceRegistry {
        &self.registry
    }
}
