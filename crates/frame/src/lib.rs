//! Rivulet Frame - the lazy dataframe API.
//!
//! A `LazyFrame` is a logical plan in disguise: every method appends a
//! node and nothing runs until `collect`. The terminal call optimizes
//! the plan and executes it against the sources registered in a
//! `Catalog`, producing a materialized `DataFrame`.
//!
//! ```no_run
//! use rivulet_frame::Catalog;
//! use rivulet_query::{col, lit, AggExpr};
//!
//! # fn main() -> rivulet_core::Result<()> {
//! let mut catalog = Catalog::new();
//! catalog.register_dir("taxi", "./data/taxi")?;
//!
//! let report = catalog
//!     .scan("taxi")?
//!     .filter(col("fare").gt(lit(5.0)))
//!     .group_by(vec![col("zone")])
//!     .agg(vec![AggExpr::sum(col("fare")).alias("total_fare")])
//!     .collect(&catalog)?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

mod catalog;
mod dataframe;
mod lazy;

pub use catalog::Catalog;
pub use dataframe::DataFrame;
pub use lazy::{GroupBy, LazyFrame};
