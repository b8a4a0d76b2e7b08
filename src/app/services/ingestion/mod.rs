//! Atomic ingestion of uploads
//!
//! An ingestion replaces any earlier result for the same file name, parses and
//! validates the upload, computes its aggregate and persists aggregate and rows
//! as one unit.
//!
//! ## Architecture
//!
//! - [`coordinator`] - Pipeline orchestration and transaction handling
//! - [`locks`] - Per-file-name serialization
//! - [`stats`] - Ingestion report and pipeline states

pub mod coordinator;
pub mod locks;
pub mod stats;

#[cfg(test)]
mod tests;

pub use coordinator::IngestionCoordinator;
pub use locks::FileLocks;
pub use stats::{IngestReport, IngestState};
