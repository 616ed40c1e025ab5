//! Report generation for recorded regions.
//!
//! This module provides a serializable [`Report`] and formatters for it:
//! - Terminal: human-readable table with colors and box drawing
//! - JSON: machine-readable serialization

pub mod json;
pub mod terminal;

use serde::Serialize;

use crate::config::Config;
use crate::storage::{RegionRecord, Storage};
use crate::units::TimeUnit;

pub use json::{to_json, to_json_pretty};
pub use terminal::format_report;

/// Report header.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Version of this crate.
    pub version: &'static str,
    /// Display unit of timing metrics.
    pub timing_unit: TimeUnit,
    /// Number of partial results (threads, processes) reduced into this report.
    pub sources: usize,
}

/// Snapshot of a storage, ready for output.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Header.
    pub metadata: ReportMetadata,
    /// Regions in first-recorded order.
    pub regions: Vec<RegionRecord>,
}

impl Report {
    /// Build a report from `storage`, which combines `sources` partial results.
    pub fn new(storage: &Storage, config: &Config, sources: usize) -> Self {
        Self {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION"),
                timing_unit: config.timing_unit,
                sources,
            },
            regions: storage.iter().cloned().collect(),
        }
    }

    /// Whether the report has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
