//! # perfnorm
//!
//! Size-normalized performance measurements.
//!
//! A primary measurement (wall-clock time, process CPU time, cycle counts)
//! tells you how long a region took. Its normalized form tells you how long
//! the region took *per item of data*: the primary's accumulated value divided
//! by a data size stored with the region.
//!
//! This crate provides:
//! - [`Normalized<T>`]: the normalized view of any [`Measurement`]
//! - A [`Session`] that runs scoped regions and derives normalized values at
//!   region close
//! - An explicit [`ComponentRegistry`] selecting which metrics are collected
//! - Per-region [`Statistics`], reduction across sessions, and terminal/JSON
//!   reports
//!
//! ## Quick Start
//!
//! ```ignore
//! use perfnorm::{ComponentRegistry, Config, Session};
//!
//! let mut session = Session::new(Config::default(), ComponentRegistry::with_defaults())?;
//!
//! for n in [128, 256, 512] {
//!     session.measure("matvec", (n * n) as u64, || matvec(n))?;
//! }
//!
//! print!("{}", perfnorm::output::format_report(&session.report(), session.config()));
//! ```
//!
//! ## Zero Data Size
//!
//! A data size of 0 is rejected with [`Error::ZeroDataSize`]. The component
//! (or region) keeps its previous divisor, so reads never divide by zero.
//!
//! ## Combining Sessions
//!
//! Sessions are single-threaded values. Run one per thread and combine their
//! storages with [`reduce`]:
//!
//! ```ignore
//! let parts: Vec<Storage> = handles.into_iter().map(|h| h.join().unwrap()).collect();
//! let sources = parts.len();
//! let total = perfnorm::reduce(parts)?;
//! let report = perfnorm::output::Report::new(&total, &config, sources);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod normalized;
mod registry;
mod session;
mod statistics;
mod units;

// Functional modules
pub mod measurement;
pub mod output;
pub mod storage;

// Re-exports for public API
pub use config::{Config, ENV_PREFIX};
pub use error::{Error, Result};
pub use measurement::{Component, CpuClock, CycleCounter, Derivable, Measurement, Unit, WallClock};
pub use normalized::{DeriveState, Normalized};
pub use output::{Report, ReportMetadata};
pub use registry::{ComponentInfo, ComponentRegistry};
pub use session::{MetricValue, Region, RegionSample, Session};
pub use statistics::Statistics;
pub use storage::{reduce, MetricRecord, RegionRecord, Storage};
pub use units::TimeUnit;
