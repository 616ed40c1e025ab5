//! Error types for measurement sessions and components.

/// Error returned by registry, session, storage and normalization operations.
///
/// A missing primary during derivation is not represented here: derivation
/// reports it through its `bool` return value and leaves state untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A normalization divisor of zero was supplied.
    ///
    /// The component keeps its previous divisor.
    #[error("data size must be at least 1 (got 0)")]
    ZeroDataSize,

    /// A component label is not registered.
    #[error("component '{0}' is not registered")]
    UnknownComponent(String),

    /// A component label was registered twice.
    #[error("component '{0}' is already registered")]
    DuplicateComponent(String),

    /// A region was closed while a different region was innermost.
    #[error("region '{found}' closed while '{expected}' is the innermost open region")]
    RegionMismatch {
        /// Path of the innermost open region.
        expected: String,
        /// Path of the region that was closed.
        found: String,
    },

    /// A region was closed that is not open in this session.
    #[error("region '{0}' closed but it is not open in this session")]
    NoOpenRegion(String),

    /// The same metric label was recorded with two different units.
    #[error("metric '{label}' recorded in '{left}' and '{right}'")]
    UnitMismatch {
        /// Metric label.
        label: String,
        /// Unit already stored.
        left: String,
        /// Unit of the incoming record.
        right: String,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A display unit name could not be parsed.
    #[error("unknown time unit '{0}' (expected one of: nsec, usec, msec, sec)")]
    InvalidUnit(String),

    /// Report serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
