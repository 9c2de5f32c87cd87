#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flat-file loader for the green area dashboard.
//!
//! Reads the four source files (green area `GeoJSON`, nearby services CSV,
//! census block CSV and the park name lookup JSON), coerces raw columns
//! into the typed rows of [`radiografia_park_models`], and indexes each
//! table by its primary key. The result is an immutable [`Dataset`]
//! snapshot; reloading builds a new snapshot and swaps it in through a
//! [`SnapshotHandle`].
//!
//! Missing files, missing columns, unparseable keys and duplicate primary
//! keys are fatal ([`DataLoadError`]). Dirty numeric cells never are: they
//! are coerced to zero and recorded as
//! [`radiografia_park_models::DataQualityWarning`]s.

pub mod census;
pub mod coerce;
pub mod config;
pub mod dataset;
pub mod green_areas;
pub mod park_names;
pub mod services;
pub mod snapshot;
mod table;

use thiserror::Error;

pub use config::DatasetConfig;
pub use dataset::{Dataset, DatasetSources, DatasetSummary, SourceText};
pub use snapshot::SnapshotHandle;

/// Fatal errors raised while loading the source files.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// A required source file does not exist.
    #[error("Missing source file: {path}")]
    MissingFile {
        /// Path that was expected.
        path: String,
    },

    /// A required column (or `GeoJSON` property) is absent.
    #[error("Missing column '{column}' in {path}")]
    MissingColumn {
        /// Source label or path.
        path: String,
        /// Column name.
        column: String,
    },

    /// I/O error while reading a source file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing error.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Source label or path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// JSON parsing error.
    #[error("JSON error in {path}: {source}")]
    Json {
        /// Source label or path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// `GeoJSON` structure error.
    #[error("GeoJSON error in {path}: {message}")]
    GeoJson {
        /// Source label or path.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A primary or foreign key cell could not be parsed.
    #[error("Invalid key in {path} row {row}: {column}={value:?}")]
    InvalidKey {
        /// Source label or path.
        path: String,
        /// One-based data row number.
        row: usize,
        /// Column name.
        column: String,
        /// Raw cell text.
        value: String,
    },

    /// A primary key appears more than once.
    #[error("Duplicate key {key} in {path}")]
    DuplicateKey {
        /// Source label or path.
        path: String,
        /// The repeated key.
        key: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
