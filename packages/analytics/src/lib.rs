#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Park analytics over a loaded [`radiografia_dataset::Dataset`].
//!
//! The pipeline runs in three stages. [`join`] attaches services and
//! census blocks to their green areas, [`metrics`] folds the joined tables
//! into one [`radiografia_analytics_models::ParkMetrics`] row per park and
//! [`ranking`] scores those rows. A [`Report`] holds the result of all three
//! for one dataset snapshot and answers the dashboard queries from it.

pub mod join;
pub mod metrics;
pub mod ranking;
pub mod report;

use radiografia_park_models::GreenAreaId;
use thiserror::Error;

pub use join::{CensusParkTable, ServiceParkTable, join_census_to_parks, join_services_to_parks};
pub use metrics::aggregate_metrics;
pub use report::Report;

/// Errors raised by the join step.
#[derive(Debug, Error)]
pub enum JoinError {
    /// The green area side of a join carries the same id twice.
    #[error("Green area id {green_area_id} is not unique on the park side of the join")]
    NonUniqueKey {
        /// Repeated id.
        green_area_id: GreenAreaId,
    },
}

/// Caller errors raised by a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The metric name is not a [`radiografia_analytics_models::ParkMetric`].
    #[error("Unknown metric '{name}', expected one of: {expected}")]
    UnknownMetric {
        /// Requested name.
        name: String,
        /// Accepted names.
        expected: String,
    },

    /// No green area has this id.
    #[error("Unknown green area id {green_area_id}")]
    UnknownPark {
        /// Requested id.
        green_area_id: GreenAreaId,
    },

    /// No green area has this display name.
    #[error("Unknown park name '{name}'")]
    UnknownParkName {
        /// Requested name.
        name: String,
    },

    /// The field name is not a [`radiografia_analytics_models::BlockMetric`].
    #[error("Unknown block field '{name}', expected one of: {expected}")]
    UnknownBlockMetric {
        /// Requested name.
        name: String,
        /// Accepted names.
        expected: String,
    },
}

/// Errors that can occur while building or querying a [`Report`].
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Join failed.
    #[error(transparent)]
    Join(#[from] JoinError),

    /// Query was rejected.
    #[error(transparent)]
    Query(#[from] QueryError),
}
