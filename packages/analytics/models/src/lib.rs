#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types of the park analytics pipeline.
//!
//! Defines the denormalized rows produced by the join step, the derived
//! per-park metrics, and the shapes returned by each query the dashboard
//! issues. Metric and block field names are parsed from strings with
//! `strum`, so an unrecognized name can be rejected before any work is
//! done.

use radiografia_park_models::{
    AgeBand, AgeBandCounts, BandBreakdown, GreenAreaId, LonLat, Sex, SexSplit, population_density,
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Presentation label of a green area carried on joined rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkLabel {
    /// Union id.
    pub green_area_id: GreenAreaId,
    /// Display name.
    pub name: String,
    /// Typology label.
    pub typology: String,
    /// Polygon area in square meters.
    pub area_m2: f64,
}

/// One service joined to its green area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceParkRow {
    /// Union id of the green area.
    pub green_area_id: GreenAreaId,
    /// Display name of the green area.
    pub park_name: String,
    /// Typology of the green area.
    pub typology: String,
    /// Area of the green area in square meters.
    pub area_m2: f64,
    /// Service record id.
    pub service_id: String,
    /// Activity code.
    pub activity_code: String,
    /// Activity description.
    pub activity_name: String,
    /// Service category.
    pub category: String,
    /// Distance from the park boundary in meters.
    pub distance_m: f64,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// One census block joined to its green area (if any).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusParkRow {
    /// Block key.
    pub block_id: String,
    /// Green area the block is attributed to.
    pub green_area_id: Option<GreenAreaId>,
    /// Label of the green area, `None` when the block has no park.
    pub park: Option<ParkLabel>,
    /// Total population.
    pub population: u64,
    /// Female population.
    pub population_female: u64,
    /// Male population.
    pub population_male: u64,
    /// Housing units.
    pub housing_units: u64,
    /// Block area in square meters.
    pub block_area_m2: f64,
    /// Distance from the block to the park, when known.
    pub distance_m: Option<f64>,
    /// Explicit female age bands.
    pub female_bands: AgeBandCounts,
    /// Explicit male age bands.
    pub male_bands: AgeBandCounts,
    /// Number of numeric cells coerced from placeholders.
    pub imputed_values: u64,
}

impl SexSplit for CensusParkRow {
    fn population_of(&self, sex: Sex) -> u64 {
        match sex {
            Sex::Female => self.population_female,
            Sex::Male => self.population_male,
        }
    }

    fn bands_of(&self, sex: Sex) -> &AgeBandCounts {
        match sex {
            Sex::Female => &self.female_bands,
            Sex::Male => &self.male_bands,
        }
    }
}

impl CensusParkRow {
    /// Persons per square meter of block area.
    #[must_use]
    pub fn population_density(&self) -> Option<f64> {
        population_density(self.population, self.block_area_m2)
    }
}

/// Census totals of one green area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkCensus {
    /// Union id.
    pub green_area_id: GreenAreaId,
    /// Number of census blocks attributed to the park.
    pub block_count: u64,
    /// Sum of block populations.
    pub population_total: u64,
    /// Sum of female populations.
    pub population_female_total: u64,
    /// Sum of male populations.
    pub population_male_total: u64,
    /// Sum of housing units.
    pub housing_units_total: u64,
    /// Sum of block areas in square meters.
    pub block_area_total: f64,
    /// `population_total / block_area_total`, `None` when the area is zero.
    pub population_density: Option<f64>,
    /// Number of numeric cells coerced from placeholders.
    pub imputed_values: u64,
}

/// Derived metrics of one green area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkMetrics {
    /// Union id.
    pub green_area_id: GreenAreaId,
    /// Display name.
    pub name: String,
    /// Typology label.
    pub typology: String,
    /// Polygon area in square meters.
    pub area_m2: f64,
    /// Number of joined services.
    pub service_count: u64,
    /// Mean service distance in meters, `None` without services.
    pub mean_service_distance: Option<f64>,
    /// Census totals, zeroed when the park has no blocks.
    pub population_total: u64,
    /// Female population total.
    pub population_female_total: u64,
    /// Male population total.
    pub population_male_total: u64,
    /// Housing units total.
    pub housing_units_total: u64,
    /// Number of census blocks.
    pub block_count: u64,
    /// Total block area in square meters.
    pub block_area_total: f64,
    /// Persons per square meter, `None` when there is no block area.
    pub population_density: Option<f64>,
    /// Composite ranking score (see [`RankingWeights`]).
    pub ranking_score: f64,
    /// Number of census cells coerced from placeholders.
    pub imputed_values: u64,
}

/// Per-park metric fields that can be ranked or mapped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParkMetric {
    /// [`ParkMetrics::service_count`].
    ServiceCount,
    /// [`ParkMetrics::mean_service_distance`].
    MeanServiceDistance,
    /// [`ParkMetrics::population_total`].
    PopulationTotal,
    /// [`ParkMetrics::housing_units_total`].
    HousingUnitsTotal,
    /// [`ParkMetrics::population_density`].
    PopulationDensity,
    /// [`ParkMetrics::ranking_score`].
    RankingScore,
    /// [`ParkMetrics::area_m2`].
    #[serde(rename = "area_m2")]
    #[strum(serialize = "area_m2")]
    AreaM2,
}

impl ParkMetric {
    /// Every metric name, comma separated.
    #[must_use]
    pub fn names() -> String {
        Self::iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
    }

    /// Reads this metric from a metrics row. `None` means the metric is
    /// undefined for the park.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, metrics: &ParkMetrics) -> Option<f64> {
        match self {
            Self::ServiceCount => Some(metrics.service_count as f64),
            Self::MeanServiceDistance => metrics.mean_service_distance,
            Self::PopulationTotal => Some(metrics.population_total as f64),
            Self::HousingUnitsTotal => Some(metrics.housing_units_total as f64),
            Self::PopulationDensity => metrics.population_density,
            Self::RankingScore => Some(metrics.ranking_score),
            Self::AreaM2 => Some(metrics.area_m2),
        }
    }
}

/// Block-level fields for the per-park choropleth.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlockMetric {
    /// Total population.
    Population,
    /// Female population.
    PopulationFemale,
    /// Male population.
    PopulationMale,
    /// Housing units.
    HousingUnits,
    /// Block area.
    #[serde(rename = "block_area_m2")]
    #[strum(serialize = "block_area_m2")]
    BlockAreaM2,
    /// Distance from the block to its park.
    DistanceM,
    /// Persons per square meter of block area.
    PopulationDensity,
}

impl BlockMetric {
    /// Every block field name, comma separated.
    #[must_use]
    pub fn names() -> String {
        Self::iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
    }

    /// Reads this field from a joined census row.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, row: &CensusParkRow) -> Option<f64> {
        match self {
            Self::Population => Some(row.population as f64),
            Self::PopulationFemale => Some(row.population_female as f64),
            Self::PopulationMale => Some(row.population_male as f64),
            Self::HousingUnits => Some(row.housing_units as f64),
            Self::BlockAreaM2 => Some(row.block_area_m2),
            Self::DistanceM => row.distance_m,
            Self::PopulationDensity => row.population_density(),
        }
    }
}

/// One block's value of a [`BlockMetric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetricValue {
    /// Block key.
    pub block_id: String,
    /// Field value, `None` when undefined.
    pub value: Option<f64>,
}

/// One park's value of a [`ParkMetric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkMetricValue {
    /// Union id.
    pub green_area_id: GreenAreaId,
    /// Display name.
    pub name: String,
    /// Metric value, `None` when undefined.
    pub value: Option<f64>,
}

/// Population of one age band split by sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeSexBin {
    /// Age band.
    pub band: AgeBand,
    /// Female count.
    pub female: u64,
    /// Male count.
    pub male: u64,
}

/// Age pyramid for one park or the whole sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeSexHistogram {
    /// Park the histogram is restricted to, `None` for sector totals.
    pub green_area_id: Option<GreenAreaId>,
    /// One bin per age band, youngest first.
    pub bins: Vec<AgeSexBin>,
}

impl AgeSexHistogram {
    /// Builds a histogram from per-sex breakdowns.
    #[must_use]
    pub fn from_breakdowns(
        green_area_id: Option<GreenAreaId>,
        female: &BandBreakdown,
        male: &BandBreakdown,
    ) -> Self {
        let bins = AgeBand::ALL
            .iter()
            .map(|&band| AgeSexBin {
                band,
                female: female.count(band),
                male: male.count(band),
            })
            .collect();
        Self {
            green_area_id,
            bins,
        }
    }

    /// Sum over all bins and both sexes.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins
            .iter()
            .fold(0, |acc: u64, b| acc.saturating_add(b.female).saturating_add(b.male))
    }

    /// Bin for a band.
    #[must_use]
    pub fn bin(&self, band: AgeBand) -> Option<&AgeSexBin> {
        self.bins.iter().find(|b| b.band == band)
    }
}

/// How a [`MapCenter`] was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterSource {
    /// Centroid of the name lookup helper geometry.
    NameLookup,
    /// Centroid of the green area polygons sharing the name.
    ParkPolygons,
    /// Configured sector default.
    SectorDefault,
}

/// Map center for a park selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapCenter {
    /// Selected display name.
    pub name: String,
    /// Center point.
    pub center: LonLat,
    /// Where the point came from.
    pub source: CenterSource,
}

/// Ordinal code of a typology label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypologyCode {
    /// Typology label.
    pub typology: String,
    /// Zero-based code in order of first appearance.
    pub code: u32,
}

/// Weights of the composite ranking score.
///
/// Each component is min-max normalized across all parks before being
/// weighted, so weights are unitless. Weights must be non-negative to
/// keep the score monotonic increasing in every component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    /// Weight of the service count.
    pub service_count: f64,
    /// Weight of the population total.
    pub population_total: f64,
    /// Weight of the housing units total.
    pub housing_units_total: f64,
    /// Weight of the population density.
    pub population_density: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            service_count: 1.0,
            population_total: 1.0,
            housing_units_total: 1.0,
            population_density: 1.0,
        }
    }
}

impl RankingWeights {
    /// Returns the name of the first negative or non-finite weight.
    #[must_use]
    pub fn invalid_weight(&self) -> Option<&'static str> {
        [
            ("service_count", self.service_count),
            ("population_total", self.population_total),
            ("housing_units_total", self.housing_units_total),
            ("population_density", self.population_density),
        ]
        .into_iter()
        .find(|(_, w)| !w.is_finite() || *w < 0.0)
        .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn metric_names_parse() {
        assert_eq!(
            ParkMetric::from_str("ranking_score").unwrap(),
            ParkMetric::RankingScore
        );
        assert_eq!(ParkMetric::AreaM2.to_string(), "area_m2");
        assert!(ParkMetric::from_str("not_a_field").is_err());
    }

    #[test]
    fn names_list_every_variant() {
        let names = ParkMetric::names();
        assert!(names.starts_with("service_count, mean_service_distance"));
        assert!(names.ends_with("ranking_score, area_m2"));
        assert!(BlockMetric::names().contains("block_area_m2"));
    }

    #[test]
    fn block_metric_names_parse() {
        assert_eq!(
            BlockMetric::from_str("population_density").unwrap(),
            BlockMetric::PopulationDensity
        );
        assert_eq!(BlockMetric::DistanceM.as_ref(), "distance_m");
    }

    #[test]
    fn negative_weight_is_invalid() {
        let weights = RankingWeights {
            housing_units_total: -1.0,
            ..RankingWeights::default()
        };
        assert_eq!(weights.invalid_weight(), Some("housing_units_total"));
        assert_eq!(RankingWeights::default().invalid_weight(), None);
    }

    #[test]
    fn row_breakdown_and_density() {
        let row = CensusParkRow {
            block_id: "b1".to_string(),
            green_area_id: Some(5),
            park: None,
            population: 150,
            population_female: 100,
            population_male: 50,
            housing_units: 10,
            block_area_m2: 300.0,
            distance_m: None,
            female_bands: AgeBandCounts::new([10, 10, 10, 10, 10, 10, 10]),
            male_bands: AgeBandCounts::default(),
            imputed_values: 0,
        };
        assert_eq!(row.breakdown(Sex::Female).count(AgeBand::From25To59), 30);
        assert_eq!(row.breakdown(Sex::Male).count(AgeBand::From25To59), 50);
        assert!((row.population_density().unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn histogram_has_one_bin_per_band() {
        let female = AgeBandCounts::new([10, 10, 10, 10, 10, 10, 10]).with_residual(100);
        let male = AgeBandCounts::new([5, 5, 5, 5, 5, 5, 5]).with_residual(50);
        let histogram = AgeSexHistogram::from_breakdowns(Some(5), &female, &male);
        assert_eq!(histogram.bins.len(), 8);
        assert_eq!(histogram.total(), 150);
        let residual = histogram.bin(AgeBand::From25To59).unwrap();
        assert_eq!((residual.female, residual.male), (30, 15));
    }
}
