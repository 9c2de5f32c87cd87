#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Green area, nearby service and census block types.
//!
//! These are the typed rows produced by the dataset loader. Every table
//! shares the green area union id ([`GreenAreaId`]) as its join key; the
//! park display name is only ever a presentation label.

pub mod age;
pub mod quality;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

pub use age::{AgeBand, AgeBandCounts, BandBreakdown, Sex};
pub use quality::{DataQualityWarning, SourceTable};

/// Union id of a green area (`UNION` / `av_union` in the source files).
pub type GreenAreaId = i64;

/// A WGS84 longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LonLat {
    /// Creates a new point.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<geo::Point<f64>> for LonLat {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.x(), point.y())
    }
}

/// A green area polygon as loaded from the geometry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenArea {
    /// Union id, unique across the green area table.
    pub id: GreenAreaId,
    /// Display name. Several ids may share a name when a park is split
    /// into multiple polygons.
    pub name: String,
    /// Polygon area in square meters.
    pub area_m2: f64,
    /// Typology label (`TIPOLOGIA`).
    pub typology: String,
    /// Polygon geometry, if the feature carried one.
    #[serde(skip)]
    pub geometry: Option<MultiPolygon<f64>>,
    /// Centroid of [`Self::geometry`].
    pub centroid: Option<LonLat>,
}

/// A business or service located near a green area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// Unique record id.
    pub service_id: String,
    /// Associated green area. `None` when the source left it blank or it
    /// referenced a green area that does not exist.
    pub green_area_id: Option<GreenAreaId>,
    /// Activity code (`codigo_act`).
    pub activity_code: String,
    /// Activity description (`nombre_act`).
    pub activity_name: String,
    /// Service category (`CATEGORIA`).
    pub category: String,
    /// Distance from the park boundary in meters.
    pub distance_m: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// A census block (INEGI AGEB/manzana) associated with a green area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusBlock {
    /// Block geostatistical key (`CVEGEO`).
    pub block_id: String,
    /// Associated green area.
    pub green_area_id: Option<GreenAreaId>,
    /// Total population (`POBTOT`).
    pub population: u64,
    /// Female population (`POBFEM`).
    pub population_female: u64,
    /// Male population (`POBMAS`).
    pub population_male: u64,
    /// Inhabited housing units (`VIVTOT`).
    pub housing_units: u64,
    /// Explicit female age bands.
    pub female_bands: AgeBandCounts,
    /// Explicit male age bands.
    pub male_bands: AgeBandCounts,
    /// Block area in square meters.
    pub block_area_m2: f64,
    /// Distance from the block to its green area, when the source has it.
    pub distance_m: Option<f64>,
    /// Columns whose value was a placeholder and got coerced to zero.
    pub imputed_columns: Vec<String>,
}

/// Persons per square meter, `None` when there is no area.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn population_density(population: u64, area_m2: f64) -> Option<f64> {
    (area_m2 > 0.0).then(|| population as f64 / area_m2)
}

/// Census rows that carry a population and explicit age bands per sex.
pub trait SexSplit {
    /// Population of one sex.
    fn population_of(&self, sex: Sex) -> u64;

    /// Explicit age bands of one sex.
    fn bands_of(&self, sex: Sex) -> &AgeBandCounts;

    /// Full age breakdown of one sex, residual band included.
    #[must_use]
    fn breakdown(&self, sex: Sex) -> BandBreakdown {
        self.bands_of(sex).with_residual(self.population_of(sex))
    }
}

impl SexSplit for CensusBlock {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn block(population: u64, area: f64) -> CensusBlock {
        CensusBlock {
            block_id: "1901900010".to_string(),
            green_area_id: Some(5),
            population,
            population_female: population / 2,
            population_male: population / 2,
            housing_units: 10,
            female_bands: AgeBandCounts::default(),
            male_bands: AgeBandCounts::default(),
            block_area_m2: area,
            distance_m: None,
            imputed_columns: Vec::new(),
        }
    }

    #[test]
    fn density_divides_by_area() {
        let density = population_density(200, 400.0).unwrap();
        assert!((density - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn density_is_none_without_area() {
        assert!(population_density(200, 0.0).is_none());
        assert!(population_density(0, -1.0).is_none());
    }

    #[test]
    fn breakdown_uses_sex_population() {
        let mut b = block(200, 1.0);
        b.population_female = 100;
        b.female_bands = AgeBandCounts::new([10, 10, 10, 10, 10, 10, 10]);
        let breakdown = b.breakdown(Sex::Female);
        assert_eq!(breakdown.count(AgeBand::From25To59), 30);
        assert_eq!(breakdown.total(), 100);
    }
}
