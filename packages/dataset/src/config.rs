//! Loader configuration.
//!
//! Every section falls back to the column conventions of the San Pedro
//! sector K1 extracts, so a TOML override only needs the keys that differ.

use std::path::Path;

use radiografia_analytics_models::RankingWeights;
use radiografia_park_models::{AgeBand, LonLat};
use serde::{Deserialize, Serialize};

use crate::DataLoadError;

/// Complete loader configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Source file names, relative to the data directory.
    pub files: SourceFiles,
    /// Green area `GeoJSON` property names.
    pub green_area_columns: GreenAreaColumns,
    /// Service CSV column names.
    pub service_columns: ServiceColumns,
    /// Census CSV column names.
    pub census_columns: CensusColumns,
    /// Placeholder coercion policy.
    pub coercion: CoercionConfig,
    /// Ranking score weights.
    pub ranking: RankingWeights,
    /// Map defaults.
    pub map: MapConfig,
}

impl DatasetConfig {
    /// Parses a TOML document and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError::Config`] if the document does not parse or
    /// fails validation.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, DataLoadError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| DataLoadError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError::MissingFile`] if the file does not exist,
    /// or any error of [`Self::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self, DataLoadError> {
        if !path.exists() {
            return Err(DataLoadError::MissingFile {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError::Config`] on a negative ranking weight or an
    /// age band column list of the wrong length.
    pub fn validate(&self) -> Result<(), DataLoadError> {
        if let Some(name) = self.ranking.invalid_weight() {
            return Err(DataLoadError::Config {
                message: format!("ranking weight '{name}' must be a non-negative number"),
            });
        }
        for (label, columns) in [
            ("female_age_bands", &self.census_columns.female_age_bands),
            ("male_age_bands", &self.census_columns.male_age_bands),
        ] {
            if columns.len() != AgeBand::EXPLICIT_COUNT {
                return Err(DataLoadError::Config {
                    message: format!(
                        "census_columns.{label} must list {} columns, found {}",
                        AgeBand::EXPLICIT_COUNT,
                        columns.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Source file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    /// Green area polygons (`GeoJSON` `FeatureCollection`).
    pub green_areas: String,
    /// Nearby services (CSV).
    pub services: String,
    /// Census blocks (CSV).
    pub census: String,
    /// Park name to geometry lookup (JSON object).
    pub park_names: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            green_areas: "av_k1.geojson".to_string(),
            services: "denue_ranking.csv".to_string(),
            census: "inegi_av_98.csv".to_string(),
            park_names: "park_names_features.json".to_string(),
        }
    }
}

/// Green area property names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreenAreaColumns {
    /// Union id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Area in square meters.
    pub area: String,
    /// Typology label.
    pub typology: String,
}

impl Default for GreenAreaColumns {
    fn default() -> Self {
        Self {
            id: "UNION".to_string(),
            name: "NOMBRE_PARQUE".to_string(),
            area: "SHAPE_AREA".to_string(),
            typology: "TIPOLOGIA".to_string(),
        }
    }
}

/// Service CSV column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceColumns {
    /// Record id.
    pub id: String,
    /// Green area foreign key.
    pub green_area_id: String,
    /// Distance to the park in meters.
    pub distance: String,
    /// Latitude.
    pub lat: String,
    /// Longitude.
    pub lon: String,
    /// Activity code.
    pub activity_code: String,
    /// Activity description.
    pub activity_name: String,
    /// Category.
    pub category: String,
}

impl Default for ServiceColumns {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            green_area_id: "av_union".to_string(),
            distance: "distancia".to_string(),
            lat: "latitud".to_string(),
            lon: "longitud".to_string(),
            activity_code: "codigo_act".to_string(),
            activity_name: "nombre_act".to_string(),
            category: "CATEGORIA".to_string(),
        }
    }
}

/// Census CSV column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusColumns {
    /// Block key.
    pub block_id: String,
    /// Green area foreign key.
    pub green_area_id: String,
    /// Total population.
    pub population: String,
    /// Female population.
    pub population_female: String,
    /// Male population.
    pub population_male: String,
    /// Housing units.
    pub housing_units: String,
    /// Block area in square meters.
    pub block_area: String,
    /// Optional block-to-park distance column.
    pub distance: String,
    /// Female age band columns in [`AgeBand::EXPLICIT`] order.
    pub female_age_bands: Vec<String>,
    /// Male age band columns in [`AgeBand::EXPLICIT`] order.
    pub male_age_bands: Vec<String>,
}

impl Default for CensusColumns {
    fn default() -> Self {
        let bands = |suffix: &str| {
            [
                "P_0A2", "P_3A5", "P_6A11", "P_12A14", "P_15A17", "P_18A24", "P_60YMAS",
            ]
            .iter()
            .map(|prefix| format!("{prefix}_{suffix}"))
            .collect()
        };
        Self {
            block_id: "CVEGEO".to_string(),
            green_area_id: "av_union".to_string(),
            population: "POBTOT".to_string(),
            population_female: "POBFEM".to_string(),
            population_male: "POBMAS".to_string(),
            housing_units: "VIVTOT".to_string(),
            block_area: "area".to_string(),
            distance: "distancia".to_string(),
            female_age_bands: bands("F"),
            male_age_bands: bands("M"),
        }
    }
}

/// Placeholder coercion policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionConfig {
    /// Cell texts (after trimming) treated as "no value" and coerced to 0.
    pub placeholders: Vec<String>,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            placeholders: ["*", "", "NaN", "nan", "N/D"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Map defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Sector center used when a park name has no geometry.
    pub default_center: LonLat,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: LonLat::new(-100.406_840_106_844_2, 25.673_275_441_075),
        }
    }
}
