//! The immutable [`Dataset`] snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use geo::MultiPolygon;
use radiografia_analytics_models::RankingWeights;
use radiografia_park_models::{
    CensusBlock, DataQualityWarning, GreenArea, GreenAreaId, LonLat, ServiceRecord, SourceTable,
};
use serde::{Deserialize, Serialize};

use crate::DataLoadError;
use crate::census::parse_census;
use crate::coerce::Coercion;
use crate::config::DatasetConfig;
use crate::green_areas::parse_green_areas;
use crate::park_names::parse_park_names;
use crate::services::parse_services;

/// Raw text of one source together with the label used in messages.
#[derive(Debug, Clone, Copy)]
pub struct SourceText<'a> {
    /// Path or name of the source.
    pub label: &'a str,
    /// Full file contents.
    pub contents: &'a str,
}

impl<'a> SourceText<'a> {
    /// Creates a labelled source.
    #[must_use]
    pub const fn new(label: &'a str, contents: &'a str) -> Self {
        Self { label, contents }
    }
}

/// The four source texts a [`Dataset`] is built from.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSources<'a> {
    /// Green area `FeatureCollection`.
    pub green_areas: SourceText<'a>,
    /// Services CSV.
    pub services: SourceText<'a>,
    /// Census CSV.
    pub census: SourceText<'a>,
    /// Park name lookup JSON, if available.
    pub park_names: Option<SourceText<'a>>,
}

/// Row counts of a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    /// Green area rows.
    pub green_areas: usize,
    /// Service rows.
    pub services: usize,
    /// Services without a green area.
    pub unmatched_services: usize,
    /// Census block rows.
    pub census_blocks: usize,
    /// Census blocks without a green area.
    pub unmatched_census_blocks: usize,
    /// Park names with a lookup geometry.
    pub park_names: usize,
    /// Data quality warnings raised while loading.
    pub warnings: usize,
}

/// All source tables, typed and indexed, read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    parks: Vec<GreenArea>,
    park_index: BTreeMap<GreenAreaId, usize>,
    services: Vec<ServiceRecord>,
    census: Vec<CensusBlock>,
    park_names: BTreeMap<String, MultiPolygon<f64>>,
    ranking: RankingWeights,
    default_center: LonLat,
    warnings: Vec<DataQualityWarning>,
}

impl Dataset {
    /// Reads the configured source files from `data_dir`.
    ///
    /// # Errors
    ///
    /// * [`DataLoadError::MissingFile`] if a source file does not exist
    /// * [`DataLoadError::Io`] if a source file cannot be read
    /// * any error of [`Self::from_sources`]
    pub fn load(config: &DatasetConfig, data_dir: &Path) -> Result<Self, DataLoadError> {
        config.validate()?;

        let green_areas_path = data_dir.join(&config.files.green_areas);
        let services_path = data_dir.join(&config.files.services);
        let census_path = data_dir.join(&config.files.census);
        let park_names_path = data_dir.join(&config.files.park_names);

        let green_areas = read_source(&green_areas_path)?;
        let services = read_source(&services_path)?;
        let census = read_source(&census_path)?;
        let park_names = read_source(&park_names_path)?;

        let green_areas_label = green_areas_path.display().to_string();
        let services_label = services_path.display().to_string();
        let census_label = census_path.display().to_string();
        let park_names_label = park_names_path.display().to_string();

        log::info!("Loading dataset from {}", data_dir.display());

        Self::from_sources(
            config,
            DatasetSources {
                green_areas: SourceText::new(&green_areas_label, &green_areas),
                services: SourceText::new(&services_label, &services),
                census: SourceText::new(&census_label, &census),
                park_names: Some(SourceText::new(&park_names_label, &park_names)),
            },
        )
    }

    /// Builds a dataset from in-memory source texts.
    ///
    /// Foreign keys that reference a missing green area are cleared and
    /// recorded as [`DataQualityWarning::DanglingReference`]; the row is
    /// kept.
    ///
    /// # Errors
    ///
    /// * [`DataLoadError::Config`] if the configuration is invalid
    /// * any parse error of the individual sources
    pub fn from_sources(
        config: &DatasetConfig,
        sources: DatasetSources<'_>,
    ) -> Result<Self, DataLoadError> {
        config.validate()?;

        let placeholders = &config.coercion.placeholders;
        let mut warnings = Vec::new();

        let parks = parse_green_areas(
            sources.green_areas.label,
            sources.green_areas.contents,
            &config.green_area_columns,
            &mut Coercion::new(SourceTable::GreenAreas, placeholders, &mut warnings),
        )?;
        let mut services = parse_services(
            sources.services.label,
            sources.services.contents,
            &config.service_columns,
            &mut Coercion::new(SourceTable::Services, placeholders, &mut warnings),
        )?;
        let mut census = parse_census(
            sources.census.label,
            sources.census.contents,
            &config.census_columns,
            &mut Coercion::new(SourceTable::Census, placeholders, &mut warnings),
        )?;
        let park_names = match sources.park_names {
            Some(source) => parse_park_names(
                source.label,
                source.contents,
                &mut Coercion::new(SourceTable::ParkNames, placeholders, &mut warnings),
            )?,
            None => BTreeMap::new(),
        };

        let park_index: BTreeMap<GreenAreaId, usize> =
            parks.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

        {
            let mut coercion = Coercion::new(SourceTable::Services, placeholders, &mut warnings);
            for service in &mut services {
                clear_dangling(
                    &park_index,
                    &mut service.green_area_id,
                    SourceTable::Services,
                    &service.service_id,
                    &mut coercion,
                );
            }
        }
        {
            let mut coercion = Coercion::new(SourceTable::Census, placeholders, &mut warnings);
            for block in &mut census {
                clear_dangling(
                    &park_index,
                    &mut block.green_area_id,
                    SourceTable::Census,
                    &block.block_id,
                    &mut coercion,
                );
            }
        }

        let dataset = Self {
            parks,
            park_index,
            services,
            census,
            park_names,
            ranking: config.ranking,
            default_center: config.map.default_center,
            warnings,
        };

        let summary = dataset.summary();
        log::info!(
            "Dataset ready: {} green areas, {} services ({} unmatched), {} census blocks ({} unmatched), {} data quality warnings",
            summary.green_areas,
            summary.services,
            summary.unmatched_services,
            summary.census_blocks,
            summary.unmatched_census_blocks,
            summary.warnings,
        );

        Ok(dataset)
    }

    /// Green areas, sorted by id.
    #[must_use]
    pub fn parks(&self) -> &[GreenArea] {
        &self.parks
    }

    /// Looks up a green area by id.
    #[must_use]
    pub fn park(&self, id: GreenAreaId) -> Option<&GreenArea> {
        self.park_index.get(&id).map(|&i| &self.parks[i])
    }

    /// Service records, in file order.
    #[must_use]
    pub fn services(&self) -> &[ServiceRecord] {
        &self.services
    }

    /// Census blocks, in file order.
    #[must_use]
    pub fn census(&self) -> &[CensusBlock] {
        &self.census
    }

    /// Lookup geometry for a display name.
    #[must_use]
    pub fn park_name_geometry(&self, name: &str) -> Option<&MultiPolygon<f64>> {
        self.park_names.get(name)
    }

    /// Configured ranking weights.
    #[must_use]
    pub const fn ranking_weights(&self) -> &RankingWeights {
        &self.ranking
    }

    /// Configured sector center.
    #[must_use]
    pub const fn default_center(&self) -> LonLat {
        self.default_center
    }

    /// Data quality warnings raised while loading, in the order raised.
    #[must_use]
    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }

    /// Row counts for the load report.
    #[must_use]
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            green_areas: self.parks.len(),
            services: self.services.len(),
            unmatched_services: self
                .services
                .iter()
                .filter(|s| s.green_area_id.is_none())
                .count(),
            census_blocks: self.census.len(),
            unmatched_census_blocks: self
                .census
                .iter()
                .filter(|b| b.green_area_id.is_none())
                .count(),
            park_names: self.park_names.len(),
            warnings: self.warnings.len(),
        }
    }
}

fn read_source(path: &Path) -> Result<String, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::MissingFile {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn clear_dangling(
    park_index: &BTreeMap<GreenAreaId, usize>,
    green_area_id: &mut Option<GreenAreaId>,
    table: SourceTable,
    row: &str,
    coercion: &mut Coercion<'_>,
) {
    let Some(id) = *green_area_id else {
        return;
    };
    if !park_index.contains_key(&id) {
        coercion.flag(DataQualityWarning::DanglingReference {
            table,
            row: row.to_string(),
            green_area_id: id,
        });
        *green_area_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    #[test]
    fn loads_fixture_sources() {
        let dataset = Dataset::load(&DatasetConfig::default(), &fixtures()).unwrap();
        let summary = dataset.summary();
        assert_eq!(summary.green_areas, 5);
        assert_eq!(summary.services, 8);
        assert_eq!(summary.unmatched_services, 2);
        assert_eq!(summary.census_blocks, 6);
        assert_eq!(summary.unmatched_census_blocks, 1);
        assert_eq!(summary.park_names, 2);
        assert_eq!(
            dataset.parks().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(dataset.park(3).unwrap().name, "Plaza Fátima");
        assert!(dataset.park(99).is_none());
    }

    #[test]
    fn fixture_warnings_are_recorded_not_fatal() {
        let dataset = Dataset::load(&DatasetConfig::default(), &fixtures()).unwrap();
        let warnings = dataset.warnings();
        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert!(warnings.iter().any(|w| matches!(
            w,
            DataQualityWarning::PlaceholderValue { column, .. } if column == "VIVTOT"
        )));
        assert!(warnings.iter().any(|w| matches!(
            w,
            DataQualityWarning::DanglingReference { green_area_id: 99, .. }
        )));
        assert!(warnings.iter().any(|w| matches!(
            w,
            DataQualityWarning::MissingGeometry { table: SourceTable::ParkNames, .. }
        )));
    }

    #[test]
    fn dangling_reference_is_cleared_but_row_kept() {
        let dataset = Dataset::load(&DatasetConfig::default(), &fixtures()).unwrap();
        let service = dataset
            .services()
            .iter()
            .find(|s| s.service_id == "6412908")
            .unwrap();
        assert_eq!(service.green_area_id, None);
    }

    #[test]
    fn loading_twice_is_identical() {
        let first = Dataset::load(&DatasetConfig::default(), &fixtures()).unwrap();
        let second = Dataset::load(&DatasetConfig::default(), &fixtures()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_is_fatal() {
        let mut config = DatasetConfig::default();
        config.files.census = "does_not_exist.csv".to_string();
        let err = Dataset::load(&config, &fixtures()).unwrap_err();
        assert!(
            matches!(err, DataLoadError::MissingFile { ref path } if path.ends_with("does_not_exist.csv")),
            "got {err}"
        );
    }

    #[test]
    fn builds_from_in_memory_sources() {
        let green_areas = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"UNION":1,"NOMBRE_PARQUE":"A","SHAPE_AREA":10,"TIPOLOGIA":"Plaza"},"geometry":null}
        ]}"#;
        let services = "id,av_union,distancia,latitud,longitud,codigo_act,nombre_act,CATEGORIA\n\
                        s1,1,5,25.6,-100.4,1,x,y\n";
        let census = format!(
            "CVEGEO,av_union,POBTOT,POBFEM,POBMAS,VIVTOT,area,{},{}\n\
             b1,1,0,0,0,0,100,0,0,0,0,0,0,0,0,0,0,0,0,0,0\n",
            DatasetConfig::default().census_columns.female_age_bands.join(","),
            DatasetConfig::default().census_columns.male_age_bands.join(","),
        );
        let dataset = Dataset::from_sources(
            &DatasetConfig::default(),
            DatasetSources {
                green_areas: SourceText::new("av", green_areas),
                services: SourceText::new("denue", services),
                census: SourceText::new("inegi", &census),
                park_names: None,
            },
        )
        .unwrap();
        assert_eq!(dataset.services()[0].green_area_id, Some(1));
        assert_eq!(dataset.census()[0].green_area_id, Some(1));
        assert_eq!(dataset.census()[0].distance_m, None);
        assert_eq!(dataset.warnings().len(), 1);
    }
}
