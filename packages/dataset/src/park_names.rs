//! Park name to geometry lookup.
//!
//! The helper file is a JSON object mapping each display name to a list of
//! `GeoJSON` features. Only the first feature's geometry is used, and only
//! to center the map on a selection; it never takes part in a join.

use std::collections::BTreeMap;

use geo::MultiPolygon;
use geojson::Feature;
use radiografia_park_models::{DataQualityWarning, SourceTable};

use crate::DataLoadError;
use crate::coerce::Coercion;
use crate::green_areas::geometry_to_multipolygon;

/// Parses the name lookup, keeping one geometry per display name.
///
/// Names whose first feature has no usable polygon are left out and
/// flagged with [`DataQualityWarning::MissingGeometry`].
///
/// # Errors
///
/// Returns [`DataLoadError::Json`] if the text is not a JSON object of
/// feature lists.
pub fn parse_park_names(
    label: &str,
    text: &str,
    coercion: &mut Coercion<'_>,
) -> Result<BTreeMap<String, MultiPolygon<f64>>, DataLoadError> {
    let raw: BTreeMap<String, Vec<serde_json::Value>> =
        serde_json::from_str(text).map_err(|source| DataLoadError::Json {
            path: label.to_string(),
            source,
        })?;

    let mut lookup = BTreeMap::new();

    for (name, features) in raw {
        let geometry = match features.into_iter().next() {
            Some(value) => {
                let feature: Feature =
                    serde_json::from_value(value).map_err(|source| DataLoadError::Json {
                        path: label.to_string(),
                        source,
                    })?;
                feature.geometry.and_then(geometry_to_multipolygon)
            }
            None => None,
        };

        match geometry {
            Some(geometry) => {
                lookup.insert(name, geometry);
            }
            None => coercion.flag(DataQualityWarning::MissingGeometry {
                table: SourceTable::ParkNames,
                row: name,
            }),
        }
    }

    log::info!("[{label}] loaded {} park name geometries", lookup.len());
    Ok(lookup)
}
