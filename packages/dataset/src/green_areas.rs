//! Green area polygon loading.
//!
//! Reads the green area `FeatureCollection` into [`GreenArea`] rows, one
//! per feature, keyed by the union id property.

use std::collections::BTreeSet;

use geo::{Centroid as _, MultiPolygon};
use geojson::{Feature, GeoJson};
use radiografia_park_models::{DataQualityWarning, GreenArea, SourceTable};

use crate::DataLoadError;
use crate::coerce::{Coercion, parse_green_area_id};
use crate::config::GreenAreaColumns;

/// Parses green areas from `GeoJSON` text, sorted by id.
///
/// # Errors
///
/// * [`DataLoadError::GeoJson`] if the text is not a `FeatureCollection`
/// * [`DataLoadError::MissingColumn`] if the first feature lacks one of
///   the configured properties
/// * [`DataLoadError::InvalidKey`] if a feature has no parseable id
/// * [`DataLoadError::DuplicateKey`] if two features share an id
pub fn parse_green_areas(
    label: &str,
    text: &str,
    columns: &GreenAreaColumns,
    coercion: &mut Coercion<'_>,
) -> Result<Vec<GreenArea>, DataLoadError> {
    let features = parse_feature_collection(label, text)?;

    if let Some(first) = features.first() {
        for column in [&columns.id, &columns.name, &columns.area, &columns.typology] {
            if !first.contains_property(column) {
                return Err(DataLoadError::MissingColumn {
                    path: label.to_string(),
                    column: column.clone(),
                });
            }
        }
    }

    let mut seen = BTreeSet::new();
    let mut areas = Vec::with_capacity(features.len());

    for (i, feature) in features.into_iter().enumerate() {
        let raw_id = property_text(&feature, &columns.id).unwrap_or_default();
        let id = parse_green_area_id(&raw_id).ok_or_else(|| DataLoadError::InvalidKey {
            path: label.to_string(),
            row: i + 1,
            column: columns.id.clone(),
            value: raw_id.clone(),
        })?;

        if !seen.insert(id) {
            return Err(DataLoadError::DuplicateKey {
                path: label.to_string(),
                key: id.to_string(),
            });
        }

        let row = id.to_string();
        let raw_area = property_text(&feature, &columns.area).unwrap_or_default();
        let area_m2 = coercion.measure(&row, &columns.area, &raw_area).value;

        let geometry = feature.geometry.and_then(geometry_to_multipolygon);
        if geometry.is_none() {
            coercion.flag(DataQualityWarning::MissingGeometry {
                table: SourceTable::GreenAreas,
                row: row.clone(),
            });
        }
        let centroid = geometry.as_ref().and_then(|g| g.centroid()).map(Into::into);

        let mut text_property = |column: &str| {
            let text = property_text_from(feature.properties.as_ref(), column)
                .filter(|t| !t.is_empty());
            if text.is_none() {
                coercion.flag(DataQualityWarning::MissingLabel {
                    table: SourceTable::GreenAreas,
                    row: row.clone(),
                    column: column.to_string(),
                });
            }
            text.unwrap_or_default()
        };
        let name = text_property(columns.name.as_str());
        let typology = text_property(columns.typology.as_str());

        areas.push(GreenArea {
            id,
            name,
            area_m2,
            typology,
            geometry,
            centroid,
        });
    }

    areas.sort_by_key(|a| a.id);
    log::info!("[{label}] loaded {} green areas", areas.len());
    Ok(areas)
}

/// Parses a `FeatureCollection` and returns its features.
fn parse_feature_collection(label: &str, text: &str) -> Result<Vec<Feature>, DataLoadError> {
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| DataLoadError::GeoJson {
        path: label.to_string(),
        message: e.to_string(),
    })?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        _ => Err(DataLoadError::GeoJson {
            path: label.to_string(),
            message: "expected a FeatureCollection".to_string(),
        }),
    }
}

/// Converts a `GeoJSON` geometry to a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn geometry_to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

fn property_text(feature: &Feature, key: &str) -> Option<String> {
    property_text_from(feature.properties.as_ref(), key)
}

/// Reads a property as text. Numbers are rendered, `null` is absent.
fn property_text_from(properties: Option<&geojson::JsonObject>, key: &str) -> Option<String> {
    match properties?.get(key)? {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
