//! Nearby service (DENUE business) loading.

use std::collections::BTreeSet;

use radiografia_park_models::ServiceRecord;

use crate::DataLoadError;
use crate::coerce::{Coercion, parse_green_area_id};
use crate::config::ServiceColumns;
use crate::table::{CsvTable, cell};

/// Parses service records from CSV text, in file order.
///
/// A blank or placeholder green area reference yields a record with no
/// park. Reference validation against the green area table happens when
/// the [`crate::Dataset`] is assembled.
///
/// # Errors
///
/// * [`DataLoadError::Csv`] if the text is not valid CSV
/// * [`DataLoadError::MissingColumn`] if a configured column is absent
/// * [`DataLoadError::InvalidKey`] on an empty record id or a green area
///   reference that is neither blank nor an integer
/// * [`DataLoadError::DuplicateKey`] if two records share an id
pub fn parse_services(
    label: &str,
    text: &str,
    columns: &ServiceColumns,
    coercion: &mut Coercion<'_>,
) -> Result<Vec<ServiceRecord>, DataLoadError> {
    let table = CsvTable::parse(label, text)?;

    let id_col = table.require(&columns.id)?;
    let park_col = table.require(&columns.green_area_id)?;
    let distance_col = table.require(&columns.distance)?;
    let lat_col = table.require(&columns.lat)?;
    let lon_col = table.require(&columns.lon)?;
    let code_col = table.require(&columns.activity_code)?;
    let name_col = table.require(&columns.activity_name)?;
    let category_col = table.require(&columns.category)?;

    let mut seen = BTreeSet::new();
    let mut services = Vec::with_capacity(table.records().len());

    for (i, record) in table.records().iter().enumerate() {
        let service_id = cell(record, id_col).trim().to_string();
        if service_id.is_empty() {
            return Err(DataLoadError::InvalidKey {
                path: table.label().to_string(),
                row: i + 1,
                column: columns.id.clone(),
                value: service_id,
            });
        }
        if !seen.insert(service_id.clone()) {
            return Err(DataLoadError::DuplicateKey {
                path: table.label().to_string(),
                key: service_id,
            });
        }

        let raw_park = cell(record, park_col);
        let green_area_id = if raw_park.trim().is_empty() || coercion.is_placeholder(raw_park) {
            None
        } else {
            Some(
                parse_green_area_id(raw_park).ok_or_else(|| DataLoadError::InvalidKey {
                    path: table.label().to_string(),
                    row: i + 1,
                    column: columns.green_area_id.clone(),
                    value: raw_park.to_string(),
                })?,
            )
        };

        services.push(ServiceRecord {
            green_area_id,
            activity_code: cell(record, code_col).trim().to_string(),
            activity_name: cell(record, name_col).trim().to_string(),
            category: cell(record, category_col).trim().to_string(),
            distance_m: coercion
                .measure(&service_id, &columns.distance, cell(record, distance_col))
                .value,
            lat: coercion
                .coordinate(&service_id, &columns.lat, cell(record, lat_col))
                .value,
            lon: coercion
                .coordinate(&service_id, &columns.lon, cell(record, lon_col))
                .value,
            service_id,
        });
    }

    log::info!("[{label}] loaded {} service records", services.len());
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radiografia_park_models::{DataQualityWarning, SourceTable};

    const HEADER: &str = "id,av_union,distancia,latitud,longitud,codigo_act,nombre_act,CATEGORIA\n";

    fn parse(body: &str) -> (Result<Vec<ServiceRecord>, DataLoadError>, Vec<DataQualityWarning>) {
        let placeholders = vec!["*".to_string(), String::new()];
        let mut warnings = Vec::new();
        let text = format!("{HEADER}{body}");
        let result = {
            let mut coercion = Coercion::new(SourceTable::Services, &placeholders, &mut warnings);
            parse_services("denue.csv", &text, &ServiceColumns::default(), &mut coercion)
        };
        (result, warnings)
    }

    #[test]
    fn parses_rows_in_file_order() {
        let (result, warnings) = parse(
            "10,5,120.5,25.67,-100.40,461110,Tiendas de abarrotes,Comercio\n\
             11,5.0,80,25.68,-100.41,722511,Restaurantes,Alimentos\n",
        );
        let services = result.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].service_id, "10");
        assert_eq!(services[1].green_area_id, Some(5));
        assert_eq!(services[0].activity_name, "Tiendas de abarrotes");
        assert!((services[0].distance_m - 120.5).abs() < f64::EPSILON);
        assert!((services[1].lon + 100.41).abs() < 1e-9);
    }

    #[test]
    fn blank_park_reference_is_kept_as_none() {
        let (result, _) = parse("10,,50,25.6,-100.4,1,x,y\n");
        let services = result.unwrap();
        assert_eq!(services[0].green_area_id, None);
    }

    #[test]
    fn placeholder_distance_is_coerced() {
        let (result, warnings) = parse("10,5,*,25.6,-100.4,1,x,y\n");
        assert!(result.unwrap()[0].distance_m.abs() < f64::EPSILON);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn garbage_park_reference_is_fatal() {
        let (result, _) = parse("10,parque,50,25.6,-100.4,1,x,y\n");
        assert!(matches!(result, Err(DataLoadError::InvalidKey { row: 1, .. })));
    }

    #[test]
    fn duplicate_ids_are_fatal() {
        let (result, _) = parse("10,5,1,1,1,1,x,y\n10,6,1,1,1,1,x,y\n");
        assert!(matches!(result, Err(DataLoadError::DuplicateKey { .. })));
    }

    #[test]
    fn missing_column_is_fatal() {
        let placeholders = vec![];
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Services, &placeholders, &mut warnings);
        let err = parse_services("denue.csv", "id,av_union\n1,2\n", &ServiceColumns::default(), &mut coercion)
            .unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "distancia"));
    }
}
