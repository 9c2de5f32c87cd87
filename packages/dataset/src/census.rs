//! Census block loading.
//!
//! Each row is one INEGI block already attributed to its nearest green
//! area. Suppressed cells (`*`) are common in small blocks and are coerced
//! to zero; the coerced column names are kept on the block so downstream
//! density and ranking figures can be flagged as partially imputed.

use std::collections::BTreeSet;

use radiografia_park_models::{
    AgeBand, AgeBandCounts, CensusBlock, DataQualityWarning, Sex, SexSplit,
};

use crate::DataLoadError;
use crate::coerce::{Coercion, parse_green_area_id};
use crate::config::CensusColumns;
use crate::table::{CsvTable, cell};

/// Parses census blocks from CSV text, in file order.
///
/// # Errors
///
/// * [`DataLoadError::Csv`] if the text is not valid CSV
/// * [`DataLoadError::MissingColumn`] if a required column is absent (the
///   distance column is optional)
/// * [`DataLoadError::InvalidKey`] on an empty block key or a malformed
///   green area reference
/// * [`DataLoadError::DuplicateKey`] if two rows share a block key
pub fn parse_census(
    label: &str,
    text: &str,
    columns: &CensusColumns,
    coercion: &mut Coercion<'_>,
) -> Result<Vec<CensusBlock>, DataLoadError> {
    let table = CsvTable::parse(label, text)?;

    let block_col = table.require(&columns.block_id)?;
    let park_col = table.require(&columns.green_area_id)?;
    let population_col = table.require(&columns.population)?;
    let female_col = table.require(&columns.population_female)?;
    let male_col = table.require(&columns.population_male)?;
    let housing_col = table.require(&columns.housing_units)?;
    let area_col = table.require(&columns.block_area)?;
    let distance_col = table.optional(&columns.distance);
    let female_band_cols = require_all(&table, &columns.female_age_bands)?;
    let male_band_cols = require_all(&table, &columns.male_age_bands)?;

    let mut seen = BTreeSet::new();
    let mut blocks = Vec::with_capacity(table.records().len());

    for (i, record) in table.records().iter().enumerate() {
        let block_id = cell(record, block_col).trim().to_string();
        if block_id.is_empty() {
            return Err(DataLoadError::InvalidKey {
                path: table.label().to_string(),
                row: i + 1,
                column: columns.block_id.clone(),
                value: block_id,
            });
        }
        if !seen.insert(block_id.clone()) {
            return Err(DataLoadError::DuplicateKey {
                path: table.label().to_string(),
                key: block_id,
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

        let mut imputed_columns = Vec::new();
        let mut count = |column: &str, index: usize| -> u64 {
            let coerced = coercion.count(&block_id, column, cell(record, index));
            if coerced.imputed {
                imputed_columns.push(column.to_string());
            }
            coerced.value
        };

        let population = count(columns.population.as_str(), population_col);
        let population_female = count(columns.population_female.as_str(), female_col);
        let population_male = count(columns.population_male.as_str(), male_col);
        let housing_units = count(columns.housing_units.as_str(), housing_col);
        let female_bands = read_bands(&columns.female_age_bands, &female_band_cols, &mut count);
        let male_bands = read_bands(&columns.male_age_bands, &male_band_cols, &mut count);

        let area = coercion.measure(&block_id, &columns.block_area, cell(record, area_col));
        if area.imputed {
            imputed_columns.push(columns.block_area.clone());
        }
        let distance_m = distance_col.map(|index| {
            coercion
                .measure(&block_id, &columns.distance, cell(record, index))
                .value
        });

        let block = CensusBlock {
            block_id,
            green_area_id,
            population,
            population_female,
            population_male,
            housing_units,
            female_bands,
            male_bands,
            block_area_m2: area.value,
            distance_m,
            imputed_columns,
        };

        for sex in [Sex::Female, Sex::Male] {
            let deficit = block.breakdown(sex).deficit;
            if deficit > 0 {
                coercion.flag(DataQualityWarning::ResidualUnderflow {
                    block_id: block.block_id.clone(),
                    sex,
                    deficit,
                });
            }
        }

        blocks.push(block);
    }

    log::info!("[{label}] loaded {} census blocks", blocks.len());
    Ok(blocks)
}

fn require_all(table: &CsvTable, columns: &[String]) -> Result<Vec<usize>, DataLoadError> {
    columns.iter().map(|c| table.require(c)).collect()
}

fn read_bands(
    names: &[String],
    indexes: &[usize],
    count: &mut impl FnMut(&str, usize) -> u64,
) -> AgeBandCounts {
    let mut bands = [0u64; AgeBand::EXPLICIT_COUNT];
    for ((slot, name), &index) in bands.iter_mut().zip(names).zip(indexes) {
        *slot = count(name.as_str(), index);
    }
    AgeBandCounts::new(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radiografia_park_models::SourceTable;

    fn header() -> String {
        let columns = CensusColumns::default();
        let mut header = vec![
            "CVEGEO", "av_union", "POBTOT", "POBFEM", "POBMAS", "VIVTOT", "area", "distancia",
        ]
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
        header.extend(columns.female_age_bands);
        header.extend(columns.male_age_bands);
        header.join(",")
    }

    fn parse(rows: &[&str]) -> (Result<Vec<CensusBlock>, DataLoadError>, Vec<DataQualityWarning>) {
        let placeholders = vec!["*".to_string(), String::new()];
        let mut warnings = Vec::new();
        let text = format!("{}\n{}\n", header(), rows.join("\n"));
        let result = {
            let mut coercion = Coercion::new(SourceTable::Census, &placeholders, &mut warnings);
            parse_census("inegi.csv", &text, &CensusColumns::default(), &mut coercion)
        };
        (result, warnings)
    }

    #[test]
    fn parses_counts_and_bands() {
        let (result, warnings) = parse(&[
            "1901900010001,5,200,100,100,60,4000,120,10,10,10,10,10,10,10,10,10,10,10,10,10,10",
        ]);
        let blocks = result.unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");
        let block = &blocks[0];
        assert_eq!(block.green_area_id, Some(5));
        assert_eq!(block.population, 200);
        assert_eq!(block.housing_units, 60);
        assert_eq!(block.female_bands.explicit_total(), 70);
        assert_eq!(block.breakdown(Sex::Female).count(AgeBand::From25To59), 30);
        assert_eq!(block.distance_m, Some(120.0));
        assert!(block.imputed_columns.is_empty());
    }

    #[test]
    fn suppressed_cells_are_imputed_and_recorded() {
        let (result, warnings) = parse(&[
            "1901900010002,5,*,*,0,3,1000,50,*,0,0,0,0,0,0,0,0,0,0,0,0,0",
        ]);
        let block = &result.unwrap()[0];
        assert_eq!(block.population, 0);
        assert_eq!(
            block.imputed_columns,
            vec!["POBTOT".to_string(), "POBFEM".to_string(), "P_0A2_F".to_string()]
        );
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn band_overflow_raises_residual_underflow() {
        let (result, warnings) = parse(&[
            "1901900010003,5,20,8,10,3,1000,50,5,5,0,0,0,0,0,0,0,0,0,0,0,0",
        ]);
        let block = &result.unwrap()[0];
        assert_eq!(block.breakdown(Sex::Female).count(AgeBand::From25To59), 0);
        assert!(matches!(
            &warnings[..],
            [DataQualityWarning::ResidualUnderflow { sex: Sex::Female, deficit: 2, .. }]
        ));
    }

    #[test]
    fn oversized_counts_are_imputed() {
        let (result, warnings) = parse(&[
            "1901900010004,5,1e20,0,0,1e20,1000,50,0,0,0,0,0,0,0,0,0,0,0,0,0,0",
        ]);
        let block = &result.unwrap()[0];
        assert_eq!(block.population, 0);
        assert_eq!(block.housing_units, 0);
        assert_eq!(block.imputed_columns, vec!["POBTOT".to_string(), "VIVTOT".to_string()]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings
            .iter()
            .all(|w| matches!(w, DataQualityWarning::OutOfRange { .. })));
    }

    #[test]
    fn distance_column_is_optional() {
        let columns = CensusColumns {
            distance: "no_such_column".to_string(),
            ..CensusColumns::default()
        };
        let placeholders = vec![];
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Census, &placeholders, &mut warnings);
        let text = format!(
            "{}\n1,5,1,1,0,1,1,1,0,0,0,0,0,0,0,0,0,0,0,0,0,0\n",
            header()
        );
        let blocks = parse_census("inegi.csv", &text, &columns, &mut coercion).unwrap();
        assert_eq!(blocks[0].distance_m, None);
    }

    #[test]
    fn missing_band_column_is_fatal() {
        let placeholders = vec![];
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Census, &placeholders, &mut warnings);
        let err = parse_census(
            "inegi.csv",
            "CVEGEO,av_union,POBTOT,POBFEM,POBMAS,VIVTOT,area\n1,5,1,1,0,1,1\n",
            &CensusColumns::default(),
            &mut coercion,
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "P_0A2_F"));
    }
}
