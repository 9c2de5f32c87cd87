//! Header-indexed CSV table.

use std::collections::BTreeMap;

use crate::DataLoadError;

/// A parsed CSV file with its header row indexed by column name.
pub struct CsvTable {
    label: String,
    columns: BTreeMap<String, usize>,
    records: Vec<csv::StringRecord>,
}

impl CsvTable {
    /// Parses CSV text. Header names are trimmed and a UTF-8 BOM on the
    /// first header is stripped.
    pub fn parse(label: &str, text: &str) -> Result<Self, DataLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns = reader
            .headers()
            .map_err(|source| DataLoadError::Csv {
                path: label.to_string(),
                source,
            })?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| DataLoadError::Csv {
                path: label.to_string(),
                source,
            })?;

        log::debug!("[{label}] parsed {} CSV rows", records.len());

        Ok(Self {
            label: label.to_string(),
            columns,
            records,
        })
    }

    /// Index of a required column.
    pub fn require(&self, column: &str) -> Result<usize, DataLoadError> {
        self.columns
            .get(column)
            .copied()
            .ok_or_else(|| DataLoadError::MissingColumn {
                path: self.label.clone(),
                column: column.to_string(),
            })
    }

    /// Index of an optional column.
    pub fn optional(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }

    /// Source label used in error messages.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Data rows, excluding the header.
    pub fn records(&self) -> &[csv::StringRecord] {
        &self.records
    }
}

/// Cell text, empty when a short row lacks the column.
pub fn cell(record: &csv::StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}
