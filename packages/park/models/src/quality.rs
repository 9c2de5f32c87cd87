//! Non-fatal data quality findings raised while loading source tables.
//!
//! A warning never stops the pipeline. The loader replaces the offending
//! value with a documented default and records the finding here so that
//! operators can see which rows were patched.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{GreenAreaId, Sex};

/// Source table a finding belongs to.
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceTable {
    /// Green area polygons.
    GreenAreas,
    /// Nearby business/service records.
    Services,
    /// Census blocks.
    Census,
    /// Park name to geometry helper.
    ParkNames,
}

/// A per-row data quality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// A numeric cell held a placeholder (`*`, blank, ...) or unparseable
    /// text and was coerced to zero.
    PlaceholderValue {
        /// Table the cell belongs to.
        table: SourceTable,
        /// Primary key (or row number) of the row.
        row: String,
        /// Column name.
        column: String,
        /// Raw cell text.
        raw: String,
    },
    /// A non-negative quantity was negative and was clamped to zero.
    NegativeValue {
        /// Table the cell belongs to.
        table: SourceTable,
        /// Primary key of the row.
        row: String,
        /// Column name.
        column: String,
        /// Parsed value before clamping.
        value: f64,
    },
    /// A count was too large to be a plausible integer count and was
    /// replaced by zero.
    OutOfRange {
        /// Table the cell belongs to.
        table: SourceTable,
        /// Primary key of the row.
        row: String,
        /// Column name.
        column: String,
        /// Parsed value.
        value: f64,
        /// Largest accepted value.
        max: u64,
    },
    /// The explicit age bands of a block exceed its sex total, so the
    /// residual `25-59` band was clamped to zero.
    ResidualUnderflow {
        /// Census block key.
        block_id: String,
        /// Sex whose bands overflowed.
        sex: Sex,
        /// Amount by which the explicit bands exceed the total.
        deficit: u64,
    },
    /// A foreign key referenced a green area that does not exist. The
    /// reference was cleared and the row kept.
    DanglingReference {
        /// Table the row belongs to.
        table: SourceTable,
        /// Primary key of the row.
        row: String,
        /// Referenced id.
        green_area_id: GreenAreaId,
    },
    /// A green area or park name entry had no usable polygon geometry.
    MissingGeometry {
        /// Table the feature belongs to.
        table: SourceTable,
        /// Green area id or park name.
        row: String,
    },
    /// A text property was absent or blank and was left empty.
    MissingLabel {
        /// Table the row belongs to.
        table: SourceTable,
        /// Primary key of the row.
        row: String,
        /// Property name.
        column: String,
    },
}

impl std::fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlaceholderValue {
                table,
                row,
                column,
                raw,
            } => write!(f, "[{table}] row {row}: {column}={raw:?} coerced to 0"),
            Self::NegativeValue {
                table,
                row,
                column,
                value,
            } => write!(f, "[{table}] row {row}: negative {column}={value} clamped to 0"),
            Self::OutOfRange {
                table,
                row,
                column,
                value,
                max,
            } => write!(
                f,
                "[{table}] row {row}: {column}={value} exceeds {max}, coerced to 0"
            ),
            Self::ResidualUnderflow {
                block_id,
                sex,
                deficit,
            } => write!(
                f,
                "[census] block {block_id}: {sex} age bands exceed total by {deficit}, 25-59 band clamped to 0"
            ),
            Self::DanglingReference {
                table,
                row,
                green_area_id,
            } => write!(
                f,
                "[{table}] row {row}: green area {green_area_id} does not exist, reference cleared"
            ),
            Self::MissingGeometry { table, row } => {
                write!(f, "[{table}] {row}: no polygon geometry")
            }
            Self::MissingLabel { table, row, column } => {
                write!(f, "[{table}] row {row}: {column} is missing, left empty")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_message_names_the_cell() {
        let warning = DataQualityWarning::PlaceholderValue {
            table: SourceTable::Census,
            row: "190190001".to_string(),
            column: "POBFEM".to_string(),
            raw: "*".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "[census] row 190190001: POBFEM=\"*\" coerced to 0"
        );
    }

    #[test]
    fn out_of_range_message_names_the_bound() {
        let warning = DataQualityWarning::OutOfRange {
            table: SourceTable::Census,
            row: "190190001".to_string(),
            column: "POBTOT".to_string(),
            value: 1e20,
            max: 9_007_199_254_740_992,
        };
        assert_eq!(
            warning.to_string(),
            "[census] row 190190001: POBTOT=100000000000000000000 exceeds 9007199254740992, coerced to 0"
        );
    }
}
