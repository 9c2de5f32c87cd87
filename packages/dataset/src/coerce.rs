//! Numeric cell coercion.
//!
//! The source extracts mark suppressed or missing values with `*` or an
//! empty cell. A [`Coercion`] turns every numeric cell into a value,
//! replacing placeholders, unparseable text and negative quantities with
//! zero, and records a [`DataQualityWarning`] for each replacement.

use radiografia_park_models::{DataQualityWarning, GreenAreaId, SourceTable};

/// Largest accepted count. Above 2^53 an `f64` no longer holds every
/// integer, so such a cell cannot be an exact count.
pub const MAX_COUNT: u64 = 1 << 53;

/// A coerced cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced<T> {
    /// Value after coercion.
    pub value: T,
    /// Whether the raw cell was replaced by the default.
    pub imputed: bool,
}

impl<T> Coerced<T> {
    const fn kept(value: T) -> Self {
        Self {
            value,
            imputed: false,
        }
    }

    const fn imputed(value: T) -> Self {
        Self {
            value,
            imputed: true,
        }
    }
}

/// Collects data quality warnings for one source table.
pub struct Coercion<'a> {
    table: SourceTable,
    placeholders: &'a [String],
    warnings: &'a mut Vec<DataQualityWarning>,
}

impl<'a> Coercion<'a> {
    /// Creates a coercion context for `table`.
    pub const fn new(
        table: SourceTable,
        placeholders: &'a [String],
        warnings: &'a mut Vec<DataQualityWarning>,
    ) -> Self {
        Self {
            table,
            placeholders,
            warnings,
        }
    }

    /// Whether a cell holds a placeholder token.
    #[must_use]
    pub fn is_placeholder(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        self.placeholders.iter().any(|p| p == trimmed)
    }

    /// Records a warning and logs it.
    pub fn flag(&mut self, warning: DataQualityWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Coerces a non-negative count (population, housing units, ...).
    ///
    /// Accepts integral floats such as `"15.0"`, which is how pandas
    /// writes integer columns that once held a `NaN`. Counts above
    /// [`MAX_COUNT`] are replaced by zero.
    pub fn count(&mut self, row: &str, column: &str, raw: &str) -> Coerced<u64> {
        let Some(value) = self.number(row, column, raw) else {
            return Coerced::imputed(0);
        };
        if value < 0.0 {
            self.flag(DataQualityWarning::NegativeValue {
                table: self.table,
                row: row.to_string(),
                column: column.to_string(),
                value,
            });
            return Coerced::imputed(0);
        }
        #[allow(clippy::cast_precision_loss)]
        let max = MAX_COUNT as f64;
        if value > max {
            self.flag(DataQualityWarning::OutOfRange {
                table: self.table,
                row: row.to_string(),
                column: column.to_string(),
                value,
                max: MAX_COUNT,
            });
            return Coerced::imputed(0);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = value.round() as u64;
        Coerced::kept(count)
    }

    /// Coerces a non-negative measure (area, distance).
    pub fn measure(&mut self, row: &str, column: &str, raw: &str) -> Coerced<f64> {
        let Some(value) = self.number(row, column, raw) else {
            return Coerced::imputed(0.0);
        };
        if value < 0.0 {
            self.flag(DataQualityWarning::NegativeValue {
                table: self.table,
                row: row.to_string(),
                column: column.to_string(),
                value,
            });
            return Coerced::imputed(0.0);
        }
        Coerced::kept(value)
    }

    /// Coerces a signed coordinate.
    pub fn coordinate(&mut self, row: &str, column: &str, raw: &str) -> Coerced<f64> {
        self.number(row, column, raw)
            .map_or_else(|| Coerced::imputed(0.0), Coerced::kept)
    }

    /// Parses a finite number, flagging placeholders and garbage.
    fn number(&mut self, row: &str, column: &str, raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        let parsed = if self.is_placeholder(trimmed) {
            None
        } else {
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        };
        if parsed.is_none() {
            self.flag(DataQualityWarning::PlaceholderValue {
                table: self.table,
                row: row.to_string(),
                column: column.to_string(),
                raw: raw.to_string(),
            });
        }
        parsed
    }
}

/// Parses a green area id, accepting integral floats (`"12.0"`).
#[must_use]
pub fn parse_green_area_id(raw: &str) -> Option<GreenAreaId> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<GreenAreaId>() {
        return Some(id);
    }
    let value = trimmed.parse::<f64>().ok()?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let id = value as GreenAreaId;
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    let integral = value.is_finite() && (id as f64) == value;
    integral.then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders() -> Vec<String> {
        vec!["*".to_string(), String::new()]
    }

    #[test]
    fn star_is_coerced_to_zero_with_warning() {
        let tokens = placeholders();
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Census, &tokens, &mut warnings);
        let cell = coercion.count("b1", "POBFEM", "*");
        assert_eq!(cell, Coerced::imputed(0));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            DataQualityWarning::PlaceholderValue { column, .. } if column == "POBFEM"
        ));
    }

    #[test]
    fn blank_and_garbage_are_placeholders() {
        let tokens = placeholders();
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Services, &tokens, &mut warnings);
        assert!(coercion.measure("s1", "distancia", "  ").imputed);
        assert!(coercion.measure("s1", "distancia", "lejos").imputed);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn integral_float_counts_are_accepted() {
        let tokens = placeholders();
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Census, &tokens, &mut warnings);
        assert_eq!(coercion.count("b1", "POBTOT", "15.0"), Coerced::kept(15));
        assert!(warnings.is_empty());
    }

    #[test]
    fn negative_counts_are_clamped() {
        let tokens = placeholders();
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Census, &tokens, &mut warnings);
        assert_eq!(coercion.count("b1", "POBTOT", "-4"), Coerced::imputed(0));
        assert!(matches!(
            warnings[0],
            DataQualityWarning::NegativeValue { value, .. } if (value + 4.0).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn oversized_counts_are_replaced() {
        let tokens = placeholders();
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Census, &tokens, &mut warnings);
        assert_eq!(coercion.count("b1", "POBTOT", "1e20"), Coerced::imputed(0));
        assert_eq!(
            coercion.count("b1", "VIVTOT", "9007199254740992"),
            Coerced::kept(MAX_COUNT)
        );
        assert!(matches!(
            &warnings[..],
            [DataQualityWarning::OutOfRange { column, max: MAX_COUNT, .. }] if column == "POBTOT"
        ));
    }

    #[test]
    fn coordinates_keep_sign() {
        let tokens = placeholders();
        let mut warnings = Vec::new();
        let mut coercion = Coercion::new(SourceTable::Services, &tokens, &mut warnings);
        let lon = coercion.coordinate("s1", "longitud", "-100.4068");
        assert!((lon.value + 100.4068).abs() < 1e-9);
        assert!(!lon.imputed);
    }

    #[test]
    fn parses_green_area_ids() {
        assert_eq!(parse_green_area_id("12"), Some(12));
        assert_eq!(parse_green_area_id(" 12.0 "), Some(12));
        assert_eq!(parse_green_area_id("12.5"), None);
        assert_eq!(parse_green_area_id("*"), None);
    }
}
