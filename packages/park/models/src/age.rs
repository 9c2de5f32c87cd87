//! Age band taxonomy for census population breakdowns.
//!
//! The census source enumerates seven age bands per sex. The `25-59`
//! band is never published directly and is derived as the residual of
//! the sex total minus the explicit bands.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Sex split used by the census source.
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
pub enum Sex {
    /// `POBFEM` and the `_F` band columns.
    Female,
    /// `POBMAS` and the `_M` band columns.
    Male,
}

/// Age bands in ascending age order.
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
pub enum AgeBand {
    /// 0 to 2 years.
    #[serde(rename = "0-2")]
    #[strum(serialize = "0-2")]
    From0To2,
    /// 3 to 5 years.
    #[serde(rename = "3-5")]
    #[strum(serialize = "3-5")]
    From3To5,
    /// 6 to 11 years.
    #[serde(rename = "6-11")]
    #[strum(serialize = "6-11")]
    From6To11,
    /// 12 to 14 years.
    #[serde(rename = "12-14")]
    #[strum(serialize = "12-14")]
    From12To14,
    /// 15 to 17 years.
    #[serde(rename = "15-17")]
    #[strum(serialize = "15-17")]
    From15To17,
    /// 18 to 24 years.
    #[serde(rename = "18-24")]
    #[strum(serialize = "18-24")]
    From18To24,
    /// 25 to 59 years. Residual band, derived by subtraction.
    #[serde(rename = "25-59")]
    #[strum(serialize = "25-59")]
    From25To59,
    /// 60 years and over.
    #[serde(rename = "60+")]
    #[strum(serialize = "60+")]
    From60Up,
}

impl AgeBand {
    /// Number of bands the source publishes explicitly.
    pub const EXPLICIT_COUNT: usize = 7;

    /// Bands published explicitly, in the order of [`AgeBandCounts`].
    pub const EXPLICIT: [Self; Self::EXPLICIT_COUNT] = [
        Self::From0To2,
        Self::From3To5,
        Self::From6To11,
        Self::From12To14,
        Self::From15To17,
        Self::From18To24,
        Self::From60Up,
    ];

    /// Every band in ascending age order.
    pub const ALL: [Self; 8] = [
        Self::From0To2,
        Self::From3To5,
        Self::From6To11,
        Self::From12To14,
        Self::From15To17,
        Self::From18To24,
        Self::From25To59,
        Self::From60Up,
    ];

    /// Position in [`Self::EXPLICIT`], `None` for the residual band.
    #[must_use]
    pub const fn explicit_index(self) -> Option<usize> {
        match self {
            Self::From0To2 => Some(0),
            Self::From3To5 => Some(1),
            Self::From6To11 => Some(2),
            Self::From12To14 => Some(3),
            Self::From15To17 => Some(4),
            Self::From18To24 => Some(5),
            Self::From25To59 => None,
            Self::From60Up => Some(6),
        }
    }

    const fn position(self) -> usize {
        self as usize
    }
}

/// Counts of the explicit age bands for one sex of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBandCounts {
    bands: [u64; AgeBand::EXPLICIT_COUNT],
}

impl AgeBandCounts {
    /// Creates counts in [`AgeBand::EXPLICIT`] order.
    #[must_use]
    pub const fn new(bands: [u64; AgeBand::EXPLICIT_COUNT]) -> Self {
        Self { bands }
    }

    /// Count for an explicit band. The residual band has no stored count.
    #[must_use]
    pub fn get(&self, band: AgeBand) -> Option<u64> {
        band.explicit_index().map(|i| self.bands[i])
    }

    /// Sum of the explicit bands, saturating at `u64::MAX`.
    #[must_use]
    pub fn explicit_total(&self) -> u64 {
        self.bands.iter().fold(0, |acc, &n| acc.saturating_add(n))
    }

    /// Completes the breakdown with the residual `25-59` band.
    ///
    /// The residual is `total - explicit_total()`, clamped at zero. When
    /// the explicit bands exceed `total` the overshoot is reported as
    /// [`BandBreakdown::deficit`].
    #[must_use]
    pub fn with_residual(&self, total: u64) -> BandBreakdown {
        let explicit = self.explicit_total();
        let mut counts = [0u64; 8];
        for band in AgeBand::EXPLICIT {
            if let Some(i) = band.explicit_index() {
                counts[band.position()] = self.bands[i];
            }
        }
        counts[AgeBand::From25To59.position()] = total.saturating_sub(explicit);

        BandBreakdown {
            counts,
            deficit: explicit.saturating_sub(total),
        }
    }
}

/// All eight age bands for one sex, residual included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandBreakdown {
    counts: [u64; 8],
    /// How far the explicit bands exceeded the sex total. Zero for
    /// consistent data.
    pub deficit: u64,
}

impl BandBreakdown {
    /// Count for a band.
    #[must_use]
    pub const fn count(&self, band: AgeBand) -> u64 {
        self.counts[band.position()]
    }

    /// Sum of all eight bands, saturating at `u64::MAX`.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0, |acc, &n| acc.saturating_add(n))
    }

    /// Adds another breakdown band by band, saturating at `u64::MAX`.
    pub fn accumulate(&mut self, other: &Self) {
        for (acc, value) in self.counts.iter_mut().zip(other.counts) {
            *acc = acc.saturating_add(value);
        }
        self.deficit = self.deficit.saturating_add(other.deficit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn residual_is_total_minus_explicit() {
        let counts = AgeBandCounts::new([10, 10, 10, 10, 10, 10, 10]);
        let breakdown = counts.with_residual(100);
        assert_eq!(breakdown.count(AgeBand::From25To59), 30);
        assert_eq!(breakdown.deficit, 0);
        assert_eq!(breakdown.total(), 100);
    }

    #[test]
    fn residual_clamps_at_zero_and_reports_deficit() {
        let counts = AgeBandCounts::new([20, 20, 20, 20, 20, 20, 20]);
        let breakdown = counts.with_residual(100);
        assert_eq!(breakdown.count(AgeBand::From25To59), 0);
        assert_eq!(breakdown.deficit, 40);
    }

    #[test]
    fn explicit_bands_keep_their_positions() {
        let counts = AgeBandCounts::new([1, 2, 3, 4, 5, 6, 7]);
        let breakdown = counts.with_residual(100);
        assert_eq!(breakdown.count(AgeBand::From0To2), 1);
        assert_eq!(breakdown.count(AgeBand::From18To24), 6);
        assert_eq!(breakdown.count(AgeBand::From60Up), 7);
        assert_eq!(counts.get(AgeBand::From25To59), None);
    }

    #[test]
    fn accumulate_adds_band_by_band() {
        let mut acc = BandBreakdown::default();
        acc.accumulate(&AgeBandCounts::new([1, 1, 1, 1, 1, 1, 1]).with_residual(10));
        acc.accumulate(&AgeBandCounts::new([2, 2, 2, 2, 2, 2, 2]).with_residual(20));
        assert_eq!(acc.count(AgeBand::From0To2), 3);
        assert_eq!(acc.count(AgeBand::From25To59), 9);
        assert_eq!(acc.total(), 30);
    }

    #[test]
    fn accumulate_saturates_instead_of_overflowing() {
        let huge = AgeBandCounts::new([u64::MAX; AgeBand::EXPLICIT_COUNT]);
        assert_eq!(huge.explicit_total(), u64::MAX);
        let mut acc = huge.with_residual(u64::MAX);
        acc.accumulate(&huge.with_residual(u64::MAX));
        assert_eq!(acc.count(AgeBand::From0To2), u64::MAX);
        assert_eq!(acc.total(), u64::MAX);
    }

    #[test]
    fn band_labels_parse() {
        assert_eq!(AgeBand::from_str("25-59").unwrap(), AgeBand::From25To59);
        assert_eq!(AgeBand::From60Up.to_string(), "60+");
        assert_eq!(Sex::from_str("female").unwrap(), Sex::Female);
    }
}
