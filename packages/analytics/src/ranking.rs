//! Composite ranking score.
//!
//! `ranking_score = Σ wᵢ · (xᵢ − minᵢ) / (maxᵢ − minᵢ)` over the service
//! count, population total, housing units total and population density,
//! with min and max taken across all parks. A component whose values are
//! all equal contributes nothing, and so does an undefined density.
//! Weights are non-negative, so the score never decreases when a
//! component grows.

use std::cmp::Ordering;

use radiografia_analytics_models::{ParkMetric, ParkMetrics, RankingWeights};

/// Metrics that make up the score, in weight order.
pub const COMPONENTS: [ParkMetric; 4] = [
    ParkMetric::ServiceCount,
    ParkMetric::PopulationTotal,
    ParkMetric::HousingUnitsTotal,
    ParkMetric::PopulationDensity,
];

const fn weight_array(weights: &RankingWeights) -> [f64; 4] {
    [
        weights.service_count,
        weights.population_total,
        weights.housing_units_total,
        weights.population_density,
    ]
}

/// Observed range of one component.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |range, v| {
            Some(match range {
                None => Self { min: v, max: v },
                Some(Self { min, max }) => Self {
                    min: min.min(v),
                    max: max.max(v),
                },
            })
        })
    }

    fn normalize(self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            (value - self.min) / span
        } else {
            0.0
        }
    }
}

/// Fills [`ParkMetrics::ranking_score`] for every row.
pub fn apply_ranking_scores(metrics: &mut [ParkMetrics], weights: &RankingWeights) {
    let ranges = COMPONENTS.map(|component| {
        Range::of(metrics.iter().filter_map(|m| component.value(m)))
    });
    let weights = weight_array(weights);

    for row in &mut *metrics {
        let mut score = 0.0;
        for ((component, range), weight) in COMPONENTS.iter().zip(ranges).zip(weights) {
            if let (Some(value), Some(range)) = (component.value(row), range) {
                score += weight * range.normalize(value);
            }
        }
        row.ranking_score = score;
    }

    log::debug!("Scored {} parks", metrics.len());
}

/// Presentation order of parks by one metric.
///
/// Defined values sort highest first (lowest first with `ascending`) and
/// undefined values always sort last. Ties break by ascending id, so
/// `compare_by_metric(ParkMetric::RankingScore, false, ..)` is the ranking
/// order.
#[must_use]
pub fn compare_by_metric(
    metric: ParkMetric,
    ascending: bool,
    a: &ParkMetrics,
    b: &ParkMetrics,
) -> Ordering {
    let order = match (metric.value(a), metric.value(b)) {
        (Some(x), Some(y)) if ascending => x.total_cmp(&y),
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    order.then_with(|| a.green_area_id.cmp(&b.green_area_id))
}
