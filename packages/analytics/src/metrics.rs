//! Per-park metric aggregation.

use std::collections::BTreeSet;

use radiografia_analytics_models::{
    CensusParkRow, ParkCensus, ParkLabel, ParkMetrics, RankingWeights, ServiceParkRow,
};
use radiografia_park_models::{GreenAreaId, population_density};

use crate::join::{CensusParkTable, ServiceParkTable};
use crate::ranking::apply_ranking_scores;

/// Sums the census blocks of one park.
#[must_use]
pub fn park_census<'a>(
    green_area_id: GreenAreaId,
    rows: impl IntoIterator<Item = &'a CensusParkRow>,
) -> ParkCensus {
    let mut census = ParkCensus {
        green_area_id,
        block_count: 0,
        population_total: 0,
        population_female_total: 0,
        population_male_total: 0,
        housing_units_total: 0,
        block_area_total: 0.0,
        population_density: None,
        imputed_values: 0,
    };

    // Counts saturate at u64::MAX.
    for row in rows {
        census.block_count += 1;
        census.population_total = census.population_total.saturating_add(row.population);
        census.population_female_total = census
            .population_female_total
            .saturating_add(row.population_female);
        census.population_male_total = census
            .population_male_total
            .saturating_add(row.population_male);
        census.housing_units_total = census.housing_units_total.saturating_add(row.housing_units);
        census.block_area_total += row.block_area_m2;
        census.imputed_values = census.imputed_values.saturating_add(row.imputed_values);
    }

    census.population_density =
        population_density(census.population_total, census.block_area_total);

    census
}

/// Mean service distance, `None` without services.
#[must_use]
pub fn mean_distance(rows: &[ServiceParkRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = rows.len() as f64;
    Some(rows.iter().map(|r| r.distance_m).sum::<f64>() / count)
}

/// Builds one [`ParkMetrics`] row per green area id present in either
/// table, sorted by id, with ranking scores filled in.
///
/// Never fails: undefined values are `None` and parks whose census
/// figures include imputed cells are logged.
#[must_use]
pub fn aggregate_metrics(
    services: &ServiceParkTable,
    census: &CensusParkTable,
    weights: &RankingWeights,
) -> Vec<ParkMetrics> {
    let ids: BTreeSet<GreenAreaId> = services.park_ids().chain(census.park_ids()).collect();

    let mut metrics = Vec::with_capacity(ids.len());

    for id in ids {
        let Some(label) = park_label(services, census, id) else {
            continue;
        };
        let service_rows = services.rows_for(id);
        let totals = park_census(id, census.rows_for(id));

        if totals.imputed_values > 0 {
            log::warn!(
                "Park {id} ({}): {} census values were imputed; population density and ranking score are partial",
                label.name,
                totals.imputed_values
            );
        }

        metrics.push(ParkMetrics {
            green_area_id: id,
            name: label.name,
            typology: label.typology,
            area_m2: label.area_m2,
            service_count: service_rows.len() as u64,
            mean_service_distance: mean_distance(service_rows),
            population_total: totals.population_total,
            population_female_total: totals.population_female_total,
            population_male_total: totals.population_male_total,
            housing_units_total: totals.housing_units_total,
            block_count: totals.block_count,
            block_area_total: totals.block_area_total,
            population_density: totals.population_density,
            ranking_score: 0.0,
            imputed_values: totals.imputed_values,
        });
    }

    apply_ranking_scores(&mut metrics, weights);
    log::info!("Aggregated metrics for {} parks", metrics.len());
    metrics
}

fn park_label(
    services: &ServiceParkTable,
    census: &CensusParkTable,
    id: GreenAreaId,
) -> Option<ParkLabel> {
    services
        .group(id)
        .map(|g| g.park.clone())
        .or_else(|| census.rows_for(id).find_map(|r| r.park.clone()))
}
