//! Dashboard queries over one dataset snapshot.
//!
//! A [`Report`] joins and aggregates a [`Dataset`] once; every query after
//! that is a read-only projection of the stored tables and can be called
//! concurrently from any number of threads.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr as _;
use std::sync::Arc;

use geo::{Centroid as _, MultiPolygon};
use radiografia_analytics_models::{
    AgeSexHistogram, BlockMetric, BlockMetricValue, CensusParkRow, CenterSource, MapCenter,
    ParkCensus, ParkMetric, ParkMetricValue, ParkMetrics, RankingWeights, ServiceParkRow,
    TypologyCode,
};
use radiografia_dataset::Dataset;
use radiografia_park_models::{BandBreakdown, GreenAreaId, LonLat, Sex, SexSplit as _};

use crate::join::{CensusParkTable, ServiceParkTable, join_census_to_parks, join_services_to_parks};
use crate::metrics::{aggregate_metrics, park_census};
use crate::ranking::compare_by_metric;
use crate::{AnalyticsError, QueryError};

/// Joined tables and park metrics for one [`Dataset`].
#[derive(Debug, Clone)]
pub struct Report {
    dataset: Arc<Dataset>,
    services: ServiceParkTable,
    census: CensusParkTable,
    metrics: Vec<ParkMetrics>,
    metric_index: BTreeMap<GreenAreaId, usize>,
}

impl Report {
    /// Builds a report with the dataset's configured ranking weights.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Join`] if a join fails.
    pub fn build(dataset: Arc<Dataset>) -> Result<Self, AnalyticsError> {
        let weights = *dataset.ranking_weights();
        Self::with_weights(dataset, &weights)
    }

    /// Builds a report with explicit ranking weights.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Join`] if a join fails.
    pub fn with_weights(
        dataset: Arc<Dataset>,
        weights: &RankingWeights,
    ) -> Result<Self, AnalyticsError> {
        let services = join_services_to_parks(dataset.services(), dataset.parks())?;
        let census = join_census_to_parks(dataset.census(), dataset.parks())?;
        let metrics = aggregate_metrics(&services, &census, weights);
        let metric_index = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| (m.green_area_id, i))
            .collect();

        Ok(Self {
            dataset,
            services,
            census,
            metrics,
            metric_index,
        })
    }

    /// The dataset this report was built from.
    #[must_use]
    pub const fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Services joined to parks.
    #[must_use]
    pub const fn service_table(&self) -> &ServiceParkTable {
        &self.services
    }

    /// Census blocks joined to parks.
    #[must_use]
    pub const fn census_table(&self) -> &CensusParkTable {
        &self.census
    }

    /// Metrics of every park, sorted by id.
    #[must_use]
    pub fn metrics(&self) -> &[ParkMetrics] {
        &self.metrics
    }

    /// Metrics of one park.
    #[must_use]
    pub fn park_metrics(&self, id: GreenAreaId) -> Option<&ParkMetrics> {
        self.metric_index.get(&id).map(|&i| &self.metrics[i])
    }

    fn require_park(&self, id: GreenAreaId) -> Result<(), QueryError> {
        if self.dataset.park(id).is_some() {
            Ok(())
        } else {
            Err(QueryError::UnknownPark { green_area_id: id })
        }
    }

    /// Services of one park, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownPark`] if no green area has this id.
    pub fn services_for_park(&self, id: GreenAreaId) -> Result<Vec<ServiceParkRow>, QueryError> {
        self.require_park(id)?;
        let mut rows = self.services.rows_for(id).to_vec();
        rows.sort_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then_with(|| a.service_id.cmp(&b.service_id))
        });
        Ok(rows)
    }

    /// Census totals of one park, `None` when no block is attributed to it.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownPark`] if no green area has this id.
    pub fn census_for_park(&self, id: GreenAreaId) -> Result<Option<ParkCensus>, QueryError> {
        self.require_park(id)?;
        if self.census.block_count(id) == 0 {
            return Ok(None);
        }
        Ok(Some(park_census(id, self.census.rows_for(id))))
    }

    /// The `n` parks with the highest (or, with `ascending`, lowest) value
    /// of a metric. Parks where the metric is undefined come last; ties
    /// break by ascending id. Asking for more parks than exist returns all
    /// of them.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownMetric`] if `metric` is not a
    /// [`ParkMetric`] name.
    pub fn top_n_by_metric(
        &self,
        metric: &str,
        n: usize,
        ascending: bool,
    ) -> Result<Vec<ParkMetrics>, QueryError> {
        let metric = parse_metric(metric)?;

        let mut ranked: Vec<&ParkMetrics> = self.metrics.iter().collect();
        ranked.sort_by(|a, b| compare_by_metric(metric, ascending, a, b));

        Ok(ranked.into_iter().take(n).cloned().collect())
    }

    /// Age pyramid for one park, or for every block attributed to some
    /// park when `id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownPark`] if no green area has this id.
    pub fn age_sex_breakdown(&self, id: Option<GreenAreaId>) -> Result<AgeSexHistogram, QueryError> {
        let mut female = BandBreakdown::default();
        let mut male = BandBreakdown::default();

        let mut add = |row: &CensusParkRow| {
            female.accumulate(&row.breakdown(Sex::Female));
            male.accumulate(&row.breakdown(Sex::Male));
        };

        match id {
            Some(id) => {
                self.require_park(id)?;
                self.census.rows_for(id).for_each(&mut add);
            }
            None => self.census.matched_rows().for_each(&mut add),
        }

        Ok(AgeSexHistogram::from_breakdowns(id, &female, &male))
    }

    /// Distinct display names, sorted, for the park selector.
    #[must_use]
    pub fn park_names(&self) -> Vec<String> {
        self.dataset
            .parks()
            .iter()
            .map(|p| p.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Ids of every green area with this display name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownParkName`] if no green area has it.
    pub fn parks_named(&self, name: &str) -> Result<Vec<GreenAreaId>, QueryError> {
        let ids: Vec<GreenAreaId> = self
            .dataset
            .parks()
            .iter()
            .filter(|p| p.name == name)
            .map(|p| p.id)
            .collect();
        if ids.is_empty() {
            return Err(QueryError::UnknownParkName {
                name: name.to_string(),
            });
        }
        Ok(ids)
    }

    /// Map center for a park selection.
    ///
    /// Uses the name lookup geometry when there is one, then the polygons
    /// of the green areas with that name, then the sector default.
    #[must_use]
    pub fn map_center(&self, name: &str) -> MapCenter {
        let (center, source) = self
            .name_lookup_center(name)
            .map(|c| (c, CenterSource::NameLookup))
            .or_else(|| {
                self.park_polygons_center(name)
                    .map(|c| (c, CenterSource::ParkPolygons))
            })
            .unwrap_or((self.dataset.default_center(), CenterSource::SectorDefault));

        MapCenter {
            name: name.to_string(),
            center,
            source,
        }
    }

    fn name_lookup_center(&self, name: &str) -> Option<LonLat> {
        self.dataset
            .park_name_geometry(name)?
            .centroid()
            .map(Into::into)
    }

    fn park_polygons_center(&self, name: &str) -> Option<LonLat> {
        let polygons: Vec<_> = self
            .dataset
            .parks()
            .iter()
            .filter(|p| p.name == name)
            .filter_map(|p| p.geometry.as_ref())
            .flat_map(|g| g.0.iter().cloned())
            .collect();
        MultiPolygon(polygons).centroid().map(Into::into)
    }

    /// One block-level field for each census block of a park.
    ///
    /// # Errors
    ///
    /// * [`QueryError::UnknownBlockMetric`] if `field` is not a
    ///   [`BlockMetric`] name
    /// * [`QueryError::UnknownPark`] if no green area has this id
    pub fn blocks_for_park(
        &self,
        id: GreenAreaId,
        field: &str,
    ) -> Result<Vec<BlockMetricValue>, QueryError> {
        let field = BlockMetric::from_str(field).map_err(|_| QueryError::UnknownBlockMetric {
            name: field.to_string(),
            expected: BlockMetric::names(),
        })?;
        self.require_park(id)?;

        Ok(self
            .census
            .rows_for(id)
            .map(|row| BlockMetricValue {
                block_id: row.block_id.clone(),
                value: field.value(row),
            })
            .collect())
    }

    /// Every park's value of one metric, by ascending id.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownMetric`] if `metric` is not a
    /// [`ParkMetric`] name.
    pub fn metric_values(&self, metric: &str) -> Result<Vec<ParkMetricValue>, QueryError> {
        let metric = parse_metric(metric)?;
        Ok(self
            .metrics
            .iter()
            .map(|m| ParkMetricValue {
                green_area_id: m.green_area_id,
                name: m.name.clone(),
                value: metric.value(m),
            })
            .collect())
    }

    /// Ordinal codes of the typologies, in order of first appearance by
    /// ascending green area id.
    #[must_use]
    pub fn typology_codes(&self) -> Vec<TypologyCode> {
        let mut codes: Vec<TypologyCode> = Vec::new();
        for park in self.dataset.parks() {
            if codes.iter().all(|c| c.typology != park.typology) {
                #[allow(clippy::cast_possible_truncation)]
                let code = codes.len() as u32;
                codes.push(TypologyCode {
                    typology: park.typology.clone(),
                    code,
                });
            }
        }
        codes
    }
}

fn parse_metric(name: &str) -> Result<ParkMetric, QueryError> {
    ParkMetric::from_str(name).map_err(|_| QueryError::UnknownMetric {
        name: name.to_string(),
        expected: ParkMetric::names(),
    })
}
