//! Key-based joins of services and census blocks onto green areas.
//!
//! Both joins key on the green area union id, never on the display name,
//! and keep row multiplicity: a park with N services yields N rows.
//! Neither join mutates its inputs.

use std::collections::BTreeMap;

use radiografia_analytics_models::{CensusParkRow, ParkLabel, ServiceParkRow};
use radiografia_park_models::{CensusBlock, GreenArea, GreenAreaId, ServiceRecord};

use crate::JoinError;

/// Services of one green area.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceGroup {
    /// The green area.
    pub park: ParkLabel,
    /// Joined service rows, in source order.
    pub rows: Vec<ServiceParkRow>,
}

/// Services grouped by green area. Every green area has a group, possibly
/// empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceParkTable {
    groups: BTreeMap<GreenAreaId, ServiceGroup>,
}

impl ServiceParkTable {
    /// Rows of one park. Empty for a park without services and for an
    /// unknown id.
    #[must_use]
    pub fn rows_for(&self, id: GreenAreaId) -> &[ServiceParkRow] {
        self.groups
            .get(&id)
            .map(|g| g.rows.as_slice())
            .unwrap_or_default()
    }

    /// Group of one park.
    #[must_use]
    pub fn group(&self, id: GreenAreaId) -> Option<&ServiceGroup> {
        self.groups.get(&id)
    }

    /// Ids of every park in the table.
    pub fn park_ids(&self) -> impl Iterator<Item = GreenAreaId> + '_ {
        self.groups.keys().copied()
    }

    fn len(&self) -> usize {
        self.groups.values().map(|g| g.rows.len()).sum()
    }
}

/// Census blocks with their green area label, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CensusParkTable {
    rows: Vec<CensusParkRow>,
    by_park: BTreeMap<GreenAreaId, Vec<usize>>,
}

impl CensusParkTable {
    /// Every census row, matched or not.
    #[must_use]
    pub fn rows(&self) -> &[CensusParkRow] {
        &self.rows
    }

    /// Rows attributed to one park.
    pub fn rows_for(&self, id: GreenAreaId) -> impl Iterator<Item = &CensusParkRow> {
        self.by_park
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.rows[i])
    }

    /// Rows that matched a park.
    pub fn matched_rows(&self) -> impl Iterator<Item = &CensusParkRow> {
        self.rows.iter().filter(|r| r.park.is_some())
    }

    /// Ids of parks with at least one block.
    pub fn park_ids(&self) -> impl Iterator<Item = GreenAreaId> + '_ {
        self.by_park.keys().copied()
    }

    /// Number of blocks attributed to one park.
    #[must_use]
    pub fn block_count(&self, id: GreenAreaId) -> usize {
        self.by_park.get(&id).map_or(0, Vec::len)
    }
}

/// Indexes park labels by id, rejecting duplicated ids.
fn park_labels(parks: &[GreenArea]) -> Result<BTreeMap<GreenAreaId, ParkLabel>, JoinError> {
    let mut labels = BTreeMap::new();
    for park in parks {
        let label = ParkLabel {
            green_area_id: park.id,
            name: park.name.clone(),
            typology: park.typology.clone(),
            area_m2: park.area_m2,
        };
        if labels.insert(park.id, label).is_some() {
            return Err(JoinError::NonUniqueKey {
                green_area_id: park.id,
            });
        }
    }
    Ok(labels)
}

/// Right join of services onto green areas.
///
/// Every park appears, with an empty group when no service references it.
/// Services without a park, or referencing an id not in `parks`, are not
/// part of the result.
///
/// # Errors
///
/// Returns [`JoinError::NonUniqueKey`] if `parks` repeats an id.
pub fn join_services_to_parks(
    services: &[ServiceRecord],
    parks: &[GreenArea],
) -> Result<ServiceParkTable, JoinError> {
    let mut groups: BTreeMap<GreenAreaId, ServiceGroup> = park_labels(parks)?
        .into_iter()
        .map(|(id, park)| {
            (
                id,
                ServiceGroup {
                    park,
                    rows: Vec::new(),
                },
            )
        })
        .collect();

    let mut unmatched = 0usize;
    for service in services {
        let group = match service.green_area_id {
            Some(id) => groups.get_mut(&id),
            None => None,
        };
        let Some(group) = group else {
            unmatched += 1;
            continue;
        };
        group.rows.push(ServiceParkRow {
            green_area_id: group.park.green_area_id,
            park_name: group.park.name.clone(),
            typology: group.park.typology.clone(),
            area_m2: group.park.area_m2,
            service_id: service.service_id.clone(),
            activity_code: service.activity_code.clone(),
            activity_name: service.activity_name.clone(),
            category: service.category.clone(),
            distance_m: service.distance_m,
            lat: service.lat,
            lon: service.lon,
        });
    }

    let table = ServiceParkTable { groups };
    log::debug!(
        "Joined {} services onto {} parks ({unmatched} without a park)",
        table.len(),
        table.groups.len()
    );
    Ok(table)
}

/// Left join of census blocks onto green areas.
///
/// Every block is kept; blocks without a park (or referencing an id not in
/// `parks`) carry no label and are not attributed to any park.
///
/// # Errors
///
/// Returns [`JoinError::NonUniqueKey`] if `parks` repeats an id.
pub fn join_census_to_parks(
    census: &[CensusBlock],
    parks: &[GreenArea],
) -> Result<CensusParkTable, JoinError> {
    let labels = park_labels(parks)?;

    let mut rows = Vec::with_capacity(census.len());
    let mut by_park: BTreeMap<GreenAreaId, Vec<usize>> = BTreeMap::new();

    for (i, block) in census.iter().enumerate() {
        let park = block.green_area_id.and_then(|id| labels.get(&id)).cloned();
        if let Some(label) = &park {
            by_park.entry(label.green_area_id).or_default().push(i);
        }
        rows.push(CensusParkRow {
            block_id: block.block_id.clone(),
            green_area_id: block.green_area_id,
            park,
            population: block.population,
            population_female: block.population_female,
            population_male: block.population_male,
            housing_units: block.housing_units,
            block_area_m2: block.block_area_m2,
            distance_m: block.distance_m,
            female_bands: block.female_bands,
            male_bands: block.male_bands,
            imputed_values: block.imputed_columns.len() as u64,
        });
    }

    log::debug!(
        "Joined {} census blocks, {} attributed to {} parks",
        rows.len(),
        by_park.values().map(Vec::len).sum::<usize>(),
        by_park.len()
    );
    Ok(CensusParkTable { rows, by_park })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use radiografia_park_models::AgeBandCounts;

    pub fn park(id: GreenAreaId, name: &str) -> GreenArea {
        GreenArea {
            id,
            name: name.to_string(),
            area_m2: 1000.0,
            typology: "Parque".to_string(),
            geometry: None,
            centroid: None,
        }
    }

    pub fn service(id: &str, park: Option<GreenAreaId>, distance_m: f64) -> ServiceRecord {
        ServiceRecord {
            service_id: id.to_string(),
            green_area_id: park,
            activity_code: "461110".to_string(),
            activity_name: "Tiendas de abarrotes".to_string(),
            category: "Comercio".to_string(),
            distance_m,
            lat: 25.67,
            lon: -100.40,
        }
    }

    pub fn block(id: &str, park: Option<GreenAreaId>, population: u64, area: f64) -> CensusBlock {
        CensusBlock {
            block_id: id.to_string(),
            green_area_id: park,
            population,
            population_female: population / 2,
            population_male: population - population / 2,
            housing_units: population / 4,
            female_bands: AgeBandCounts::default(),
            male_bands: AgeBandCounts::default(),
            block_area_m2: area,
            distance_m: None,
            imputed_columns: Vec::new(),
        }
    }

    #[test]
    fn service_join_keeps_multiplicity_and_empty_parks() {
        let parks = vec![park(5, "Rufino Tamayo"), park(7, "Plaza Fátima")];
        let services = vec![
            service("a", Some(5), 10.0),
            service("b", Some(5), 20.0),
            service("c", Some(5), 30.0),
            service("d", None, 5.0),
        ];
        let table = join_services_to_parks(&services, &parks).unwrap();
        assert_eq!(table.rows_for(5).len(), 3);
        assert!(table.rows_for(7).is_empty());
        assert_eq!(table.park_ids().collect::<Vec<_>>(), vec![5, 7]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows_for(5)[0].park_name, "Rufino Tamayo");
        assert_eq!(services.len(), 4, "inputs are untouched");
    }

    #[test]
    fn census_join_is_left_join() {
        let parks = vec![park(5, "Rufino Tamayo")];
        let census = vec![
            block("b1", Some(5), 100, 10.0),
            block("b2", None, 40, 10.0),
            block("b3", Some(5), 60, 10.0),
        ];
        let table = join_census_to_parks(&census, &parks).unwrap();
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.block_count(5), 2);
        assert_eq!(
            table.rows_for(5).map(|r| r.block_id.as_str()).collect::<Vec<_>>(),
            vec!["b1", "b3"]
        );
        assert!(table.rows()[1].park.is_none());
        assert_eq!(table.matched_rows().count(), 2);
    }

    #[test]
    fn duplicate_park_ids_are_rejected() {
        let parks = vec![park(5, "A"), park(5, "B")];
        let services = vec![service("a", Some(5), 1.0)];
        assert!(matches!(
            join_services_to_parks(&services, &parks),
            Err(JoinError::NonUniqueKey { green_area_id: 5 })
        ));
        assert!(matches!(
            join_census_to_parks(&[], &parks),
            Err(JoinError::NonUniqueKey { green_area_id: 5 })
        ));
    }

    #[test]
    fn shared_display_names_stay_separate_parks() {
        let parks = vec![park(1, "Parque Clouthier"), park(2, "Parque Clouthier")];
        let services = vec![service("a", Some(1), 1.0), service("b", Some(2), 2.0)];
        let table = join_services_to_parks(&services, &parks).unwrap();
        assert_eq!(table.rows_for(1).len(), 1);
        assert_eq!(table.rows_for(2).len(), 1);
    }
}
