//! One dashboard query per invocation (or per shell line), answered as JSON.

use clap::Subcommand;
use radiografia_analytics::Report;
use radiografia_park_models::GreenAreaId;
use serde::Serialize;
use serde_json::{Value, json};

/// Queries the presentation layer can issue.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Query {
    /// Table sizes and every data quality warning raised while loading
    Check,
    /// Park display names with the green area ids behind each
    Parks,
    /// Metrics of every park, by id
    Metrics,
    /// Services near one park, nearest first
    Services {
        /// Green area id
        #[arg(long)]
        park: GreenAreaId,
    },
    /// Census totals of one park
    Census {
        /// Green area id
        #[arg(long)]
        park: GreenAreaId,
    },
    /// Parks ranked by one metric
    Top {
        /// Metric name (e.g. `ranking_score`, `population_density`)
        #[arg(long)]
        metric: String,
        /// Number of parks to return
        #[arg(long, default_value_t = 10)]
        n: usize,
        /// Lowest values first
        #[arg(long)]
        ascending: bool,
    },
    /// Age pyramid of one park, or of the whole sector
    AgeSex {
        /// Green area id (omit for sector totals)
        #[arg(long)]
        park: Option<GreenAreaId>,
    },
    /// One census field for every block of a park
    Blocks {
        /// Green area id
        #[arg(long)]
        park: GreenAreaId,
        /// Block field (e.g. `population`, `distance_m`)
        #[arg(long)]
        field: String,
    },
    /// Every park's value of one metric
    Values {
        /// Metric name
        #[arg(long)]
        metric: String,
    },
    /// Ordinal codes of the park typologies
    Typologies,
    /// Map center for a park name
    Center {
        /// Park display name
        #[arg(long)]
        name: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParkSelection {
    name: String,
    green_area_ids: Vec<GreenAreaId>,
}

/// Runs one query against a report.
///
/// # Errors
///
/// Returns the query error (unknown metric, park, ...) or a serialization
/// error.
pub fn run(query: &Query, report: &Report) -> Result<Value, Box<dyn std::error::Error>> {
    let value = match query {
        Query::Check => {
            let dataset = report.dataset();
            json!({
                "summary": dataset.summary(),
                "warnings": dataset.warnings(),
            })
        }
        Query::Parks => {
            let selections = report
                .park_names()
                .into_iter()
                .map(|name| {
                    let green_area_ids = report.parks_named(&name)?;
                    Ok(ParkSelection {
                        name,
                        green_area_ids,
                    })
                })
                .collect::<Result<Vec<_>, radiografia_analytics::QueryError>>()?;
            serde_json::to_value(selections)?
        }
        Query::Metrics => serde_json::to_value(report.metrics())?,
        Query::Services { park } => serde_json::to_value(report.services_for_park(*park)?)?,
        Query::Census { park } => serde_json::to_value(report.census_for_park(*park)?)?,
        Query::Top {
            metric,
            n,
            ascending,
        } => serde_json::to_value(report.top_n_by_metric(metric, *n, *ascending)?)?,
        Query::AgeSex { park } => serde_json::to_value(report.age_sex_breakdown(*park)?)?,
        Query::Blocks { park, field } => {
            serde_json::to_value(report.blocks_for_park(*park, field)?)?
        }
        Query::Values { metric } => serde_json::to_value(report.metric_values(metric)?)?,
        Query::Typologies => serde_json::to_value(report.typology_codes())?,
        Query::Center { name } => serde_json::to_value(report.map_center(name))?,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radiografia_dataset::{Dataset, DatasetConfig};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn report() -> Report {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../dataset/fixtures");
        let dataset = Dataset::load(&DatasetConfig::default(), &fixtures).unwrap();
        Report::build(Arc::new(dataset)).unwrap()
    }

    #[test]
    fn check_reports_counts_and_warnings() {
        let value = run(&Query::Check, &report()).unwrap();
        assert_eq!(value["summary"]["greenAreas"], 5);
        assert_eq!(value["warnings"].as_array().unwrap().len(), 3);
        assert_eq!(value["warnings"][0]["kind"], "placeholder_value");
    }

    #[test]
    fn parks_groups_ids_by_name() {
        let value = run(&Query::Parks, &report()).unwrap();
        let clouthier = value
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == "Parque Clouthier")
            .unwrap();
        assert_eq!(clouthier["greenAreaIds"], json!([1, 2]));
    }

    #[test]
    fn top_returns_camel_case_rows() {
        let query = Query::Top {
            metric: "ranking_score".to_string(),
            n: 2,
            ascending: false,
        };
        let value = run(&query, &report()).unwrap();
        assert_eq!(value[0]["greenAreaId"], 5);
        assert_eq!(value[1]["greenAreaId"], 1);
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_metric_is_an_error() {
        let query = Query::Values {
            metric: "not_a_field".to_string(),
        };
        let err = run(&query, &report()).unwrap_err();
        assert!(err.to_string().contains("not_a_field"));
    }

    #[test]
    fn census_of_park_without_blocks_is_null() {
        let value = run(&Query::Census { park: 2 }, &report()).unwrap();
        assert!(value.is_null());
    }
}
