use crate::config::UNKNOWN_BENCHMARK;
use crate::core::benchmarks::WeatherAdjustedBenchmark;
use crate::input::RawBuilding;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Lookup from a free-text building use onto the name of the benchmark it belongs to.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UseMapping(IndexMap<String, String>);

impl UseMapping {
    /// Maps `building_use` onto `category`, returning the category it was previously mapped onto.
    pub fn insert(&mut self, building_use: &str, category: &str) -> Option<String> {
        self.0
            .insert(building_use.to_string(), category.to_string())
    }

    pub fn category_for(&self, building_use: &str) -> Option<&str> {
        self.0.get(building_use).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The benchmark for `building_use`, falling back to the unknown benchmark when the use is
    /// absent or unmapped.
    pub fn benchmark_for(&self, building_use: Option<&str>) -> &str {
        building_use
            .and_then(|building_use| self.category_for(building_use))
            .unwrap_or(UNKNOWN_BENCHMARK)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UseMapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(building_use, category)| (building_use.into(), category.into()))
                .collect(),
        )
    }
}

/// A building joined onto the benchmark for its use.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkedBuilding {
    pub building: RawBuilding,
    pub benchmark: String,
    /// `None` when no benchmark row exists with the name in `benchmark`, and always `None` for the
    /// unknown benchmark.
    pub benchmark_row: Option<Arc<WeatherAdjustedBenchmark>>,
}

impl BenchmarkedBuilding {
    pub fn is_unknown(&self) -> bool {
        self.benchmark == UNKNOWN_BENCHMARK
    }
}

/// Left joins every building onto its benchmark via its primary use.
#[instrument(skip_all)]
pub fn match_benchmarks(
    buildings: Vec<RawBuilding>,
    uses: &UseMapping,
    benchmarks: &[WeatherAdjustedBenchmark],
) -> Vec<BenchmarkedBuilding> {
    let benchmarks_by_name = index_benchmarks(benchmarks);

    let matched: Vec<BenchmarkedBuilding> = buildings
        .into_iter()
        .map(|building| {
            let benchmark = uses.benchmark_for(building.use1.as_deref()).to_string();
            // the unknown benchmark never carries intensities, even if the table has a row for it
            let benchmark_row = if benchmark == UNKNOWN_BENCHMARK {
                None
            } else {
                benchmarks_by_name.get(&benchmark).cloned()
            };

            BenchmarkedBuilding {
                building,
                benchmark,
                benchmark_row,
            }
        })
        .collect();

    debug!(
        "{} of {} buildings have an unknown benchmark",
        matched.iter().filter(|building| building.is_unknown()).count(),
        matched.len()
    );

    matched
}

fn index_benchmarks(
    benchmarks: &[WeatherAdjustedBenchmark],
) -> IndexMap<String, Arc<WeatherAdjustedBenchmark>> {
    let mut benchmarks_by_name = IndexMap::with_capacity(benchmarks.len());
    for benchmark in benchmarks {
        if benchmarks_by_name.contains_key(&benchmark.name) {
            warn!(
                "Benchmark '{}' appears more than once, only its first row is used",
                benchmark.name
            );
            continue;
        }
        benchmarks_by_name.insert(benchmark.name.clone(), Arc::new(benchmark.clone()));
    }

    benchmarks_by_name
}

/// Distinct primary uses of buildings which could not be matched to a benchmark, in the order they
/// were first encountered.
pub fn unknown_benchmark_uses(buildings: &[BenchmarkedBuilding]) -> Vec<String> {
    buildings
        .iter()
        .filter(|building| building.is_unknown())
        .filter_map(|building| building.building.use1.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn uses() -> UseMapping {
        UseMapping::from_iter([
            ("OFFICE (OVER 1000 M2)", "General office"),
            ("SHOP", "General retail"),
            ("CHURCH", "None"),
        ])
    }

    #[fixture]
    fn benchmarks() -> Vec<WeatherAdjustedBenchmark> {
        vec![
            WeatherAdjustedBenchmark {
                name: "General office".to_string(),
                typical_area_m2: Some(200.),
                area_upper_bound_m2: Some(300.),
                typical_fossil_fuel_kwh_per_m2y: Some(104.572),
                ..Default::default()
            },
            WeatherAdjustedBenchmark {
                name: "None".to_string(),
                ..Default::default()
            },
        ]
    }

    fn building(property_no: &str, use1: Option<&str>) -> RawBuilding {
        RawBuilding {
            property_no: property_no.to_string(),
            use1: use1.map(str::to_string),
            total_sqm: Some(100.),
            ..Default::default()
        }
    }

    #[rstest]
    fn should_join_buildings_onto_their_benchmark(
        uses: UseMapping,
        benchmarks: Vec<WeatherAdjustedBenchmark>,
    ) {
        let matched = match_benchmarks(
            vec![building("1", Some("OFFICE (OVER 1000 M2)"))],
            &uses,
            &benchmarks,
        );

        assert_eq!(matched[0].benchmark, "General office");
        assert_eq!(
            matched[0].benchmark_row.as_deref(),
            Some(&benchmarks[0])
        );
    }

    #[rstest]
    fn should_assign_unknown_to_unmapped_and_missing_uses(
        uses: UseMapping,
        benchmarks: Vec<WeatherAdjustedBenchmark>,
    ) {
        let matched = match_benchmarks(
            vec![building("1", Some("LIGHTHOUSE")), building("2", None)],
            &uses,
            &benchmarks,
        );

        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(BenchmarkedBuilding::is_unknown));
        assert!(matched.iter().all(|b| b.benchmark_row.is_none()));
    }

    #[rstest]
    fn should_not_join_unknown_benchmark_onto_a_table_row(uses: UseMapping) {
        let benchmarks = vec![WeatherAdjustedBenchmark {
            name: "Unknown".to_string(),
            typical_electricity_kwh_per_m2y: Some(100.),
            ..Default::default()
        }];

        let matched = match_benchmarks(vec![building("1", Some("LIGHTHOUSE"))], &uses, &benchmarks);

        assert!(matched[0].is_unknown());
        assert_eq!(matched[0].benchmark_row, None);
    }

    #[rstest]
    fn should_keep_buildings_whose_benchmark_has_no_row(
        uses: UseMapping,
        benchmarks: Vec<WeatherAdjustedBenchmark>,
    ) {
        let matched = match_benchmarks(vec![building("1", Some("SHOP"))], &uses, &benchmarks);

        assert_eq!(matched[0].benchmark, "General retail");
        assert_eq!(matched[0].benchmark_row, None);
        assert!(!matched[0].is_unknown());
    }

    #[rstest]
    fn should_use_first_row_of_repeated_benchmarks(uses: UseMapping) {
        let benchmarks = vec![
            WeatherAdjustedBenchmark {
                name: "General office".to_string(),
                typical_area_m2: Some(1.),
                ..Default::default()
            },
            WeatherAdjustedBenchmark {
                name: "General office".to_string(),
                typical_area_m2: Some(2.),
                ..Default::default()
            },
        ];
        let matched = match_benchmarks(
            vec![building("1", Some("OFFICE (OVER 1000 M2)"))],
            &uses,
            &benchmarks,
        );

        assert_eq!(
            matched[0].benchmark_row.as_ref().unwrap().typical_area_m2,
            Some(1.)
        );
    }

    #[rstest]
    fn should_list_each_unknown_use_once_in_order_seen(
        uses: UseMapping,
        benchmarks: Vec<WeatherAdjustedBenchmark>,
    ) {
        let matched = match_benchmarks(
            vec![
                building("1", Some("LIGHTHOUSE")),
                building("2", Some("SHOP")),
                building("3", Some("BANDSTAND")),
                building("4", None),
                building("5", Some("LIGHTHOUSE")),
            ],
            &uses,
            &benchmarks,
        );

        assert_eq!(
            unknown_benchmark_uses(&matched),
            vec!["LIGHTHOUSE", "BANDSTAND"]
        );
    }
}
