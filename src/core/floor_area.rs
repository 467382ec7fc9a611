use crate::config::PipelineConfig;
use crate::core::benchmark_matcher::BenchmarkedBuilding;
use serde::Serialize;
use tracing::{debug, instrument};

/// A benchmarked building whose floor area has had implausibly large values replaced.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundedBuilding {
    pub matched: BenchmarkedBuilding,
    pub bounded_area_m2: Option<f64>,
}

impl BoundedBuilding {
    pub fn recorded_area_m2(&self) -> Option<f64> {
        self.matched.building.total_sqm
    }
}

/// Recorded floor area unless it is positive, above the benchmark's upper bound and the benchmark
/// is valid, in which case the benchmark's typical area is used instead.
pub(crate) fn bounded_area_m2(
    recorded_area_m2: Option<f64>,
    area_upper_bound_m2: Option<f64>,
    typical_area_m2: Option<f64>,
    valid_benchmark: bool,
) -> Option<f64> {
    match (recorded_area_m2, area_upper_bound_m2) {
        (Some(recorded), Some(upper_bound))
            if valid_benchmark && recorded > 0. && recorded > upper_bound =>
        {
            typical_area_m2
        }
        _ => recorded_area_m2,
    }
}

#[instrument(skip_all)]
pub fn bound_floor_areas(
    buildings: Vec<BenchmarkedBuilding>,
    config: &PipelineConfig,
) -> Vec<BoundedBuilding> {
    let mut replaced = 0usize;

    let bounded: Vec<BoundedBuilding> = buildings
        .into_iter()
        .map(|matched| {
            let row = matched.benchmark_row.as_deref();
            let recorded = matched.building.total_sqm;
            let bounded_area_m2 = bounded_area_m2(
                recorded,
                row.and_then(|row| row.area_upper_bound_m2),
                row.and_then(|row| row.typical_area_m2),
                config.is_valid_benchmark(&matched.benchmark),
            );
            if bounded_area_m2 != recorded {
                replaced += 1;
            }

            BoundedBuilding {
                matched,
                bounded_area_m2,
            }
        })
        .collect();

    debug!("Replaced {replaced} floor areas with typical benchmark areas");

    bounded
}

#[derive(Debug, Serialize)]
pub(crate) struct BoundedAreaRow<'a> {
    #[serde(rename = "PropertyNo")]
    pub(crate) property_no: &'a str,
    pub(crate) bounded_area_m2: Option<f64>,
}

impl<'a> From<&'a BoundedBuilding> for BoundedAreaRow<'a> {
    fn from(building: &'a BoundedBuilding) -> Self {
        Self {
            property_no: &building.matched.building.property_no,
            bounded_area_m2: building.bounded_area_m2,
        }
    }
}
