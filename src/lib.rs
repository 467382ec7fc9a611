pub mod config;
pub mod core;
pub mod errors;
pub mod input;
pub mod output;
pub mod output_writer;
pub mod read_benchmark_uses;
pub mod read_boundaries;

use crate::config::PipelineConfig;
use crate::core::aggregation::{
    aggregate_to_small_areas, link_small_areas_to_local_authorities, SmallAreaDemand,
};
use crate::core::benchmark_matcher::{match_benchmarks, unknown_benchmark_uses, UseMapping};
use crate::core::benchmarks::{weather_adjust_benchmarks, WeatherAdjustedBenchmark};
use crate::core::demand::derive_demands;
use crate::core::floor_area::bound_floor_areas;
use crate::core::spatial_linker::{
    link_to_small_areas, unlinked, LinkedBuilding, LocalAuthorityBoundary, SmallAreaBoundary,
};
use crate::errors::{OutputError, PipelineError};
use crate::input::{RawBenchmark, RawBuilding};
use crate::output::Output;
use crate::output_writer::{
    write_benchmark_uses, write_bounded_areas, write_buildings, write_normalised_benchmarks,
    write_small_area_demands, write_unknown_benchmark_uses, BuildingColumns,
};
use anyhow::anyhow;
use bitflags::bitflags;
use tracing::{info, instrument};

bitflags! {
    /// Optional outputs of a run.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ProjectFlags: u32 {
        const UNKNOWN_USES = 0b1;
        const BOUNDED_AREAS = 0b10;
    }
}

/// Everything a run reads, already parsed.
#[derive(Clone, Debug, Default)]
pub struct ProjectInput {
    pub buildings: Vec<RawBuilding>,
    pub benchmarks: Vec<RawBenchmark>,
    pub benchmark_uses: UseMapping,
    pub small_areas: Option<Vec<SmallAreaBoundary>>,
    pub local_authorities: Option<Vec<LocalAuthorityBoundary>>,
}

#[derive(Debug)]
pub struct RunResults {
    pub benchmarks: Vec<WeatherAdjustedBenchmark>,
    pub unknown_benchmark_uses: Vec<String>,
    pub buildings: Vec<LinkedBuilding>,
    pub small_areas: Vec<SmallAreaDemand>,
}

/// Estimates the demand of every building and, when boundaries are given, links each to its small
/// area and totals demand per small area. Tables are written to `output` as each stage completes.
#[instrument(skip_all)]
pub fn run_project(
    input: ProjectInput,
    config: &PipelineConfig,
    columns: &BuildingColumns,
    output: impl Output,
    flags: &ProjectFlags,
) -> Result<RunResults, PipelineError> {
    let ProjectInput {
        buildings,
        benchmarks,
        benchmark_uses,
        small_areas,
        local_authorities,
    } = input;

    if local_authorities.is_some() && small_areas.is_none() {
        return Err(
            anyhow!("Local authority boundaries were given without small area boundaries").into(),
        );
    }

    info!(
        "Estimating demand of {} buildings with {} benchmarks and {} mapped uses",
        buildings.len(),
        benchmarks.len(),
        benchmark_uses.len()
    );

    let benchmarks = weather_adjust_benchmarks(&benchmarks, &config.climate);
    in_output(&output, || {
        write_normalised_benchmarks(&output, &benchmarks)?;
        write_benchmark_uses(&output, &benchmark_uses)
    })?;

    let matched = match_benchmarks(buildings, &benchmark_uses, &benchmarks);
    let unknown_uses = unknown_benchmark_uses(&matched);
    if flags.contains(ProjectFlags::UNKNOWN_USES) {
        in_output(&output, || write_unknown_benchmark_uses(&output, &unknown_uses))?;
    }

    let bounded = bound_floor_areas(matched, config);
    let demands = derive_demands(bounded, config.boiler_efficiency);
    if flags.contains(ProjectFlags::BOUNDED_AREAS) {
        in_output(&output, || write_bounded_areas(&output, &demands))?;
    }

    let (buildings, small_area_demands) = match small_areas {
        Some(small_areas) => {
            let small_areas = match local_authorities {
                Some(local_authorities) => link_small_areas_to_local_authorities(
                    small_areas,
                    &local_authorities,
                    config.edge_policy,
                ),
                None => small_areas,
            };

            let linked = link_to_small_areas(demands, &small_areas, config.edge_policy);
            let totals = aggregate_to_small_areas(&linked, &small_areas);
            in_output(&output, || write_small_area_demands(&output, &totals))?;
            (linked, totals)
        }
        None => (unlinked(demands), vec![]),
    };

    in_output(&output, || write_buildings(&output, &buildings, columns))?;
    info!("Run complete");

    Ok(RunResults {
        benchmarks,
        unknown_benchmark_uses: unknown_uses,
        buildings,
        small_areas: small_area_demands,
    })
}

fn in_output(
    output: &impl Output,
    write: impl FnOnce() -> anyhow::Result<()>,
) -> Result<(), PipelineError> {
    if output.is_noop() {
        return Ok(());
    }
    write().map_err(|err| PipelineError::ErrorInOutput(OutputError::new(err)))
}
