use crate::core::spatial_linker::EdgePolicy;
use crate::core::units::{DegreeDays, DUBLIN_AIRPORT_DEGREE_DAYS, TM46_DEGREE_DAYS};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::io::{BufReader, Read};
use thiserror::Error;

/// Benchmark name given to buildings whose use could not be mapped to a benchmark.
pub const UNKNOWN_BENCHMARK: &str = "Unknown";

/// Benchmark name the published benchmark uses for buildings with no energy demand.
pub const NONE_BENCHMARK: &str = "None";

const DEFAULT_BOILER_EFFICIENCY: f64 = 0.9;

/// All tunable assumptions of a pipeline run. Built once and passed by reference to each stage.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub climate: ClimateConfig,
    /// Efficiency applied to fossil fuel derived demand. Not range-checked, so callers must supply a
    /// physically sensible value.
    pub boiler_efficiency: f64,
    /// Benchmarks whose typical floor area must never stand in for a recorded floor area.
    #[validate(unique_items)]
    pub invalid_benchmarks: Vec<String>,
    #[validate]
    pub boundary_properties: BoundaryProperties,
    pub edge_policy: EdgePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            climate: Default::default(),
            boiler_efficiency: DEFAULT_BOILER_EFFICIENCY,
            invalid_benchmarks: vec![UNKNOWN_BENCHMARK.to_string(), NONE_BENCHMARK.to_string()],
            boundary_properties: Default::default(),
            edge_policy: Default::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: impl Read) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_reader(BufReader::new(json))
            .context("Could not parse pipeline configuration")?;
        config
            .validate()
            .map_err(|errors| InvalidConfigError(errors.to_string()))?;

        Ok(config)
    }

    pub(crate) fn is_valid_benchmark(&self, benchmark: &str) -> bool {
        !self
            .invalid_benchmarks
            .iter()
            .any(|invalid| invalid == benchmark)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClimateConfig {
    pub local_degree_days: DegreeDays,
    pub reference_degree_days: DegreeDays,
}

impl ClimateConfig {
    pub fn degree_day_factor(&self) -> f64 {
        self.local_degree_days.ratio_to(self.reference_degree_days)
    }
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            local_degree_days: DUBLIN_AIRPORT_DEGREE_DAYS,
            reference_degree_days: TM46_DEGREE_DAYS,
        }
    }
}

/// Names of the feature properties read from boundary files.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct BoundaryProperties {
    #[validate(min_length = 1)]
    pub small_area_id: String,
    #[validate(min_length = 1)]
    pub county_name: String,
    #[validate(min_length = 1)]
    pub local_authority_name: String,
    /// Name property of the features of a separate local authority boundaries file.
    #[validate(min_length = 1)]
    pub local_authority_boundary_name: String,
}

impl Default for BoundaryProperties {
    fn default() -> Self {
        Self {
            small_area_id: "small_area".to_string(),
            county_name: "countyname".to_string(),
            local_authority_name: "local_authority".to_string(),
            local_authority_boundary_name: "COUNTYNAME".to_string(),
        }
    }
}

#[derive(Debug, Error)]
#[error("Pipeline configuration is invalid: {0}")]
pub struct InvalidConfigError(String);
