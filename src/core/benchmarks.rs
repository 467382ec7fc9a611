use crate::config::ClimateConfig;
use crate::input::RawBenchmark;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A benchmark whose energy intensities have been normalised to the local climate.
///
/// An intensity is `None` whenever one of the raw values it is derived from was missing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WeatherAdjustedBenchmark {
    #[serde(rename = "Benchmark")]
    pub name: String,
    pub typical_area_m2: Option<f64>,
    pub area_upper_bound_m2: Option<f64>,
    pub typical_electricity_kwh_per_m2y: Option<f64>,
    pub typical_fossil_fuel_kwh_per_m2y: Option<f64>,
    pub typical_building_energy_kwh_per_m2y: Option<f64>,
    pub typical_process_energy_kwh_per_m2y: Option<f64>,
    pub typical_electricity_heat_kwh_per_m2y: Option<f64>,
    pub typical_fossil_fuel_heat_kwh_per_m2y: Option<f64>,
    pub typical_industrial_low_temperature_heat_kwh_per_m2y: Option<f64>,
    pub typical_industrial_high_temperature_heat_kwh_per_m2y: Option<f64>,
}

/// An intensity split by whether it scales with heating degree days.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct IntensitySplit {
    pub(crate) weather_dependent: f64,
    pub(crate) weather_independent: f64,
}

impl IntensitySplit {
    pub(crate) fn total(&self) -> f64 {
        self.weather_dependent + self.weather_independent
    }
}

/// Splits a raw intensity into the fraction pro-rated to degree days, rescaled by
/// `degree_day_factor`, and the remainder which is left untouched.
pub(crate) fn split_intensity(
    raw_kwh_per_m2y: Option<f64>,
    prorated_fraction: Option<f64>,
    degree_day_factor: f64,
) -> Option<IntensitySplit> {
    let raw = raw_kwh_per_m2y?;
    let prorated_fraction = prorated_fraction?;

    Some(IntensitySplit {
        weather_dependent: raw * prorated_fraction * degree_day_factor,
        weather_independent: raw * (1. - prorated_fraction),
    })
}

impl WeatherAdjustedBenchmark {
    pub fn from_raw(raw: &RawBenchmark, degree_day_factor: f64) -> Self {
        let suitable = raw.suitable_for_district_heating_or_heat_pump;

        let electricity = split_intensity(
            raw.typical_electricity_kwh_per_m2y,
            raw.electricity_prorated_to_degree_days,
            degree_day_factor,
        );
        let fossil_fuel = split_intensity(
            raw.typical_fossil_fuel_kwh_per_m2y,
            raw.fossil_fuel_prorated_to_degree_days,
            degree_day_factor,
        );

        // space heating is taken to be the only electrical heat load
        let electricity_heat = electricity
            .zip(suitable)
            .map(|(split, suitable)| split.weather_dependent * suitable);

        // fossil fuel is taken to be burnt only for space heating and hot water
        let fossil_fuel_heat = fossil_fuel
            .zip(suitable)
            .map(|(split, suitable)| split.total() * suitable);

        let process = raw.industrial_process_energy_kwh_per_m2y;
        let industrial_low_temperature_heat = raw
            .industrial_space_heat_kwh_per_m2y
            .zip(process)
            .zip(suitable)
            .map(|((space_heat, process), suitable)| {
                space_heat * degree_day_factor + process * suitable
            });
        let industrial_high_temperature_heat = process
            .zip(suitable)
            .map(|(process, suitable)| process * (1. - suitable));

        Self {
            name: raw.name.clone(),
            typical_area_m2: raw.typical_area_m2,
            area_upper_bound_m2: raw.area_upper_bound_m2,
            typical_electricity_kwh_per_m2y: electricity.map(|split| split.total()),
            typical_fossil_fuel_kwh_per_m2y: fossil_fuel.map(|split| split.total()),
            typical_building_energy_kwh_per_m2y: raw.industrial_building_total_kwh_per_m2y,
            typical_process_energy_kwh_per_m2y: process,
            typical_electricity_heat_kwh_per_m2y: electricity_heat,
            typical_fossil_fuel_heat_kwh_per_m2y: fossil_fuel_heat,
            typical_industrial_low_temperature_heat_kwh_per_m2y: industrial_low_temperature_heat,
            typical_industrial_high_temperature_heat_kwh_per_m2y: industrial_high_temperature_heat,
        }
    }
}

/// Normalises every benchmark to the local climate described by `climate`.
#[instrument(skip_all)]
pub fn weather_adjust_benchmarks(
    benchmarks: &[RawBenchmark],
    climate: &ClimateConfig,
) -> Vec<WeatherAdjustedBenchmark> {
    let degree_day_factor = climate.degree_day_factor();

    benchmarks
        .iter()
        .map(|raw| WeatherAdjustedBenchmark::from_raw(raw, degree_day_factor))
        .collect()
}
