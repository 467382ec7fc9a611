use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// A row of the published energy benchmarks table, before any climate adjustment.
///
/// Percentage columns hold fractions between 0 and 1. Any numeric cell may be blank.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RawBenchmark {
    #[serde(rename = "Benchmark")]
    pub name: String,
    #[serde(rename = "Typical Area [m²]")]
    pub typical_area_m2: Option<f64>,
    #[serde(rename = "Area Upper Bound [m²]")]
    pub area_upper_bound_m2: Option<f64>,
    #[serde(rename = "Typical electricity [kWh/m²y]")]
    pub typical_electricity_kwh_per_m2y: Option<f64>,
    #[serde(rename = "Typical fossil fuel [kWh/m²y]")]
    pub typical_fossil_fuel_kwh_per_m2y: Option<f64>,
    #[serde(rename = "% electricity pro-rated to degree days")]
    pub electricity_prorated_to_degree_days: Option<f64>,
    #[serde(rename = "% fossil fuel pro-rated to degree days")]
    pub fossil_fuel_prorated_to_degree_days: Option<f64>,
    #[serde(rename = "% suitable for DH or HP")]
    pub suitable_for_district_heating_or_heat_pump: Option<f64>,
    #[serde(rename = "Industrial space heat [kWh/m²y]")]
    pub industrial_space_heat_kwh_per_m2y: Option<f64>,
    #[serde(rename = "Industrial process energy [kWh/m²y]")]
    pub industrial_process_energy_kwh_per_m2y: Option<f64>,
    #[serde(rename = "Industrial building total [kWh/m²y]")]
    pub industrial_building_total_kwh_per_m2y: Option<f64>,
}

/// A valuation office property record. Columns other than those named here are ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RawBuilding {
    #[serde(rename = "PropertyNo")]
    pub property_no: String,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Use1")]
    pub use1: Option<String>,
    #[serde(rename = "Use2")]
    pub use2: Option<String>,
    #[serde(rename = "List_Status")]
    pub list_status: Option<String>,
    #[serde(rename = "Total_SQM")]
    pub total_sqm: Option<f64>,
    #[serde(rename = "X_ITM")]
    pub x_itm: Option<f64>,
    #[serde(rename = "Y_ITM")]
    pub y_itm: Option<f64>,
}

impl RawBuilding {
    pub(crate) fn coordinate(&self) -> Option<(f64, f64)> {
        Some((self.x_itm?, self.y_itm?))
    }
}

pub fn read_benchmarks(csv: impl Read) -> anyhow::Result<Vec<RawBenchmark>> {
    csv::Reader::from_reader(csv)
        .deserialize::<RawBenchmark>()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("Could not read benchmark on row {}", idx + 1)))
        .collect()
}

pub fn read_buildings(csv: impl Read) -> anyhow::Result<Vec<RawBuilding>> {
    csv::Reader::from_reader(csv)
        .deserialize::<RawBuilding>()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("Could not read building on row {}", idx + 1)))
        .collect()
}
