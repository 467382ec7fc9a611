use crate::core::benchmarks::WeatherAdjustedBenchmark;
use crate::core::floor_area::BoundedBuilding;
use crate::core::units::kwh_to_mwh;
use rayon::prelude::*;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use tracing::instrument;

/// The annual demands estimated for every building, named by the column they are written to.
#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    PartialEq,
)]
pub enum DemandField {
    #[strum(serialize = "electricity_demand_mwh_per_y")]
    Electricity,
    #[strum(serialize = "fossil_fuel_demand_mwh_per_y")]
    FossilFuel,
    #[strum(serialize = "building_energy_mwh_per_y")]
    BuildingEnergy,
    #[strum(serialize = "process_energy_mwh_per_y")]
    ProcessEnergy,
    #[strum(serialize = "electricity_heat_demand_mwh_per_y")]
    ElectricityHeat,
    #[strum(serialize = "fossil_fuel_heat_demand_mwh_per_y")]
    FossilFuelHeat,
    #[strum(serialize = "industrial_low_temperature_heat_demand_mwh_per_y")]
    IndustrialLowTemperatureHeat,
    #[strum(serialize = "industrial_high_temperature_heat_demand_mwh_per_y")]
    IndustrialHighTemperatureHeat,
    /// Heat a district heating network could supply: fossil fuel heat plus low temperature
    /// industrial heat.
    #[strum(serialize = "heat_demand_mwh_per_y")]
    Heat,
}

impl DemandField {
    /// The benchmark intensity this demand is derived from, or `None` for demands built from other
    /// demands.
    fn intensity(&self, benchmark: &WeatherAdjustedBenchmark) -> Option<f64> {
        match self {
            DemandField::Electricity => benchmark.typical_electricity_kwh_per_m2y,
            DemandField::FossilFuel => benchmark.typical_fossil_fuel_kwh_per_m2y,
            DemandField::BuildingEnergy => benchmark.typical_building_energy_kwh_per_m2y,
            DemandField::ProcessEnergy => benchmark.typical_process_energy_kwh_per_m2y,
            DemandField::ElectricityHeat => benchmark.typical_electricity_heat_kwh_per_m2y,
            DemandField::FossilFuelHeat => benchmark.typical_fossil_fuel_heat_kwh_per_m2y,
            DemandField::IndustrialLowTemperatureHeat => {
                benchmark.typical_industrial_low_temperature_heat_kwh_per_m2y
            }
            DemandField::IndustrialHighTemperatureHeat => {
                benchmark.typical_industrial_high_temperature_heat_kwh_per_m2y
            }
            DemandField::Heat => None,
        }
    }

    /// Whether this demand is met by burning fossil fuel and so scaled by boiler efficiency.
    fn is_fossil_fuel_derived(&self) -> bool {
        matches!(self, DemandField::FossilFuel | DemandField::FossilFuelHeat)
    }
}

/// Annual demands of a single building in MWh/year. Every value is finite and non-negative.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DemandEstimate {
    pub electricity: f64,
    pub fossil_fuel: f64,
    pub building_energy: f64,
    pub process_energy: f64,
    pub electricity_heat: f64,
    pub fossil_fuel_heat: f64,
    pub industrial_low_temperature_heat: f64,
    pub industrial_high_temperature_heat: f64,
}

impl DemandEstimate {
    pub fn get(&self, field: DemandField) -> f64 {
        match field {
            DemandField::Electricity => self.electricity,
            DemandField::FossilFuel => self.fossil_fuel,
            DemandField::BuildingEnergy => self.building_energy,
            DemandField::ProcessEnergy => self.process_energy,
            DemandField::ElectricityHeat => self.electricity_heat,
            DemandField::FossilFuelHeat => self.fossil_fuel_heat,
            DemandField::IndustrialLowTemperatureHeat => self.industrial_low_temperature_heat,
            DemandField::IndustrialHighTemperatureHeat => self.industrial_high_temperature_heat,
            DemandField::Heat => self.fossil_fuel_heat + self.industrial_low_temperature_heat,
        }
    }

    pub fn from_benchmark(
        bounded_area_m2: Option<f64>,
        benchmark: Option<&WeatherAdjustedBenchmark>,
        boiler_efficiency: f64,
    ) -> Self {
        let demand = |field: DemandField| {
            let intensity = benchmark.and_then(|benchmark| field.intensity(benchmark));
            let efficiency = if field.is_fossil_fuel_derived() {
                boiler_efficiency
            } else {
                1.
            };
            annual_demand_mwh(bounded_area_m2, intensity, efficiency)
        };

        Self {
            electricity: demand(DemandField::Electricity),
            fossil_fuel: demand(DemandField::FossilFuel),
            building_energy: demand(DemandField::BuildingEnergy),
            process_energy: demand(DemandField::ProcessEnergy),
            electricity_heat: demand(DemandField::ElectricityHeat),
            fossil_fuel_heat: demand(DemandField::FossilFuelHeat),
            industrial_low_temperature_heat: demand(DemandField::IndustrialLowTemperatureHeat),
            industrial_high_temperature_heat: demand(DemandField::IndustrialHighTemperatureHeat),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DemandField, f64)> + '_ {
        DemandField::iter().map(|field| (field, self.get(field)))
    }
}

/// Demand in MWh/year of a floor area at a benchmark intensity in kWh/m²/year. A missing or
/// non-positive area, a missing intensity or an invalid product all count as zero demand.
pub(crate) fn annual_demand_mwh(
    area_m2: Option<f64>,
    intensity_kwh_per_m2y: Option<f64>,
    efficiency: f64,
) -> f64 {
    let (Some(area_m2), Some(intensity)) = (area_m2.filter(|area| *area > 0.), intensity_kwh_per_m2y)
    else {
        return 0.;
    };
    let demand = kwh_to_mwh(area_m2 * intensity) * efficiency;

    if demand.is_finite() && demand > 0. {
        demand
    } else {
        0.
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildingDemand {
    pub bounded: BoundedBuilding,
    pub demand: DemandEstimate,
}

impl BuildingDemand {
    pub fn property_no(&self) -> &str {
        &self.bounded.matched.building.property_no
    }

    pub fn benchmark(&self) -> &str {
        &self.bounded.matched.benchmark
    }
}

/// Applies benchmark intensities to the bounded floor area of every building. Buildings are
/// independent of one another so are processed in parallel; output order matches input order.
#[instrument(skip_all)]
pub fn derive_demands(buildings: Vec<BoundedBuilding>, boiler_efficiency: f64) -> Vec<BuildingDemand> {
    buildings
        .into_par_iter()
        .map(|bounded| {
            let demand = DemandEstimate::from_benchmark(
                bounded.bounded_area_m2,
                bounded.matched.benchmark_row.as_deref(),
                boiler_efficiency,
            );
            BuildingDemand { bounded, demand }
        })
        .collect()
}
