use crate::core::demand::DemandField;
use crate::core::spatial_linker::{
    BoundaryLocator, EdgePolicy, LinkedBuilding, LocalAuthorityBoundary, SmallAreaBoundary,
};
use crate::core::units::{m2_to_km2, mwh_to_tj, IRISH_TRANSVERSE_MERCATOR_EPSG};
use geo::{Area, InteriorPoint};
use indexmap::IndexMap;
use strum::IntoEnumIterator;
use tracing::{debug, instrument, warn};

/// Assigns every small area the local authority containing a representative point of it. Small
/// areas whose point lies in no local authority are dropped, so the result may be empty.
#[instrument(skip_all)]
pub fn link_small_areas_to_local_authorities(
    small_areas: Vec<SmallAreaBoundary>,
    local_authorities: &[LocalAuthorityBoundary],
    edge_policy: EdgePolicy,
) -> Vec<SmallAreaBoundary> {
    let locator = BoundaryLocator::new(local_authorities, edge_policy);
    let total = small_areas.len();

    let linked: Vec<SmallAreaBoundary> = small_areas
        .into_iter()
        .filter_map(|mut small_area| {
            let point = small_area.geometry.interior_point()?;
            let index = locator.locate(point).index()?;
            small_area.names.local_authority = Some(locator.boundary(index).name.clone());
            Some(small_area)
        })
        .collect();

    if linked.is_empty() && total > 0 {
        warn!(
            "None of {total} small areas lie within any of {} local authorities, \
             check both are in EPSG:{IRISH_TRANSVERSE_MERCATOR_EPSG}",
            local_authorities.len()
        );
    }
    debug!(
        "Linked {} of {total} small areas to local authorities",
        linked.len()
    );

    linked
}

/// Totals of every building linked to one small area.
#[derive(Clone, Debug, PartialEq)]
pub struct SmallAreaDemand {
    pub small_area: String,
    pub county_name: Option<String>,
    pub local_authority: Option<String>,
    pub number_of_buildings: usize,
    pub bounded_area_m2: f64,
    pub demand_mwh_per_y: IndexMap<DemandField, f64>,
    pub polygon_area_km2: f64,
}

impl SmallAreaDemand {
    fn new(boundary: &SmallAreaBoundary) -> Self {
        Self {
            small_area: boundary.names.small_area.clone(),
            county_name: boundary.names.county_name.clone(),
            local_authority: boundary.names.local_authority.clone(),
            number_of_buildings: 0,
            bounded_area_m2: 0.,
            demand_mwh_per_y: DemandField::iter().map(|field| (field, 0.)).collect(),
            polygon_area_km2: 0.,
        }
    }

    fn add(&mut self, building: &LinkedBuilding) {
        self.number_of_buildings += 1;
        self.bounded_area_m2 += building
            .demand
            .bounded
            .bounded_area_m2
            .filter(|area| area.is_finite())
            .unwrap_or(0.);
        for (field, value) in building.demand.demand.iter() {
            *self.demand_mwh_per_y.entry(field).or_insert(0.) += value;
        }
    }

    /// Heat demand density in TJ/km²/year, or `None` for a small area with no extent.
    pub fn heat_demand_tj_per_km2y(&self) -> Option<f64> {
        (self.polygon_area_km2 > 0.).then(|| {
            mwh_to_tj(self.demand_mwh_per_y[&DemandField::Heat]) / self.polygon_area_km2
        })
    }
}

/// Sums the demands of linked buildings per small area. Small areas are returned in `small_areas`
/// order, and those with no linked buildings are omitted.
#[instrument(skip_all)]
pub fn aggregate_to_small_areas(
    buildings: &[LinkedBuilding],
    small_areas: &[SmallAreaBoundary],
) -> Vec<SmallAreaDemand> {
    let mut totals: IndexMap<&str, SmallAreaDemand> = IndexMap::with_capacity(small_areas.len());
    for boundary in small_areas {
        totals
            .entry(boundary.names.small_area.as_str())
            .or_insert_with(|| SmallAreaDemand::new(boundary))
            .polygon_area_km2 += m2_to_km2(boundary.geometry.unsigned_area());
    }

    for building in buildings {
        let Some(boundary) = &building.boundary else {
            continue;
        };
        if let Some(total) = totals.get_mut(boundary.small_area.as_str()) {
            total.add(building);
        }
    }

    totals
        .into_values()
        .filter(|total| total.number_of_buildings > 0)
        .collect()
}
