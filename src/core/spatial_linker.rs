use crate::core::demand::BuildingDemand;
use crate::core::units::IRISH_TRANSVERSE_MERCATOR_EPSG;
use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// How a point lying exactly on a boundary edge, and so in no boundary's interior, is linked.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Leave the point unlinked, so the building is dropped.
    #[default]
    Drop,
    /// Link the point to the first boundary, in file order, whose closed geometry touches it.
    FirstIntersecting,
}

/// Anything with a polygon footprint that points can be located within.
pub trait BoundaryGeometry {
    fn geometry(&self) -> &MultiPolygon<f64>;
}

/// A census small area, carrying the administrative areas it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct SmallAreaBoundary {
    pub names: BoundaryNames,
    pub geometry: MultiPolygon<f64>,
}

impl BoundaryGeometry for SmallAreaBoundary {
    fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

/// A local authority, the administrative area small areas are grouped into.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalAuthorityBoundary {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl BoundaryGeometry for LocalAuthorityBoundary {
    fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundaryNames {
    pub small_area: String,
    pub county_name: Option<String>,
    pub local_authority: Option<String>,
}

/// Where a point was found among a set of boundaries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Location {
    /// In the interior of the boundary at `index`, and of `overlapping` later boundaries too.
    Within { index: usize, overlapping: usize },
    /// On the edge of the boundary at `index`, in the interior of none.
    OnEdge { index: usize },
    Outside,
}

impl Location {
    pub fn index(&self) -> Option<usize> {
        match self {
            Location::Within { index, .. } | Location::OnEdge { index } => Some(*index),
            Location::Outside => None,
        }
    }
}

/// Locates points among boundaries, using bounding rectangles to skip boundaries which cannot
/// contain a point.
pub struct BoundaryLocator<'a, B: BoundaryGeometry> {
    boundaries: &'a [B],
    bounding_rects: Vec<Option<Rect<f64>>>,
    edge_policy: EdgePolicy,
}

impl<'a, B: BoundaryGeometry> BoundaryLocator<'a, B> {
    pub fn new(boundaries: &'a [B], edge_policy: EdgePolicy) -> Self {
        Self {
            boundaries,
            bounding_rects: boundaries
                .iter()
                .map(|boundary| boundary.geometry().bounding_rect())
                .collect(),
            edge_policy,
        }
    }

    pub fn boundary(&self, index: usize) -> &'a B {
        &self.boundaries[index]
    }

    pub fn locate(&self, point: Point<f64>) -> Location {
        let mut within = self
            .candidates(point)
            .filter(|index| self.boundaries[*index].geometry().contains(&point));
        if let Some(index) = within.next() {
            return Location::Within {
                index,
                overlapping: within.count(),
            };
        }

        match self.edge_policy {
            EdgePolicy::Drop => Location::Outside,
            EdgePolicy::FirstIntersecting => self
                .candidates(point)
                .find(|index| self.boundaries[*index].geometry().intersects(&point))
                .map_or(Location::Outside, |index| Location::OnEdge { index }),
        }
    }

    fn candidates(&self, point: Point<f64>) -> impl Iterator<Item = usize> + '_ {
        self.bounding_rects
            .iter()
            .enumerate()
            .filter(move |(_, rect)| rect.is_some_and(|rect| rect.intersects(&point)))
            .map(|(index, _)| index)
    }
}

/// A building linked to the small area containing it.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkedBuilding {
    pub demand: BuildingDemand,
    pub boundary: Option<BoundaryNames>,
}

/// Links every building to the small area whose interior contains its coordinate.
///
/// Buildings without coordinates, or outside every small area, are dropped, so the result may be
/// empty. A building inside
/// several overlapping small areas is linked to the first of them in `boundaries` order. Edge
/// points are handled according to `edge_policy`.
#[instrument(skip_all)]
pub fn link_to_small_areas(
    buildings: Vec<BuildingDemand>,
    boundaries: &[SmallAreaBoundary],
    edge_policy: EdgePolicy,
) -> Vec<LinkedBuilding> {
    let locator = BoundaryLocator::new(boundaries, edge_policy);
    let total = buildings.len();
    let mut with_coordinate = 0usize;
    let mut in_several = 0usize;
    let mut on_edge = 0usize;

    let linked: Vec<LinkedBuilding> = buildings
        .into_iter()
        .filter_map(|demand| {
            let (x, y) = demand.bounded.matched.building.coordinate()?;
            with_coordinate += 1;
            let location = locator.locate(Point::new(x, y));
            match location {
                Location::Within { overlapping, .. } if overlapping > 0 => in_several += 1,
                Location::OnEdge { .. } => on_edge += 1,
                _ => {}
            }
            let index = location.index()?;

            Some(LinkedBuilding {
                demand,
                boundary: Some(locator.boundary(index).names.clone()),
            })
        })
        .collect();

    if linked.is_empty() && with_coordinate > 0 {
        warn!(
            "None of {with_coordinate} buildings with coordinates lie within any of {} small areas, \
             check both are in EPSG:{IRISH_TRANSVERSE_MERCATOR_EPSG}",
            boundaries.len()
        );
    }
    if in_several > 0 {
        warn!("{in_several} buildings lie within several small areas, the first was used for each");
    }
    debug!(
        "Linked {} of {total} buildings to small areas ({on_edge} on an edge), dropped {}",
        linked.len(),
        total - linked.len()
    );

    linked
}

/// Carries every building through without a small area, for runs without boundaries.
pub fn unlinked(buildings: Vec<BuildingDemand>) -> Vec<LinkedBuilding> {
    buildings
        .into_iter()
        .map(|demand| LinkedBuilding {
            demand,
            boundary: None,
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::benchmark_matcher::BenchmarkedBuilding;
    use crate::core::demand::DemandEstimate;
    use crate::core::floor_area::BoundedBuilding;
    use crate::input::RawBuilding;
    use geo::{polygon, MultiPolygon};
    use pretty_assertions::assert_eq;
    use rstest::*;

    pub(crate) fn square(min_x: f64, min_y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min_x, y: min_y),
            (x: min_x + size, y: min_y),
            (x: min_x + size, y: min_y + size),
            (x: min_x, y: min_y + size),
            (x: min_x, y: min_y),
        ]])
    }

    pub(crate) fn small_area(id: &str, geometry: MultiPolygon<f64>) -> SmallAreaBoundary {
        SmallAreaBoundary {
            names: BoundaryNames {
                small_area: id.to_string(),
                county_name: Some("DUBLIN".to_string()),
                local_authority: Some("Dublin City".to_string()),
            },
            geometry,
        }
    }

    pub(crate) fn building_at(property_no: &str, coordinate: Option<(f64, f64)>) -> BuildingDemand {
        BuildingDemand {
            bounded: BoundedBuilding {
                matched: BenchmarkedBuilding {
                    building: RawBuilding {
                        property_no: property_no.to_string(),
                        x_itm: coordinate.map(|(x, _)| x),
                        y_itm: coordinate.map(|(_, y)| y),
                        ..Default::default()
                    },
                    benchmark: "Unknown".to_string(),
                    benchmark_row: None,
                },
                bounded_area_m2: None,
            },
            demand: DemandEstimate::default(),
        }
    }

    // two adjacent squares sharing the edge x = 10, and a third overlapping the second
    #[fixture]
    fn boundaries() -> Vec<SmallAreaBoundary> {
        vec![
            small_area("A", square(0., 0., 10.)),
            small_area("B", square(10., 0., 10.)),
            small_area("C", square(15., 0., 10.)),
        ]
    }

    fn linked_ids(linked: &[LinkedBuilding]) -> Vec<(&str, &str)> {
        linked
            .iter()
            .map(|building| {
                (
                    building.demand.property_no(),
                    building.boundary.as_ref().unwrap().small_area.as_str(),
                )
            })
            .collect()
    }

    #[rstest]
    fn should_link_point_to_the_small_area_containing_it(boundaries: Vec<SmallAreaBoundary>) {
        let linked = link_to_small_areas(
            vec![building_at("1", Some((5., 5.))), building_at("2", Some((12., 5.)))],
            &boundaries,
            EdgePolicy::Drop,
        );

        assert_eq!(linked_ids(&linked), vec![("1", "A"), ("2", "B")]);
        assert_eq!(
            linked[0].boundary.as_ref().unwrap().local_authority.as_deref(),
            Some("Dublin City")
        );
    }

    #[rstest]
    fn should_drop_points_outside_all_small_areas_or_without_coordinates(
        boundaries: Vec<SmallAreaBoundary>,
    ) {
        let linked = link_to_small_areas(
            vec![
                building_at("1", Some((-5., 5.))),
                building_at("2", None),
                building_at("3", Some((5., 5.))),
            ],
            &boundaries,
            EdgePolicy::Drop,
        );

        assert_eq!(linked_ids(&linked), vec![("3", "A")]);
    }

    #[rstest]
    fn should_link_overlapping_point_to_first_small_area(boundaries: Vec<SmallAreaBoundary>) {
        let locator = BoundaryLocator::new(&boundaries, EdgePolicy::Drop);

        assert_eq!(
            locator.locate(Point::new(17., 5.)),
            Location::Within {
                index: 1,
                overlapping: 1
            }
        );
    }

    #[rstest]
    fn should_drop_point_on_shared_edge_by_default(boundaries: Vec<SmallAreaBoundary>) {
        let linked = link_to_small_areas(
            vec![building_at("1", Some((10., 5.)))],
            &boundaries,
            EdgePolicy::Drop,
        );

        assert!(linked.is_empty());
    }

    #[rstest]
    fn should_link_point_on_shared_edge_to_first_touching_small_area(
        boundaries: Vec<SmallAreaBoundary>,
    ) {
        let locator = BoundaryLocator::new(&boundaries, EdgePolicy::FirstIntersecting);

        assert_eq!(
            locator.locate(Point::new(10., 5.)),
            Location::OnEdge { index: 0 }
        );
        assert_eq!(locator.locate(Point::new(30., 5.)), Location::Outside);
    }

    #[rstest]
    fn should_link_edge_points_to_first_touching_small_area_when_configured(
        boundaries: Vec<SmallAreaBoundary>,
    ) {
        let linked = link_to_small_areas(
            vec![
                building_at("1", Some((10., 5.))),
                building_at("2", Some((12., 5.))),
                building_at("3", Some((30., 5.))),
            ],
            &boundaries,
            EdgePolicy::FirstIntersecting,
        );

        assert_eq!(linked_ids(&linked), vec![("1", "A"), ("2", "B")]);
    }

    #[rstest]
    fn should_give_empty_result_when_no_building_lies_in_any_small_area(
        boundaries: Vec<SmallAreaBoundary>,
    ) {
        let linked = link_to_small_areas(
            vec![building_at("1", Some((500., 500.))), building_at("2", None)],
            &boundaries,
            EdgePolicy::Drop,
        );

        assert!(linked.is_empty());
    }

    #[rstest]
    fn should_carry_buildings_through_when_unlinked() {
        let linked = unlinked(vec![building_at("1", None)]);

        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].boundary, None);
    }
}
