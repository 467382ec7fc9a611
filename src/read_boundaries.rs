use crate::config::BoundaryProperties;
use crate::core::spatial_linker::{BoundaryNames, LocalAuthorityBoundary, SmallAreaBoundary};
use anyhow::Context;
use geojson::{Feature, FeatureCollection, GeoJson, JsonValue};
use geo::{Geometry, MultiPolygon};
use std::io::{BufReader, Read};
use thiserror::Error;

/// Reads small area boundaries from a GeoJSON feature collection whose coordinates are in the same
/// projected reference system as the building coordinates.
pub fn small_area_boundaries_from_geojson(
    geojson: impl Read,
    properties: &BoundaryProperties,
) -> anyhow::Result<Vec<SmallAreaBoundary>> {
    read_features(geojson)?
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let small_area = string_property(&feature, &properties.small_area_id).ok_or_else(
                || MissingBoundaryIdentifierError {
                    feature: index,
                    property: properties.small_area_id.clone(),
                },
            )?;
            let names = BoundaryNames {
                small_area,
                county_name: string_property(&feature, &properties.county_name),
                local_authority: string_property(&feature, &properties.local_authority_name),
            };

            Ok(SmallAreaBoundary {
                names,
                geometry: multi_polygon(feature, index)?,
            })
        })
        .collect()
}

pub fn local_authority_boundaries_from_geojson(
    geojson: impl Read,
    properties: &BoundaryProperties,
) -> anyhow::Result<Vec<LocalAuthorityBoundary>> {
    let name_property = &properties.local_authority_boundary_name;

    read_features(geojson)?
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let name = string_property(&feature, name_property).ok_or_else(|| {
                MissingBoundaryIdentifierError {
                    feature: index,
                    property: name_property.clone(),
                }
            })?;

            Ok(LocalAuthorityBoundary {
                name,
                geometry: multi_polygon(feature, index)?,
            })
        })
        .collect()
}

fn read_features(geojson: impl Read) -> anyhow::Result<FeatureCollection> {
    let geojson: GeoJson = serde_json::from_reader(BufReader::new(geojson))
        .context("Could not parse boundary GeoJSON")?;

    FeatureCollection::try_from(geojson).context("Boundary GeoJSON is not a feature collection")
}

/// A property as text. Numeric identifiers are common in census boundary files, so numbers are
/// accepted too.
fn string_property(feature: &Feature, name: &str) -> Option<String> {
    match feature.property(name)? {
        JsonValue::String(value) => Some(value.trim().to_string()),
        JsonValue::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn multi_polygon(feature: Feature, index: usize) -> anyhow::Result<MultiPolygon<f64>> {
    let geometry = feature
        .geometry
        .ok_or_else(|| UnsupportedGeometryError {
            feature: index,
            kind: "no geometry".to_string(),
        })?;

    match Geometry::<f64>::try_from(geometry)? {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi_polygon) => Ok(multi_polygon),
        other => Err(UnsupportedGeometryError {
            feature: index,
            kind: geometry_kind(&other).to_string(),
        }
        .into()),
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[derive(Debug, Error)]
#[error("Boundary feature {feature} has {kind} where a polygon or multipolygon was expected")]
pub struct UnsupportedGeometryError {
    feature: usize,
    kind: String,
}

#[derive(Debug, Error)]
#[error("Boundary feature {feature} has no '{property}' property to identify it")]
pub struct MissingBoundaryIdentifierError {
    feature: usize,
    property: String,
}
