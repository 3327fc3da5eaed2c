use crate::error::{EtlError, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;
use shapefile::Shape;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Reads a country boundary from an ESRI shapefile or GeoJSON into a single multipolygon
pub struct BoundaryReader;

impl BoundaryReader {
    pub fn new() -> Self {
        Self
    }

    /// `.shp` files go through the shapefile reader, anything else is parsed as GeoJSON
    pub fn read(&self, path: &Path) -> Result<MultiPolygon<f64>> {
        let is_shapefile = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));

        let boundary = if is_shapefile {
            self.read_shapefile(path)?
        } else {
            self.parse(&fs::read_to_string(path)?)?
        };
        debug!(
            "boundary: loaded {} polygon(s) from {}",
            boundary.0.len(),
            path.display()
        );
        Ok(boundary)
    }

    /// Polygon records of a shapefile; other shape types are skipped
    pub fn read_shapefile(&self, path: &Path) -> Result<MultiPolygon<f64>> {
        let mut polygons = Vec::new();
        for shape in shapefile::read_shapes(path)? {
            match shape {
                Shape::Polygon(polygon) => polygons.extend(MultiPolygon::<f64>::from(polygon).0),
                other => warn!("boundary: ignoring {:?} shape", other.shapetype()),
            }
        }

        if polygons.is_empty() {
            return Err(EtlError::InvalidBoundary(format!(
                "no polygon records in {}",
                path.display()
            )));
        }

        Ok(MultiPolygon::new(polygons))
    }

    /// Accepts a FeatureCollection, Feature, GeometryCollection, Polygon or MultiPolygon
    pub fn parse(&self, geojson: &str) -> Result<MultiPolygon<f64>> {
        let value: Value = serde_json::from_str(geojson)?;
        let mut polygons = Vec::new();
        collect_polygons(&value, &mut polygons)?;

        if polygons.is_empty() {
            return Err(EtlError::InvalidBoundary(
                "no Polygon or MultiPolygon geometry found".to_string(),
            ));
        }

        Ok(MultiPolygon::new(polygons))
    }
}

impl Default for BoundaryReader {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| EtlError::InvalidBoundary("GeoJSON object without \"type\"".to_string()))?;

    match kind {
        "FeatureCollection" => {
            for feature in array_member(value, "features")? {
                collect_polygons(feature, out)?;
            }
        }
        "Feature" => {
            if let Some(geometry) = value.get("geometry").filter(|g| !g.is_null()) {
                collect_polygons(geometry, out)?;
            }
        }
        "GeometryCollection" => {
            for geometry in array_member(value, "geometries")? {
                collect_polygons(geometry, out)?;
            }
        }
        "Polygon" => {
            out.push(parse_polygon(member(value, "coordinates")?)?);
        }
        "MultiPolygon" => {
            for polygon in array_member(value, "coordinates")? {
                out.push(parse_polygon(polygon)?);
            }
        }
        other => warn!("boundary: ignoring {} geometry", other),
    }

    Ok(())
}

fn member<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| EtlError::InvalidBoundary(format!("missing \"{}\" member", key)))
}

fn array_member<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    member(value, key)?
        .as_array()
        .ok_or_else(|| EtlError::InvalidBoundary(format!("\"{}\" is not an array", key)))
}

fn parse_polygon(rings: &Value) -> Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| EtlError::InvalidBoundary("polygon rings must be an array".to_string()))?;

    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| EtlError::InvalidBoundary("polygon without exterior ring".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| EtlError::InvalidBoundary("ring must be an array".to_string()))?;

    let coords = positions
        .iter()
        .map(|position| {
            let x = position.get(0).and_then(Value::as_f64);
            let y = position.get(1).and_then(Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(EtlError::InvalidBoundary(format!(
                    "invalid position: {}",
                    position
                ))),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    if coords.len() < 3 {
        return Err(EtlError::InvalidBoundary(format!(
            "ring has {} positions, need at least 3",
            coords.len()
        )));
    }

    Ok(LineString::new(coords))
}
