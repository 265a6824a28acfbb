use crate::error::CovmobError;
use geo_types::{Geometry, LineString};
use geojson::GeoJson;
use std::str::FromStr;
use wkt::{TryFromWkt, Wkt};

fn parse_error(e: impl std::fmt::Display) -> CovmobError {
    CovmobError::GeometryParseError(e.to_string())
}

fn is_geojson(s: &str) -> bool {
    s.starts_with('{')
}

/// The single geometry of a GeoJSON `Geometry` or `Feature`.
///
/// Collections are rejected, a location or path is always one geometry.
fn geojson_geometry(s: &str) -> Result<geojson::Geometry, CovmobError> {
    match s.parse::<GeoJson>().map_err(parse_error)? {
        GeoJson::Geometry(geom) => Ok(geom),
        GeoJson::Feature(feat) => feat
            .geometry
            .ok_or_else(|| parse_error("Feature has no geometry")),
        GeoJson::FeatureCollection(fc) => Err(parse_error(format!(
            "Expected one geometry, got a FeatureCollection of {}",
            fc.features.len()
        ))),
    }
}

/// Parses a location or path column, WKT or GeoJSON (detected by a leading `{`).
pub fn parse_geometry(s: &str) -> Result<Geometry<f64>, CovmobError> {
    let trimmed = s.trim();
    if is_geojson(trimmed) {
        parse_geojson(trimmed)
    } else {
        parse_wkt(trimmed)
    }
}

pub fn parse_geojson(s: &str) -> Result<Geometry<f64>, CovmobError> {
    Geometry::try_from(geojson_geometry(s)?).map_err(parse_error)
}

pub fn parse_wkt(s: &str) -> Result<Geometry<f64>, CovmobError> {
    let wkt = Wkt::<f64>::from_str(s).map_err(parse_error)?;
    Geometry::try_from(wkt).map_err(parse_error)
}

/// Parses the path of a movement edge, e.g. `LINESTRING (13.40 52.52, 13.05 52.39)`.
///
/// Anything but a LineString of at least two points is rejected.
pub fn parse_line_string(s: &str) -> Result<LineString<f64>, CovmobError> {
    let trimmed = s.trim();
    let line = if is_geojson(trimmed) {
        let geom = geojson_geometry(trimmed)?;
        let found = match geom.value {
            geojson::Value::LineString(_) => None,
            geojson::Value::Point(_) => Some("Point"),
            geojson::Value::MultiPoint(_) => Some("MultiPoint"),
            geojson::Value::MultiLineString(_) => Some("MultiLineString"),
            geojson::Value::Polygon(_) => Some("Polygon"),
            geojson::Value::MultiPolygon(_) => Some("MultiPolygon"),
            _ => Some("GeometryCollection"),
        };
        if let Some(found) = found {
            return Err(parse_error(format!("Expected a LineString path, got {}", found)));
        }
        match Geometry::try_from(geom).map_err(parse_error)? {
            Geometry::LineString(line) => line,
            _ => return Err(parse_error("Expected a LineString path")),
        }
    } else {
        LineString::try_from_wkt_str(trimmed)
            .map_err(|e| parse_error(format!("Expected a LineString path: {}", e)))?
    };

    if line.0.len() < 2 {
        return Err(parse_error("LineString path needs at least two points"));
    }
    Ok(line)
}
