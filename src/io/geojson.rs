use crate::error::CovmobError;
use crate::graph::{MobilityGraph, Region, RegionKey};
use crate::tile::Tile;
use geo_types::{Point, Polygon};
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::json;
use std::path::Path;

pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    use wkt::ToWkt;
    polygon.wkt_string()
}

pub fn polygon_to_geojson(polygon: &Polygon<f64>) -> String {
    Geometry::from(polygon).to_string()
}

fn feature(geometry: Option<Geometry>) -> Feature {
    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: None,
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Tile rectangles as a FeatureCollection with quadkey and zoom_level properties.
pub fn tiles_to_feature_collection(tiles: &[Tile]) -> FeatureCollection {
    let features = tiles
        .iter()
        .map(|tile| {
            let mut f = feature(Some(Geometry::from(&tile.to_polygon())));
            f.set_property("quadkey", tile.quadkey.clone());
            f.set_property("zoom_level", tile.zoom_level);
            f
        })
        .collect();
    collection(features)
}

fn region_geometry(region: &Region) -> Result<Option<Geometry>, CovmobError> {
    if let RegionKey::Quadkey(quadkey) = &region.key {
        let tile = Tile::from_quadkey(quadkey)?;
        return Ok(Some(Geometry::from(&tile.to_polygon())));
    }
    let location = region
        .location
        .or_else(|| region.key.lat_lon().map(|(lat, lon)| Point::new(lon, lat)));
    Ok(location.map(|p| Geometry::from(&p)))
}

/// Regions of a graph as a FeatureCollection.
///
/// Tile regions are drawn as their tile rectangle, administrative regions as
/// their location. Population and epidemic state become properties.
pub fn regions_to_feature_collection(graph: &MobilityGraph) -> Result<FeatureCollection, CovmobError> {
    let mut features = Vec::with_capacity(graph.region_count());
    for region in graph.regions() {
        let mut f = feature(region_geometry(region)?);
        f.set_property("region", region.key.to_string());
        if let Some(name) = &region.polygon_name {
            f.set_property("polygon_name", name.clone());
        }
        if let Some(population) = region.population {
            f.set_property("population", population);
        }
        if let Some(state) = region.state {
            f.set_property(
                "sir",
                json!({
                    "susceptible": state.susceptible,
                    "infected": state.infected,
                    "recovered": state.recovered,
                }),
            );
        }
        features.push(f);
    }
    Ok(collection(features))
}

pub fn write_geojson(collection: &FeatureCollection, path: impl AsRef<Path>) -> Result<(), CovmobError> {
    std::fs::write(path, collection.to_string()).map_err(|e| CovmobError::IoError(e.to_string()))
}
