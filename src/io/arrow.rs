use crate::error::CovmobError;
use crate::graph::MobilityGraph;
use crate::tile::Tile;
use arrow_array::{Float64Array, RecordBatch, StringArray, UInt8Array, UInt32Array};
use arrow_schema::{DataType, Field, Schema};
use geoarrow_array::IntoArrow;
use geoarrow_array::array::{PointArray, PolygonArray};
use geoarrow_array::builder::{PointBuilder, PolygonBuilder};
use geoarrow_schema::{Crs, Dimension, Metadata, PointType, PolygonType};
use rayon::prelude::*;
use std::sync::Arc;

fn wgs84_metadata() -> Arc<Metadata> {
    let crs = Crs::from_authority_code("EPSG:4326".to_string());
    Arc::new(Metadata::new(crs, None))
}

/// Trait for converting collections of [`Tile`]s to Arrow arrays.
///
/// Implemented for `[Tile]` and `Vec<Tile>`.
pub trait TilesToArrow {
    /// Converts tile centers to an Arrow PointArray.
    fn to_arrow_points(&self) -> PointArray;
    /// Converts tiles to an Arrow PolygonArray of rectangles.
    fn to_arrow_polygons(&self) -> PolygonArray;
    /// Converts tiles to a RecordBatch with quadkey, zoom_level, x, y, lon, lat, and geometry.
    fn to_record_batch(&self) -> Result<RecordBatch, CovmobError>;
}

impl TilesToArrow for [Tile] {
    fn to_arrow_points(&self) -> PointArray {
        let point = PointType::new(Dimension::XY, wgs84_metadata());
        let mut builder = PointBuilder::with_capacity(point, self.len());

        for tile in self {
            builder.push_point(Some(&tile.center));
        }
        builder.finish()
    }

    fn to_arrow_polygons(&self) -> PolygonArray {
        let poly = PolygonType::new(Dimension::XY, wgs84_metadata());
        let polygons: Vec<_> = self.par_iter().map(|t: &Tile| t.to_polygon()).collect();
        PolygonBuilder::from_polygons(&polygons, poly).finish()
    }

    fn to_record_batch(&self) -> Result<RecordBatch, CovmobError> {
        let polygon_array = self.to_arrow_polygons();
        let quadkeys: StringArray = self.iter().map(|t| Some(t.quadkey.as_str())).collect();
        let zoom_levels: UInt8Array = self.iter().map(|t| Some(t.zoom_level)).collect();
        let xs: UInt32Array = self.iter().map(|t| Some(t.x)).collect();
        let ys: UInt32Array = self.iter().map(|t| Some(t.y)).collect();
        let lons: Float64Array = self.iter().map(|t| Some(t.lon())).collect();
        let lats: Float64Array = self.iter().map(|t| Some(t.lat())).collect();

        let geometry_field = polygon_array.extension_type().to_field("geometry", false);
        let schema = Schema::new(vec![
            Field::new("quadkey", DataType::Utf8, false),
            Field::new("zoom_level", DataType::UInt8, false),
            Field::new("x", DataType::UInt32, false),
            Field::new("y", DataType::UInt32, false),
            Field::new("lon", DataType::Float64, false),
            Field::new("lat", DataType::Float64, false),
            geometry_field,
        ]);

        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(quadkeys),
                Arc::new(zoom_levels),
                Arc::new(xs),
                Arc::new(ys),
                Arc::new(lons),
                Arc::new(lats),
                Arc::new(polygon_array.into_arrow()),
            ],
        )
        .map_err(|e| CovmobError::IoError(e.to_string()))
    }
}

impl TilesToArrow for Vec<Tile> {
    fn to_arrow_points(&self) -> PointArray {
        self.as_slice().to_arrow_points()
    }

    fn to_arrow_polygons(&self) -> PolygonArray {
        self.as_slice().to_arrow_polygons()
    }

    fn to_record_batch(&self) -> Result<RecordBatch, CovmobError> {
        self.as_slice().to_record_batch()
    }
}

/// Regions of a graph with their population and epidemic state.
///
/// Columns: region, polygon_name, population, susceptible, infected,
/// recovered and a point geometry. Missing attributes are null.
pub fn regions_record_batch(graph: &MobilityGraph) -> Result<RecordBatch, CovmobError> {
    let point = PointType::new(Dimension::XY, wgs84_metadata());
    let mut builder = PointBuilder::with_capacity(point, graph.region_count());
    for region in graph.regions() {
        builder.push_point(region.location.as_ref());
    }
    let point_array = builder.finish();

    let keys: StringArray = graph.regions().map(|r| Some(r.key.to_string())).collect();
    let names: StringArray = graph.regions().map(|r| r.polygon_name.as_deref()).collect();
    let populations: Float64Array = graph.regions().map(|r| r.population).collect();
    let susceptible: Float64Array = graph.regions().map(|r| r.state.map(|s| s.susceptible)).collect();
    let infected: Float64Array = graph.regions().map(|r| r.state.map(|s| s.infected)).collect();
    let recovered: Float64Array = graph.regions().map(|r| r.state.map(|s| s.recovered)).collect();

    let geometry_field = point_array.extension_type().to_field("geometry", true);
    let schema = Schema::new(vec![
        Field::new("region", DataType::Utf8, false),
        Field::new("polygon_name", DataType::Utf8, true),
        Field::new("population", DataType::Float64, true),
        Field::new("susceptible", DataType::Float64, true),
        Field::new("infected", DataType::Float64, true),
        Field::new("recovered", DataType::Float64, true),
        geometry_field,
    ]);

    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(keys),
            Arc::new(names),
            Arc::new(populations),
            Arc::new(susceptible),
            Arc::new(infected),
            Arc::new(recovered),
            Arc::new(point_array.into_arrow()),
        ],
    )
    .map_err(|e| CovmobError::IoError(e.to_string()))
}
