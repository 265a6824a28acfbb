use crate::coord::{Coordinate, HALF_WORLD, mercator_to_spherical, spherical_to_mercator};
use crate::error::CovmobError;
use crate::geom::{TileVertices, vertices_around};
use crate::index::{
    MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL, TILE_EDGE_LENGTHS, decode_quadkey, parent_quadkey,
    tile_coordinates_to_quadkey, tile_edge_length,
};
use crate::io::arrow::TilesToArrow;
use crate::io::parquet::TilesToGeoParquet;
use arrow_array::RecordBatch;
use geo_types::{Point, Polygon};
use geoarrow_array::array::{PointArray, PolygonArray};
use std::path::Path;

/// A single quadtree tile of the Web-Mercator tile scheme.
///
/// Each `Tile` is addressed by its quadkey and carries its grid position and
/// the (lon, lat) of its center.
///
/// # Example
///
/// ```
/// use covmob_rs::Tile;
///
/// # fn main() -> Result<(), covmob_rs::CovmobError> {
/// let tile = Tile::from_wgs84(&(13.405, 52.52), 13)?;
/// println!("Quadkey: {}", tile.quadkey);
/// println!("Center: ({}, {})", tile.lon(), tile.lat());
///
/// let restored = Tile::from_quadkey(&tile.quadkey)?;
/// assert_eq!(tile, restored);
///
/// let polygon = tile.to_polygon();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Quadkey address, one digit per zoom level
    pub quadkey: String,
    /// Tile center in WGS84 (lon, lat)
    pub center: Point<f64>,
    /// Zoom level (1-16), equal to the quadkey length
    pub zoom_level: u8,
    /// Column in the tile grid, counted from the west
    pub x: u32,
    /// Row in the tile grid, counted from the north
    pub y: u32,
}

impl Tile {
    /// Create a Tile from its quadkey. Every digit must be valid.
    pub fn from_quadkey(quadkey: &str) -> Result<Self, CovmobError> {
        let zoom = u8::try_from(quadkey.len()).map_err(|_| CovmobError::InvalidZoomLevel(u8::MAX))?;
        tile_edge_length(zoom)?;
        let (x, y) = decode_quadkey(quadkey)?;
        Ok(Self::build(quadkey.to_string(), x, y, zoom))
    }

    /// Create a Tile from grid coordinates at `zoom`.
    pub fn from_tile_coordinates(x: u32, y: u32, zoom: u8) -> Result<Self, CovmobError> {
        tile_edge_length(zoom)?;
        let max = (1u32 << zoom) - 1;
        if x > max || y > max {
            return Err(CovmobError::TileOutOfRange { x, y, zoom });
        }
        let quadkey = tile_coordinates_to_quadkey(x, y, zoom)?;
        Ok(Self::build(quadkey, x, y, zoom))
    }

    /// Create the Tile containing a WGS84 (lon, lat) point.
    ///
    /// Points north or south of the projected square snap to the edge rows.
    ///
    /// # Example
    /// ```
    /// use covmob_rs::Tile;
    /// use geo_types::Point;
    ///
    /// # fn main() -> Result<(), covmob_rs::CovmobError> {
    /// let tile = Tile::from_wgs84(&Point::new(13.405, 52.52), 1)?;
    /// assert_eq!(tile.quadkey, "1");
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_wgs84(coord: &impl Coordinate, zoom: u8) -> Result<Self, CovmobError> {
        let length = tile_edge_length(zoom)?;
        let projected = spherical_to_mercator(coord)?;
        let max = ((1u64 << zoom) - 1) as f64;

        let x = ((projected.x() + HALF_WORLD) / length).floor().clamp(0.0, max) as u32;
        let y = ((HALF_WORLD - projected.y()) / length).floor().clamp(0.0, max) as u32;

        Self::from_tile_coordinates(x, y, zoom)
    }

    fn build(quadkey: String, x: u32, y: u32, zoom: u8) -> Self {
        let center = mercator_to_spherical(&mercator_center(x, y, zoom));
        Self {
            quadkey,
            center,
            zoom_level: zoom,
            x,
            y,
        }
    }

    /// Returns the longitude of the tile center in degrees.
    pub fn lon(&self) -> f64 {
        self.center.x()
    }

    /// Returns the latitude of the tile center in degrees.
    pub fn lat(&self) -> f64 {
        self.center.y()
    }

    /// Edge length of this tile in Web-Mercator meters.
    pub fn edge_length(&self) -> f64 {
        TILE_EDGE_LENGTHS[(self.zoom_level - 1) as usize]
    }

    /// The enclosing tile one level up, `None` at zoom level 1.
    pub fn parent(&self) -> Option<Self> {
        if self.zoom_level <= MIN_ZOOM_LEVEL {
            return None;
        }
        let quadkey = parent_quadkey(&self.quadkey)?.to_string();
        Some(Self::build(quadkey, self.x >> 1, self.y >> 1, self.zoom_level - 1))
    }

    /// The four child tiles one level down, `None` at the deepest level.
    pub fn children(&self) -> Option<[Self; 4]> {
        if self.zoom_level >= MAX_ZOOM_LEVEL {
            return None;
        }
        let zoom = self.zoom_level + 1;
        let child = |digit: char, dx: u32, dy: u32| {
            let mut quadkey = self.quadkey.clone();
            quadkey.push(digit);
            Self::build(quadkey, (self.x << 1) | dx, (self.y << 1) | dy, zoom)
        };
        Some([
            child('0', 0, 0),
            child('1', 1, 0),
            child('2', 0, 1),
            child('3', 1, 1),
        ])
    }

    /// The (lon, lat) corners of this tile.
    pub fn vertices(&self) -> TileVertices {
        vertices_around(
            &mercator_center(self.x, self.y, self.zoom_level),
            self.edge_length(),
        )
    }

    /// Converts this tile to a closed rectangular polygon in (lon, lat).
    pub fn to_polygon(&self) -> Polygon<f64> {
        self.vertices().to_polygon()
    }

    /// Converts this tile's center to an Arrow PointArray.
    pub fn to_arrow_points(&self) -> PointArray {
        std::slice::from_ref(self).to_arrow_points()
    }

    /// Converts this tile to an Arrow PolygonArray.
    pub fn to_arrow_polygons(&self) -> PolygonArray {
        std::slice::from_ref(self).to_arrow_polygons()
    }

    /// Converts this tile to an Arrow RecordBatch with all attributes.
    pub fn to_record_batch(&self) -> Result<RecordBatch, CovmobError> {
        std::slice::from_ref(self).to_record_batch()
    }

    /// Writes this tile to a GeoParquet file.
    pub fn to_geoparquet(&self, path: impl AsRef<Path>) -> Result<(), CovmobError> {
        std::slice::from_ref(self).to_geoparquet(path)
    }
}

/// Web-Mercator center of grid tile (x, y); origin is the north-west corner.
fn mercator_center(x: u32, y: u32, zoom: u8) -> Point<f64> {
    let length = TILE_EDGE_LENGTHS[(zoom - 1) as usize];
    Point::new(
        -HALF_WORLD + (x as f64 + 0.5) * length,
        HALF_WORLD - (y as f64 + 0.5) * length,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_quadkey() -> Result<(), CovmobError> {
        let tile = Tile::from_quadkey("213")?;

        assert_eq!(tile.zoom_level, 3);
        assert_eq!((tile.x, tile.y), (3, 5));
        // Southern hemisphere, western half
        assert!(tile.lon() < 0.0);
        assert!(tile.lat() < 0.0);
        Ok(())
    }

    #[test]
    fn test_from_quadkey_rejects_bad_input() {
        assert!(Tile::from_quadkey("").is_err());
        assert!(Tile::from_quadkey("12a").is_err());
        assert!(matches!(
            Tile::from_quadkey(&"0".repeat(17)),
            Err(CovmobError::InvalidZoomLevel(17))
        ));
    }

    #[test]
    fn test_from_wgs84_contains_point() -> Result<(), CovmobError> {
        let berlin = (13.405, 52.52);
        for zoom in 1..=16u8 {
            let tile = Tile::from_wgs84(&berlin, zoom)?;
            let v = tile.vertices();

            assert_eq!(tile.quadkey.len(), zoom as usize);
            assert!(v.top_left.x() <= berlin.0 && berlin.0 <= v.top_right.x());
            assert!(v.bottom_left.y() <= berlin.1 && berlin.1 <= v.top_left.y());
        }
        Ok(())
    }

    #[test]
    fn test_quadkey_roundtrip() -> Result<(), CovmobError> {
        let tile = Tile::from_wgs84(&(9.99, 53.55), 14)?;
        let restored = Tile::from_quadkey(&tile.quadkey)?;

        assert_eq!(tile.quadkey, restored.quadkey);
        assert_eq!((tile.x, tile.y), (restored.x, restored.y));
        assert!((tile.lon() - restored.lon()).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_vertices_match_free_function() -> Result<(), CovmobError> {
        let tile = Tile::from_quadkey("120210233")?;
        let from_tile = tile.vertices();
        let from_center = crate::geom::tile_vertices(&tile.center, tile.zoom_level)?;

        assert!((from_tile.top_left.x() - from_center.top_left.x()).abs() < 1e-9);
        assert!((from_tile.top_left.y() - from_center.top_left.y()).abs() < 1e-9);
        assert!((from_tile.bottom_right.x() - from_center.bottom_right.x()).abs() < 1e-9);
        assert!((from_tile.bottom_right.y() - from_center.bottom_right.y()).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_parent_and_children() -> Result<(), CovmobError> {
        let tile = Tile::from_quadkey("1202")?;
        let parent = tile.parent();
        assert!(parent.is_some());
        let parent = parent.unwrap_or_else(|| unreachable!());
        assert_eq!(parent.quadkey, "120");

        let children = parent.children();
        assert!(children.is_some());
        let children = children.unwrap_or_else(|| unreachable!());
        assert!(children.iter().any(|c| c == &tile));
        for child in &children {
            assert_eq!(child, &Tile::from_quadkey(&child.quadkey)?);
        }

        assert!(Tile::from_quadkey("1")?.parent().is_none());
        assert!(Tile::from_quadkey(&"3".repeat(16))?.children().is_none());
        Ok(())
    }

    #[test]
    fn test_out_of_range_coordinates() {
        assert_eq!(
            Tile::from_tile_coordinates(2, 0, 1),
            Err(CovmobError::TileOutOfRange { x: 2, y: 0, zoom: 1 })
        );
        assert!(Tile::from_tile_coordinates(0, 0, 0).is_err());
    }

    #[test]
    fn test_polygon() -> Result<(), CovmobError> {
        let polygon = Tile::from_quadkey("12021023")?.to_polygon();
        assert_eq!(polygon.exterior().coords().count(), 5);
        Ok(())
    }
}
