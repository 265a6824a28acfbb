use crate::coord::{Coordinate, mercator_to_spherical, spherical_to_mercator};
use crate::error::CovmobError;
use crate::index::tile_edge_length;
use geo_types::{LineString, Point, Polygon};

/// The four (lon, lat) corners of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileVertices {
    pub top_left: Point<f64>,
    pub top_right: Point<f64>,
    pub bottom_left: Point<f64>,
    pub bottom_right: Point<f64>,
}

impl TileVertices {
    /// Corners in `(p0, p1, p2, p3)` order: top-left, top-right, bottom-left, bottom-right.
    pub fn as_tuple(&self) -> (Point<f64>, Point<f64>, Point<f64>, Point<f64>) {
        (
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        )
    }

    /// Closed, counter-clockwise polygon ring through the four corners.
    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring = LineString::from(vec![
            self.bottom_left.0,
            self.bottom_right.0,
            self.top_right.0,
            self.top_left.0,
            self.bottom_left.0,
        ]);
        Polygon::new(ring, vec![])
    }
}

/// Calculates the four (lon, lat) vertices of the tile around a reference point.
///
/// The reference point is projected to Web-Mercator, offset by half the tile
/// edge length of `zoom` along each axis, and every corner is projected back.
///
/// # Example
/// ```
/// use covmob_rs::tile_vertices;
///
/// # fn main() -> Result<(), covmob_rs::CovmobError> {
/// let vertices = tile_vertices(&(13.405, 52.52), 13)?;
/// assert!(vertices.top_left.x() < vertices.top_right.x());
/// assert!(vertices.top_left.y() > vertices.bottom_left.y());
/// # Ok(())
/// # }
/// ```
pub fn tile_vertices<C: Coordinate>(coord: &C, zoom: u8) -> Result<TileVertices, CovmobError> {
    let length = tile_edge_length(zoom)?;
    let center = spherical_to_mercator(coord)?;
    Ok(vertices_around(&center, length))
}

/// Corners of a square of edge `length` around a projected `center`.
pub(crate) fn vertices_around(center: &Point<f64>, length: f64) -> TileVertices {
    let half = length / 2.0;
    let (x, y) = (center.x(), center.y());

    TileVertices {
        top_left: mercator_to_spherical(&(x - half, y + half)),
        top_right: mercator_to_spherical(&(x + half, y + half)),
        bottom_left: mercator_to_spherical(&(x - half, y - half)),
        bottom_right: mercator_to_spherical(&(x + half, y - half)),
    }
}
