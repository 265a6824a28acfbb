use super::Coordinate;
use crate::error::CovmobError;
use geo_types::Point;
use std::f64::consts::{FRAC_PI_4, PI};

/// Earth radius in meters used by the spherical projection.
pub const EARTH_RADIUS: f64 = 6_371_000.785;

/// Half the projected world width (`pi * EARTH_RADIUS`); also the tile edge
/// length at zoom level 1.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// Projects a spherical (lon, lat) point in degrees onto the Web-Mercator plane.
///
/// Returns the projected point in meters, `x` east and `y` north.
/// Latitudes must lie strictly inside (-90, 90).
///
/// # Example
/// ```
/// use covmob_rs::{mercator_to_spherical, spherical_to_mercator};
///
/// # fn main() -> Result<(), covmob_rs::CovmobError> {
/// let projected = spherical_to_mercator(&(13.405, 52.52))?;
/// let back = mercator_to_spherical(&projected);
/// assert!((back.x() - 13.405).abs() < 1e-9);
/// assert!((back.y() - 52.52).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
pub fn spherical_to_mercator<C: Coordinate>(coord: &C) -> Result<Point<f64>, CovmobError> {
    let (lon, lat) = (coord.x(), coord.y());
    if !(lat > -90.0 && lat < 90.0) {
        return Err(CovmobError::InvalidLatitude(lat));
    }

    let x = EARTH_RADIUS * lon * PI / 180.0;
    let y = EARTH_RADIUS * (FRAC_PI_4 + lat * PI / 360.0).tan().ln();
    Ok(Point::new(x, y))
}

/// Inverse of [`spherical_to_mercator`]: maps projected meters back to (lon, lat) degrees.
pub fn mercator_to_spherical<C: Coordinate>(coord: &C) -> Point<f64> {
    let lon = coord.x() / EARTH_RADIUS * 180.0 / PI;
    let lat = (2.0 * (coord.y() / EARTH_RADIUS).exp().atan() - PI / 2.0) * 180.0 / PI;
    Point::new(lon, lat)
}
