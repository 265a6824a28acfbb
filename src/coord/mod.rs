mod mercator;

pub use mercator::{EARTH_RADIUS, HALF_WORLD, mercator_to_spherical, spherical_to_mercator};

use geo_types::Point;

/// Trait for types that can provide x/y coordinates.
///
/// Implemented for `(f64, f64)` tuples and `geo_types::Point<f64>`.
/// For spherical input `x` is the longitude and `y` the latitude, for
/// projected input both are Web-Mercator meters.
pub trait Coordinate {
    /// Returns the x-coordinate (longitude or mercator x).
    fn x(&self) -> f64;
    /// Returns the y-coordinate (latitude or mercator y).
    fn y(&self) -> f64;
}

impl Coordinate for (f64, f64) {
    fn x(&self) -> f64 {
        self.0
    }
    fn y(&self) -> f64 {
        self.1
    }
}

impl Coordinate for Point<f64> {
    fn x(&self) -> f64 {
        Point::x(*self)
    }
    fn y(&self) -> f64 {
        Point::y(*self)
    }
}
