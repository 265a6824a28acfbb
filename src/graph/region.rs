use crate::error::CovmobError;
use crate::model::SirState;
use chrono::NaiveDateTime;
use geo_types::{LineString, Point};
use std::fmt;

/// Scale of the integer micro-degree location keys.
pub const LOCATION_SCALE: f64 = 1_000_000.0;

/// Identifier of a region node.
///
/// Tile level data is keyed by quadkey, administrative data by the centroid
/// of the polygon, stored as integer micro-degrees so keys hash and order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionKey {
    Quadkey(String),
    Location { lat_e6: i64, lon_e6: i64 },
}

impl RegionKey {
    pub fn quadkey(quadkey: impl Into<String>) -> Self {
        RegionKey::Quadkey(quadkey.into())
    }

    /// Location key rounded to the nearest micro-degree.
    pub fn location(lat: f64, lon: f64) -> Self {
        RegionKey::Location {
            lat_e6: (lat * LOCATION_SCALE).round() as i64,
            lon_e6: (lon * LOCATION_SCALE).round() as i64,
        }
    }

    pub fn as_quadkey(&self) -> Option<&str> {
        match self {
            RegionKey::Quadkey(q) => Some(q),
            RegionKey::Location { .. } => None,
        }
    }

    /// (lat, lon) in degrees for location keys.
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        match self {
            RegionKey::Location { lat_e6, lon_e6 } => Some((
                *lat_e6 as f64 / LOCATION_SCALE,
                *lon_e6 as f64 / LOCATION_SCALE,
            )),
            RegionKey::Quadkey(_) => None,
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKey::Quadkey(q) => write!(f, "{}", q),
            RegionKey::Location { .. } => {
                let (lat, lon) = self.lat_lon().unwrap_or_default();
                write!(f, "({:.6}, {:.6})", lat, lon)
            }
        }
    }
}

/// A node of a mobility graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub key: RegionKey,
    pub polygon_id: Option<i64>,
    /// Name of the administrative polygon, the federal state for state level data
    pub polygon_name: Option<String>,
    pub country: Option<String>,
    /// (lon, lat) of the region
    pub location: Option<Point<f64>>,
    /// Population snapshot from the mobility data
    pub population: Option<f64>,
    pub state: Option<SirState>,
}

impl Region {
    pub fn new(key: RegionKey) -> Self {
        Self {
            key,
            polygon_id: None,
            polygon_name: None,
            country: None,
            location: None,
            population: None,
            state: None,
        }
    }

    pub fn with_polygon(mut self, id: i64, name: impl Into<String>) -> Self {
        self.polygon_id = Some(id);
        self.polygon_name = Some(name.into());
        self
    }

    pub fn with_polygon_name(mut self, name: impl Into<String>) -> Self {
        self.polygon_name = Some(name.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_location(mut self, lon: f64, lat: f64) -> Self {
        self.location = Some(Point::new(lon, lat));
        self
    }

    pub fn with_population(mut self, population: f64) -> Self {
        self.population = Some(population);
        self
    }

    pub fn with_state(mut self, state: SirState) -> Self {
        self.state = Some(state);
        self
    }

    /// Population snapshot, an error when the region has none.
    pub fn population(&self) -> Result<f64, CovmobError> {
        self.population
            .ok_or_else(|| CovmobError::MissingPopulation(self.key.to_string()))
    }

    /// Federal state used to look up the initial shares.
    pub fn state_name(&self) -> Result<&str, CovmobError> {
        self.polygon_name
            .as_deref()
            .ok_or_else(|| CovmobError::UnknownRegion(format!("{} has no polygon name", self.key)))
    }

    /// Overwrite attributes with those set on `other`.
    pub fn merge_from(&mut self, other: &Region) {
        if other.polygon_id.is_some() {
            self.polygon_id = other.polygon_id;
        }
        if other.polygon_name.is_some() {
            self.polygon_name.clone_from(&other.polygon_name);
        }
        if other.country.is_some() {
            self.country.clone_from(&other.country);
        }
        if other.location.is_some() {
            self.location = other.location;
        }
        if other.population.is_some() {
            self.population = other.population;
        }
        if other.state.is_some() {
            self.state = other.state;
        }
    }
}

/// Directed flow between two regions in one time window.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementEdge {
    /// Observed number of people moving along the edge
    pub n_crisis: u64,
    pub length_km: f64,
    pub path: Option<LineString<f64>>,
}

impl MovementEdge {
    pub fn new(n_crisis: u64, length_km: f64) -> Self {
        Self {
            n_crisis,
            length_km,
            path: None,
        }
    }

    pub fn with_path(mut self, path: LineString<f64>) -> Self {
        self.path = Some(path);
        self
    }
}

/// Graph level attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphMeta {
    /// One stamp per source file, several after time aggregation
    pub date_times: Vec<NaiveDateTime>,
    /// Zoom level of tile data, `None` for administrative data
    pub tile_size: Option<u8>,
    pub files: Vec<String>,
}

impl GraphMeta {
    pub fn new(date_time: NaiveDateTime) -> Self {
        Self {
            date_times: vec![date_time],
            ..Self::default()
        }
    }

    pub fn with_tile_size(mut self, tile_size: u8) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    /// First time stamp of the graph.
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        self.date_times.first().copied()
    }

    pub(crate) fn extend(&mut self, other: &GraphMeta) {
        self.date_times.extend_from_slice(&other.date_times);
        self.files.extend(other.files.iter().cloned());
        if self.tile_size.is_none() {
            self.tile_size = other.tile_size;
        }
    }
}
