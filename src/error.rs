/// Error type for covmob-rs operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CovmobError {
    /// A quadkey contains a character outside `0..=3`.
    InvalidQuadkeyDigit { quadkey: String, position: usize, digit: char },
    /// The zoom level has no entry in the tile edge length table (1-16).
    InvalidZoomLevel(u8),
    /// Tile grid coordinates outside the `2^zoom` square.
    TileOutOfRange { x: u32, y: u32, zoom: u8 },
    /// Latitude outside the open interval (-90, 90).
    InvalidLatitude(f64),
    /// A region or state name is not present in the lookup table.
    UnknownRegion(String),
    /// A region carries no population figure.
    MissingPopulation(String),
    /// A population used as denominator is zero.
    ZeroPopulation(String),
    /// A computation produced NaN or infinity.
    NonFinite(String),
    /// Graphs with different timestamps cannot be combined.
    TimestampMismatch,
    /// A population graph has a lower tile resolution than the movement graph.
    TileSizeMismatch { population: u8, movement: u8 },
    /// An aggregation was asked to work on an empty list of graphs.
    EmptyGraphList,
    /// The operation needs quadkey keyed regions.
    InvalidRegionKey(String),
    /// A date or timestamp string could not be parsed.
    InvalidDate(String),
    /// File I/O error.
    IoError(String),
    /// CSV parsing or writing error.
    CsvError(String),
    /// Settings file could not be parsed.
    ConfigError(String),
    /// Failed to parse geometry from string (GeoJSON or WKT).
    GeometryParseError(String),
}

impl std::fmt::Display for CovmobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CovmobError::InvalidQuadkeyDigit {
                quadkey,
                position,
                digit,
            } => write!(
                f,
                "Invalid quadkey digit '{}' at position {} in '{}'",
                digit, position, quadkey
            ),
            CovmobError::InvalidZoomLevel(z) => write!(f, "Invalid zoom level: {}", z),
            CovmobError::TileOutOfRange { x, y, zoom } => {
                write!(f, "Tile ({}, {}) outside the grid at zoom level {}", x, y, zoom)
            }
            CovmobError::InvalidLatitude(lat) => write!(f, "Invalid latitude: {}", lat),
            CovmobError::UnknownRegion(name) => write!(f, "Unknown region: {}", name),
            CovmobError::MissingPopulation(name) => {
                write!(f, "Missing population for region: {}", name)
            }
            CovmobError::ZeroPopulation(name) => {
                write!(f, "Zero population for region: {}", name)
            }
            CovmobError::NonFinite(msg) => write!(f, "Non-finite value: {}", msg),
            CovmobError::TimestampMismatch => {
                write!(f, "Unable to merge graphs with different date_time")
            }
            CovmobError::TileSizeMismatch {
                population,
                movement,
            } => write!(
                f,
                "Unable to merge movement graph (tile size {}) with lower resolution population graph (tile size {})",
                movement, population
            ),
            CovmobError::EmptyGraphList => write!(f, "Empty list - no graphs to aggregate"),
            CovmobError::InvalidRegionKey(msg) => write!(f, "Invalid region key: {}", msg),
            CovmobError::InvalidDate(msg) => write!(f, "Invalid date: {}", msg),
            CovmobError::IoError(msg) => write!(f, "IO error: {}", msg),
            CovmobError::CsvError(msg) => write!(f, "CSV error: {}", msg),
            CovmobError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            CovmobError::GeometryParseError(msg) => write!(f, "Geometry parse error: {}", msg),
        }
    }
}

impl std::error::Error for CovmobError {}
