use crate::error::CovmobError;
use crate::geom::parse_geometry;
use crate::io::geojson::{polygon_to_geojson, polygon_to_wkt};
use crate::tile::Tile;
use geo::Centroid;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

enum SourceIndices {
    Geometry(usize),
    Coordinates { lon_idx: usize, lat_idx: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    /// Well-Known Text format (e.g., "POLYGON((...))")
    Wkt,
    /// GeoJSON format
    GeoJson,
}

#[derive(Debug, Clone)]
pub enum CoordinateSource {
    /// A single column containing WKT or GeoJSON geometry
    GeometryColumn(String),
    /// Separate longitude and latitude columns
    CoordinateColumns { lon_column: String, lat_column: String },
}

/// Settings for tagging the rows of a WGS84 CSV with their tile quadkey.
#[derive(Debug, Clone)]
pub struct CsvTileConfig {
    pub source: CoordinateSource,
    pub exclude_columns: Vec<String>,
    pub zoom_level: u8,
    pub include_tile_geometry: Option<GeometryFormat>,
}

impl CsvTileConfig {
    /// Create config for a CSV with a geometry column (WKT or GeoJSON).
    ///
    /// Non-point geometries are placed by their centroid.
    ///
    /// # Example
    /// ```
    /// use covmob_rs::CsvTileConfig;
    ///
    /// let config = CsvTileConfig::new("geometry", 13);
    /// ```
    pub fn new(geometry_column: impl Into<String>, zoom_level: u8) -> Self {
        Self {
            source: CoordinateSource::GeometryColumn(geometry_column.into()),
            exclude_columns: Vec::new(),
            zoom_level,
            include_tile_geometry: None,
        }
    }

    /// Create config for a CSV with separate longitude/latitude columns.
    ///
    /// # Example
    /// ```
    /// use covmob_rs::{CsvTileConfig, GeometryFormat};
    ///
    /// let config = CsvTileConfig::from_coords("lon", "lat", 13)
    ///     .with_tile_geometry(GeometryFormat::Wkt);
    /// ```
    pub fn from_coords(
        lon_column: impl Into<String>,
        lat_column: impl Into<String>,
        zoom_level: u8,
    ) -> Self {
        Self {
            source: CoordinateSource::CoordinateColumns {
                lon_column: lon_column.into(),
                lat_column: lat_column.into(),
            },
            exclude_columns: Vec::new(),
            zoom_level,
            include_tile_geometry: None,
        }
    }

    pub fn exclude(mut self, columns: Vec<String>) -> Self {
        self.exclude_columns = columns;
        self
    }

    // Include the tile rectangle in the output.
    pub fn with_tile_geometry(mut self, format: GeometryFormat) -> Self {
        self.include_tile_geometry = Some(format);
        self
    }
}

pub trait CsvToTiles {
    fn to_tile_csv(
        &self,
        output_path: impl AsRef<Path>,
        config: &CsvTileConfig,
    ) -> Result<(), CovmobError>;
}

impl<P: AsRef<Path>> CsvToTiles for P {
    fn to_tile_csv(
        &self,
        output_path: impl AsRef<Path>,
        config: &CsvTileConfig,
    ) -> Result<(), CovmobError> {
        csv_to_tile_csv(self, output_path, config)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str, what: &str) -> Result<usize, CovmobError> {
    if name.is_empty() {
        return Err(CovmobError::CsvError(format!("{} column name cannot be empty", what)));
    }
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CovmobError::CsvError(format!("{} column '{}' not found", what, name)))
}

fn parse_field(record: &csv::StringRecord, idx: usize, what: &str) -> Result<f64, CovmobError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| CovmobError::CsvError(format!("Missing {} column at index {}", what, idx)))?
        .trim();
    raw.parse()
        .map_err(|_| CovmobError::CsvError(format!("Invalid {}: '{}'", what, raw)))
}

/// Converts a CSV with WGS84 locations to a CSV with a leading `quadkey` column.
///
/// Streams rows from input to output. The source columns are dropped.
///
/// ```no_run
/// use covmob_rs::{csv_to_tile_csv, CsvTileConfig};
///
/// let config = CsvTileConfig::from_coords("lon", "lat", 13)
///     .exclude(vec!["n_baseline".into()]);
///
/// csv_to_tile_csv("population.csv", "population_tiles.csv", &config).unwrap();
/// ```
pub fn csv_to_tile_csv(
    csv_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &CsvTileConfig,
) -> Result<(), CovmobError> {
    let file = File::open(csv_path).map_err(|e| CovmobError::CsvError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| CovmobError::CsvError(e.to_string()))?
        .clone();

    let source_indices = match &config.source {
        CoordinateSource::GeometryColumn(col) => {
            SourceIndices::Geometry(column_index(&headers, col, "Geometry")?)
        }
        CoordinateSource::CoordinateColumns {
            lon_column,
            lat_column,
        } => SourceIndices::Coordinates {
            lon_idx: column_index(&headers, lon_column, "Longitude")?,
            lat_idx: column_index(&headers, lat_column, "Latitude")?,
        },
    };

    let mut exclude_indices: HashSet<usize> = match source_indices {
        SourceIndices::Geometry(idx) => HashSet::from([idx]),
        SourceIndices::Coordinates { lon_idx, lat_idx } => HashSet::from([lon_idx, lat_idx]),
    };
    for col_name in &config.exclude_columns {
        if let Some(idx) = headers.iter().position(|h| h == col_name) {
            exclude_indices.insert(idx);
        }
    }

    let out_file = File::create(output_path).map_err(|e| CovmobError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(out_file);

    let mut header_row: Vec<&str> = vec!["quadkey"];
    if config.include_tile_geometry.is_some() {
        header_row.push("tile_geometry");
    }
    for (i, h) in headers.iter().enumerate() {
        if !exclude_indices.contains(&i) {
            header_row.push(h);
        }
    }
    writer
        .write_record(&header_row)
        .map_err(|e| CovmobError::CsvError(e.to_string()))?;

    for result in reader.records() {
        let record = result.map_err(|e| CovmobError::CsvError(e.to_string()))?;

        let tile = match &source_indices {
            SourceIndices::Geometry(idx) => {
                let geom_str = record.get(*idx).ok_or_else(|| {
                    CovmobError::CsvError(format!("Missing geometry column at index {}", idx))
                })?;
                let center = parse_geometry(geom_str)?.centroid().ok_or_else(|| {
                    CovmobError::GeometryParseError(format!("Empty geometry: '{}'", geom_str))
                })?;
                Tile::from_wgs84(&center, config.zoom_level)?
            }
            SourceIndices::Coordinates { lon_idx, lat_idx } => {
                let lon = parse_field(&record, *lon_idx, "longitude")?;
                let lat = parse_field(&record, *lat_idx, "latitude")?;
                Tile::from_wgs84(&(lon, lat), config.zoom_level)?
            }
        };

        let mut row: Vec<String> = vec![tile.quadkey.clone()];
        if let Some(format) = config.include_tile_geometry {
            let polygon = tile.to_polygon();
            row.push(match format {
                GeometryFormat::Wkt => polygon_to_wkt(&polygon),
                GeometryFormat::GeoJson => polygon_to_geojson(&polygon),
            });
        }
        for (i, field) in record.iter().enumerate() {
            if !exclude_indices.contains(&i) {
                row.push(field.to_string());
            }
        }
        writer
            .write_record(&row)
            .map_err(|e| CovmobError::CsvError(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| CovmobError::CsvError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_csv_from_coords() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        let csv_path = dir.path().join("population.csv");
        let output_path = dir.path().join("output.csv");

        let mut file = File::create(&csv_path).map_err(|e| CovmobError::IoError(e.to_string()))?;
        writeln!(file, "date_time,lat,lon,n_crisis,n_baseline")
            .map_err(|e| CovmobError::IoError(e.to_string()))?;
        writeln!(file, "2020-04-01 0800,52.52,13.405,1500,1400")
            .map_err(|e| CovmobError::IoError(e.to_string()))?;
        writeln!(file, "2020-04-01 0800,48.137,11.576,900,1000")
            .map_err(|e| CovmobError::IoError(e.to_string()))?;

        let config = CsvTileConfig::from_coords("lon", "lat", 13).exclude(vec!["n_baseline".into()]);
        csv_path.to_tile_csv(&output_path, &config)?;

        let output =
            std::fs::read_to_string(&output_path).map_err(|e| CovmobError::IoError(e.to_string()))?;
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "quadkey,date_time,n_crisis");
        let berlin = Tile::from_wgs84(&(13.405, 52.52), 13)?;
        assert_eq!(lines[1], format!("{},2020-04-01 0800,1500", berlin.quadkey));
        Ok(())
    }

    #[test]
    fn test_csv_from_geometry_column() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        let csv_path = dir.path().join("movement.csv");
        let output_path = dir.path().join("output.csv");

        let mut file = File::create(&csv_path).map_err(|e| CovmobError::IoError(e.to_string()))?;
        writeln!(file, "n_crisis,geometry").map_err(|e| CovmobError::IoError(e.to_string()))?;
        writeln!(file, "12,\"LINESTRING (13.0 52.0, 14.0 53.0)\"")
            .map_err(|e| CovmobError::IoError(e.to_string()))?;
        writeln!(
            file,
            "7,\"{{\"\"type\"\":\"\"Point\"\",\"\"coordinates\"\":[11.576,48.137]}}\""
        )
        .map_err(|e| CovmobError::IoError(e.to_string()))?;

        let config = CsvTileConfig::new("geometry", 10).with_tile_geometry(GeometryFormat::Wkt);
        csv_to_tile_csv(&csv_path, &output_path, &config)?;

        let output =
            std::fs::read_to_string(&output_path).map_err(|e| CovmobError::IoError(e.to_string()))?;
        assert!(output.starts_with("quadkey,tile_geometry,n_crisis"));
        assert!(output.contains("POLYGON"));
        let munich = Tile::from_wgs84(&(11.576, 48.137), 10)?;
        assert!(output.contains(&munich.quadkey));
        Ok(())
    }

    #[test]
    fn test_missing_column() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        let csv_path = dir.path().join("input.csv");
        std::fs::write(&csv_path, "a,b\n1,2\n").map_err(|e| CovmobError::IoError(e.to_string()))?;

        let config = CsvTileConfig::from_coords("lon", "lat", 13);
        let result = csv_to_tile_csv(&csv_path, dir.path().join("out.csv"), &config);
        assert!(matches!(result, Err(CovmobError::CsvError(_))));
        Ok(())
    }
}
