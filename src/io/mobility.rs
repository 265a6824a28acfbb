use crate::error::CovmobError;
use crate::geom::parse_line_string;
use crate::graph::{GraphMeta, MobilityGraph, MovementEdge, Region, RegionKey};
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Time stamp format of the mobility exports, e.g. `2020-04-01 0800`.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H%M";

pub fn parse_date_time(raw: &str) -> Result<NaiveDateTime, CovmobError> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
        .map_err(|e| CovmobError::InvalidDate(format!("'{}': {}", raw, e)))
}

/// The four kinds of mobility export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    /// Movement between tiles
    Movement,
    /// Movement between administrative regions
    AdminMovement,
    /// Population per tile
    Population,
    /// Population per administrative region
    AdminPopulation,
}

impl GraphKind {
    pub fn load(&self, path: impl AsRef<Path>) -> Result<MobilityGraph, CovmobError> {
        match self {
            GraphKind::Movement => movement_graph(path),
            GraphKind::AdminMovement => administrative_movement_graph(path),
            GraphKind::Population => population_graph(path),
            GraphKind::AdminPopulation => administrative_population_graph(path),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MovementRow {
    date_time: String,
    tile_size: u8,
    country: String,
    start_lat: f64,
    start_lon: f64,
    start_polygon_id: i64,
    start_polygon_name: String,
    #[serde(default)]
    start_quadkey: Option<String>,
    end_lat: f64,
    end_lon: f64,
    end_polygon_id: i64,
    end_polygon_name: String,
    #[serde(default)]
    end_quadkey: Option<String>,
    n_crisis: u64,
    length_km: f64,
    #[serde(default)]
    geometry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PopulationRow {
    date_time: String,
    #[serde(default)]
    quadkey: Option<String>,
    lat: f64,
    lon: f64,
    country: String,
    #[serde(default)]
    polygon_name: Option<String>,
    n_crisis: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Tile,
    Admin,
}

fn open(path: &Path) -> Result<File, CovmobError> {
    File::open(path).map_err(|e| CovmobError::IoError(format!("{}: {}", path.display(), e)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn required_quadkey(quadkey: Option<String>, line: usize) -> Result<RegionKey, CovmobError> {
    match quadkey {
        Some(q) if !q.trim().is_empty() => Ok(RegionKey::quadkey(q.trim())),
        _ => Err(CovmobError::CsvError(format!("Missing quadkey in row {}", line))),
    }
}

fn read_movement<R: Read>(reader: R, file: &str, level: Level) -> Result<MobilityGraph, CovmobError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut graph = MobilityGraph::default();
    graph.meta.files.push(file.to_string());

    for (i, result) in reader.deserialize().enumerate() {
        let row: MovementRow = result.map_err(|e| CovmobError::CsvError(e.to_string()))?;
        if graph.meta.date_times.is_empty() {
            graph.meta.date_times.push(parse_date_time(&row.date_time)?);
            graph.meta.tile_size = Some(row.tile_size);
        }

        let (start_key, end_key) = match level {
            Level::Tile => (
                required_quadkey(row.start_quadkey, i + 1)?,
                required_quadkey(row.end_quadkey, i + 1)?,
            ),
            Level::Admin => (
                RegionKey::location(row.start_lat, row.start_lon),
                RegionKey::location(row.end_lat, row.end_lon),
            ),
        };

        graph.add_region(
            Region::new(start_key.clone())
                .with_polygon(row.start_polygon_id, row.start_polygon_name)
                .with_country(row.country.clone())
                .with_location(row.start_lon, row.start_lat),
        );
        graph.add_region(
            Region::new(end_key.clone())
                .with_polygon(row.end_polygon_id, row.end_polygon_name)
                .with_country(row.country)
                .with_location(row.end_lon, row.end_lat),
        );

        let mut edge = MovementEdge::new(row.n_crisis, row.length_km);
        if let Some(geometry) = row.geometry.filter(|g| !g.trim().is_empty()) {
            edge = edge.with_path(parse_line_string(&geometry)?);
        }
        graph.add_movement(&start_key, &end_key, edge)?;
    }

    debug!(
        "{}: {} regions, {} movements",
        file,
        graph.region_count(),
        graph.movement_count()
    );
    Ok(graph)
}

fn read_population<R: Read>(reader: R, file: &str, level: Level) -> Result<MobilityGraph, CovmobError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut graph = MobilityGraph::new(GraphMeta::default().with_file(file));
    let mut skipped = 0usize;

    for result in reader.deserialize::<PopulationRow>() {
        let parsed = result
            .map_err(|e| CovmobError::CsvError(e.to_string()))
            .and_then(|row| Ok((parse_date_time(&row.date_time)?, row)));
        let (date_time, row) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("{}: skipping row, {}", file, e);
                skipped += 1;
                continue;
            }
        };

        let region = match level {
            Level::Tile => match row.quadkey.as_deref().map(str::trim) {
                Some(q) if !q.is_empty() => {
                    if graph.meta.tile_size.is_none() {
                        graph.meta.tile_size = u8::try_from(q.chars().count()).ok();
                    }
                    Region::new(RegionKey::quadkey(q)).with_location(row.lon, row.lat)
                }
                _ => {
                    skipped += 1;
                    continue;
                }
            },
            Level::Admin => {
                let mut region =
                    Region::new(RegionKey::location(row.lat, row.lon)).with_location(row.lon, row.lat);
                region.polygon_name = row.polygon_name;
                region
            }
        };

        if graph.meta.date_times.is_empty() {
            graph.meta.date_times.push(date_time);
        }
        graph.add_region(region.with_country(row.country).with_population(row.n_crisis));
    }

    if skipped > 0 {
        warn!("{}: skipped {} unreadable rows", file, skipped);
    }
    debug!("{}: {} regions", file, graph.region_count());
    Ok(graph)
}

/// Loads a movement between tiles export. Fails on the first bad row.
pub fn movement_graph(path: impl AsRef<Path>) -> Result<MobilityGraph, CovmobError> {
    let path = path.as_ref();
    read_movement(open(path)?, &file_name(path), Level::Tile)
}

/// Loads a movement between administrative regions export, keyed by polygon centroid.
pub fn administrative_movement_graph(path: impl AsRef<Path>) -> Result<MobilityGraph, CovmobError> {
    let path = path.as_ref();
    read_movement(open(path)?, &file_name(path), Level::Admin)
}

/// Loads a tile population export. Unreadable rows are skipped.
pub fn population_graph(path: impl AsRef<Path>) -> Result<MobilityGraph, CovmobError> {
    let path = path.as_ref();
    read_population(open(path)?, &file_name(path), Level::Tile)
}

/// Loads an administrative population export. Unreadable rows are skipped.
pub fn administrative_population_graph(path: impl AsRef<Path>) -> Result<MobilityGraph, CovmobError> {
    let path = path.as_ref();
    read_population(open(path)?, &file_name(path), Level::Admin)
}

/// Files in `dir` with extension `filetype` whose name contains `key`, sorted by name.
pub fn file_list(
    dir: impl AsRef<Path>,
    filetype: &str,
    key: Option<&str>,
) -> Result<Vec<PathBuf>, CovmobError> {
    let dir = dir.as_ref();
    let entries =
        std::fs::read_dir(dir).map_err(|e| CovmobError::IoError(format!("{}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CovmobError::IoError(e.to_string()))?.path();
        let matches_type = path.extension().is_some_and(|ext| ext == filetype);
        let matches_key = key.is_none_or(|k| file_name(&path).contains(k));
        if path.is_file() && matches_type && matches_key {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every CSV of `kind` in `dir`, ordered by time stamp.
pub fn load_graphs(
    dir: impl AsRef<Path>,
    kind: GraphKind,
    key: Option<&str>,
) -> Result<Vec<MobilityGraph>, CovmobError> {
    let mut graphs = file_list(dir, "csv", key)?
        .iter()
        .map(|path| kind.load(path))
        .collect::<Result<Vec<_>, _>>()?;
    graphs.sort_by_key(|g| g.meta.date_time());
    Ok(graphs)
}
