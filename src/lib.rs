//! # covmob-rs
//!
//! There are currently three main entry points.
//!
//! ### 1. `Tile` - Quadkey Tile Operations
//!
//! ```
//! use covmob_rs::Tile;
//!
//! # fn main() -> Result<(), covmob_rs::CovmobError> {
//! let tile = Tile::from_wgs84(&(13.405, 52.52), 13)?;
//! println!("{}", tile.quadkey);
//! let polygon = tile.to_polygon();
//!
//! let parent = tile.parent();
//! assert_eq!(parent.map(|p| p.zoom_level), Some(12));
//! # Ok(())
//! # }
//! ```
//!
//! ### 2. `closed_sir` and the network runs - SIR Simulation
//!
//! ```
//! use covmob_rs::model::{SirParams, SirState, closed_sir};
//!
//! # fn main() -> Result<(), covmob_rs::CovmobError> {
//! let series = closed_sir(SirState::new(990.0, 10.0, 0.0), &SirParams::new(0.3, 0.1), 100)?;
//! assert_eq!(series.len(), 101);
//! # Ok(())
//! # }
//! ```
//!
//! Mobility snapshots are loaded as [`MobilityGraph`]s and simulated with
//! [`model::static_state_sir`] or [`model::dynamic_state_sir`]:
//!
//! ```no_run
//! use covmob_rs::io::{GraphKind, load_graphs};
//! use covmob_rs::model::{SirParams, static_state_sir, init_state_sir, StatePopulations};
//! use covmob_rs::cases::{RkiArchive, default_start};
//! use chrono::NaiveDate;
//!
//! # fn main() -> Result<(), covmob_rs::CovmobError> {
//! let graphs = load_graphs("data/population_admin", GraphKind::AdminPopulation, Some("Germany"))?;
//! let date = NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
//! let archive = RkiArchive::new("data/rki");
//! let distribution = init_state_sir(date, default_start(), &archive, &StatePopulations::germany())?;
//! let run = static_state_sir(&graphs[0], &SirParams::new(0.3, 0.1), 30, &distribution)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`pipeline::run`] does the same from a TOML [`Settings`] file and writes
//! the series to CSV.
//!
//! ### 3. `CsvToTiles` - CSV File Conversion
//!
//! Tag the rows of a CSV with lon/lat columns with their tile quadkey:
//!
//! ```no_run
//! use covmob_rs::{CsvToTiles, CsvTileConfig, GeometryFormat};
//!
//! let config = CsvTileConfig::from_coords("lon", "lat", 13)
//!     .with_tile_geometry(GeometryFormat::Wkt);
//!
//! "population.csv".to_tile_csv("population_tiles.csv", &config).unwrap();
//! ```
//!

pub mod cases;
pub mod config;
pub mod coord;
pub mod error;
pub mod geom;
pub mod graph;
pub mod index;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod tile;

pub use config::{Settings, SimulationMode};
pub use coord::{Coordinate, EARTH_RADIUS, HALF_WORLD, mercator_to_spherical, spherical_to_mercator};
pub use error::CovmobError;
pub use geom::{TileVertices, parse_geometry, tile_vertices};
pub use graph::{GraphMeta, MobilityGraph, MovementEdge, Region, RegionKey};
pub use index::{
    MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL, TILE_EDGE_LENGTHS, decode_quadkey, parent_quadkey,
    quadkey_to_tile_coordinates, tile_coordinates_to_quadkey, tile_edge_length,
};
pub use io::{
    CoordinateSource, CsvTileConfig, CsvToTiles, GeometryFormat, TilesToArrow, TilesToGeoParquet,
    csv_to_tile_csv, write_geoparquet,
};
pub use tile::Tile;

pub use geo_types;
pub use geoarrow_array;
pub use geoarrow_schema;
pub use geoparquet;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::merge_population_with_movement;
    use crate::io::{GraphKind, load_graphs};
    use crate::model::{
        InitialDistribution, InitialShares, SirParams, dynamic_state_sir, network_series,
        static_state_sir,
    };
    use std::path::Path;
    use tempfile::tempdir;

    const MOVEMENT: &str = "\
geometry,date_time,start_polygon_id,start_polygon_name,end_polygon_id,end_polygon_name,length_km,tile_size,country,level,n_crisis,start_lat,start_lon,end_lat,end_lon,start_quadkey,end_quadkey
\"LINESTRING (13.40 52.52, 13.05 52.39)\",2020-04-01 0800,11,Berlin,12,Brandenburg,27.5,13,DE,LEVEL3,120,52.52,13.40,52.39,13.05,1202102332221,1202102331333
\"LINESTRING (13.05 52.39, 13.40 52.52)\",2020-04-01 0800,12,Brandenburg,11,Berlin,27.5,13,DE,LEVEL3,80,52.39,13.05,52.52,13.40,1202102331333,1202102332221
";

    const POPULATION: &str = "\
date_time,quadkey,lat,lon,country,n_crisis,n_baseline
2020-04-01 0800,1202102332221,52.52,13.40,DE,1500.0,1400.0
2020-04-01 0800,1202102331333,52.39,13.05,DE,700.0,650.0
";

    fn write_file(dir: &Path, name: &str, content: &str) -> Result<(), CovmobError> {
        std::fs::write(dir.join(name), content).map_err(|e| CovmobError::IoError(e.to_string()))
    }

    fn distribution() -> Result<InitialDistribution, CovmobError> {
        let mut distribution = InitialDistribution::new();
        distribution.insert(
            "Berlin".to_string(),
            InitialShares::from_counts(3_669, 0, 0, 3_669_491)?,
        );
        distribution.insert(
            "Brandenburg".to_string(),
            InitialShares::from_counts(0, 2_522, 0, 2_521_893)?,
        );
        Ok(distribution)
    }

    #[test]
    fn test_end_to_end_network_run() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        write_file(dir.path(), "Germany_2020_04_01_0800_movement.csv", MOVEMENT)?;
        write_file(dir.path(), "Germany_2020_04_01_0800_population.csv", POPULATION)?;

        let movement = load_graphs(dir.path(), GraphKind::Movement, Some("movement"))?;
        let population = load_graphs(dir.path(), GraphKind::Population, Some("population"))?;
        assert_eq!(movement.len(), 1);
        assert_eq!(population.len(), 1);

        let merged = merge_population_with_movement(&population[0], &movement[0])?;
        assert_eq!(merged.region_count(), 2);

        let graphs = vec![merged.clone(), merged];
        let params = SirParams::new(0.3, 0.1);
        let run = dynamic_state_sir(&graphs, &params, 1, &distribution()?)?;
        assert_eq!(run.len(), 2);

        let series = network_series(&run)?;
        let before = series.total_at(0).map(|s| s.population());
        let after = series.total_at(1).map(|s| s.population());
        assert!(before.is_some_and(|p| (p - 2200.0).abs() < 1e-6));
        assert!(after.is_some_and(|p| (p - 2200.0).abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn test_static_run_keeps_regions_apart() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        write_file(dir.path(), "movement.csv", MOVEMENT)?;
        write_file(dir.path(), "population.csv", POPULATION)?;

        let movement = GraphKind::Movement.load(dir.path().join("movement.csv"))?;
        let population = GraphKind::Population.load(dir.path().join("population.csv"))?;
        let merged = merge_population_with_movement(&population, &movement)?;

        let series = static_state_sir(&merged, &SirParams::new(0.3, 0.1), 10, &distribution()?)?;
        let brandenburg = series
            .get(&RegionKey::quadkey("1202102331333"))
            .ok_or_else(|| CovmobError::UnknownRegion("1202102331333".to_string()))?;

        // No infected seed and no exchange.
        assert!(brandenburg.infected.iter().all(|i| *i == 0.0));
        assert_eq!(brandenburg.len(), 11);
        Ok(())
    }

    #[test]
    fn test_tile_hierarchy_and_vertices() -> Result<(), CovmobError> {
        let tile = Tile::from_quadkey("1202102332221")?;
        let parent = tile
            .parent()
            .ok_or_else(|| CovmobError::InvalidZoomLevel(tile.zoom_level))?;

        assert_eq!(parent.quadkey, "120210233222");
        assert_eq!(parent_quadkey(&tile.quadkey), Some("120210233222"));
        assert!(parent.children().is_some_and(|c| c.contains(&tile)));

        let vertices = tile_vertices(&(tile.lon(), tile.lat()), tile.zoom_level)?;
        let expected = tile.vertices();
        assert!((vertices.top_left.x() - expected.top_left.x()).abs() < 1e-9);
        assert!((vertices.bottom_right.y() - expected.bottom_right.y()).abs() < 1e-9);
        Ok(())
    }
}
