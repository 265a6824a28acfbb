pub mod arrow;
pub mod csv;
pub mod geojson;
pub mod mobility;
pub mod parquet;
pub mod series;

pub use arrow::{TilesToArrow, regions_record_batch};
pub use csv::{CoordinateSource, CsvTileConfig, CsvToTiles, GeometryFormat, csv_to_tile_csv};
pub use geojson::{
    polygon_to_geojson, polygon_to_wkt, regions_to_feature_collection,
    tiles_to_feature_collection, write_geojson,
};
pub use mobility::{
    DATE_TIME_FORMAT, GraphKind, administrative_movement_graph, administrative_population_graph,
    file_list, load_graphs, movement_graph, parse_date_time, population_graph,
};
pub use parquet::{TilesToGeoParquet, regions_to_geoparquet, write_geoparquet};
pub use series::{write_network_csv, write_series_csv};
