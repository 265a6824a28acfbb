mod parse;
mod vertices;

pub use parse::{parse_geometry, parse_geojson, parse_line_string, parse_wkt};
pub use vertices::{TileVertices, tile_vertices};
pub(crate) use vertices::vertices_around;
