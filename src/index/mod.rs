pub mod constants;
mod quadkey;

pub use constants::{MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL, TILE_EDGE_LENGTHS, tile_edge_length};
pub use quadkey::{
    MAX_QUADKEY_LENGTH, QuadkeyDecode, decode_quadkey, parent_quadkey,
    quadkey_to_tile_coordinates, tile_coordinates_to_quadkey,
};
