use crate::error::CovmobError;

/// Smallest zoom level with a known tile edge length.
pub const MIN_ZOOM_LEVEL: u8 = 1;

/// Largest zoom level with a known tile edge length.
pub const MAX_ZOOM_LEVEL: u8 = 16;

/// Tile edge length in Web-Mercator meters for each zoom level (1-16).
pub const TILE_EDGE_LENGTHS: [f64; 16] = [
    20015089.262170314752,
    10007544.631085157376,
    5003772.315542578688,
    2501886.157771289344,
    1250943.078885644672,
    625471.539442822336,
    312735.769721411168,
    156367.884860705584,
    78183.942430352792,
    39091.971215176396,
    19545.985607588198,
    9772.992803794099,
    4886.4964018970495,
    2443.24820094852475,
    1221.624100474262375,
    610.8120502371311875,
];

/// Looks up the tile edge length for `zoom`.
pub fn tile_edge_length(zoom: u8) -> Result<f64, CovmobError> {
    if !(MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL).contains(&zoom) {
        return Err(CovmobError::InvalidZoomLevel(zoom));
    }
    Ok(TILE_EDGE_LENGTHS[(zoom - 1) as usize])
}
