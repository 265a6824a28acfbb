use crate::error::CovmobError;
use crate::graph::MobilityGraph;
use crate::io::arrow::{TilesToArrow, regions_record_batch};
use crate::tile::Tile;
use arrow_array::RecordBatch;
use geoparquet::writer::{
    GeoParquetRecordBatchEncoder, GeoParquetWriterEncoding, GeoParquetWriterOptionsBuilder,
};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;

/// Writes a RecordBatch with a GeoArrow geometry column as WKB encoded GeoParquet.
pub fn write_geoparquet(batch: &RecordBatch, path: impl AsRef<Path>) -> Result<(), CovmobError> {
    let schema = batch.schema();

    let options = GeoParquetWriterOptionsBuilder::default()
        .set_encoding(GeoParquetWriterEncoding::WKB)
        .build();

    let mut encoder = GeoParquetRecordBatchEncoder::try_new(&schema, &options)
        .map_err(|e| CovmobError::IoError(e.to_string()))?;

    let file = File::create(path).map_err(|e| CovmobError::IoError(e.to_string()))?;
    let mut writer = ArrowWriter::try_new(file, encoder.target_schema(), None)
        .map_err(|e| CovmobError::IoError(e.to_string()))?;

    let encoded_batch = encoder
        .encode_record_batch(batch)
        .map_err(|e| CovmobError::IoError(e.to_string()))?;

    writer
        .write(&encoded_batch)
        .map_err(|e| CovmobError::IoError(e.to_string()))?;

    let kv_metadata = encoder
        .into_keyvalue()
        .map_err(|e| CovmobError::IoError(e.to_string()))?;

    writer.append_key_value_metadata(kv_metadata);
    writer
        .finish()
        .map_err(|e| CovmobError::IoError(e.to_string()))?;

    Ok(())
}

pub trait TilesToGeoParquet: TilesToArrow {
    fn to_geoparquet(&self, path: impl AsRef<Path>) -> Result<(), CovmobError>;
}

impl TilesToGeoParquet for [Tile] {
    fn to_geoparquet(&self, path: impl AsRef<Path>) -> Result<(), CovmobError> {
        let batch = self.to_record_batch()?;
        write_geoparquet(&batch, path)
    }
}

impl TilesToGeoParquet for Vec<Tile> {
    fn to_geoparquet(&self, path: impl AsRef<Path>) -> Result<(), CovmobError> {
        self.as_slice().to_geoparquet(path)
    }
}

/// Writes the regions of a graph, e.g. one step of a network run.
pub fn regions_to_geoparquet(graph: &MobilityGraph, path: impl AsRef<Path>) -> Result<(), CovmobError> {
    let batch = regions_record_batch(graph)?;
    write_geoparquet(&batch, path)
}
