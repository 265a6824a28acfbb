//! Region graphs built from mobility snapshots.
//!
//! A [`MobilityGraph`] holds typed [`Region`] nodes and directed
//! [`MovementEdge`]s. Population snapshots are graphs without edges and can
//! be aggregated in space and time, then merged into a movement graph.

mod aggregate;
mod mobility;
mod region;

pub use aggregate::{
    merge_population_with_movement, space_aggregate_population, time_aggregate_movement,
    time_aggregate_population,
};
pub use mobility::{MobilityGraph, search_graphs};
pub use region::{GraphMeta, LOCATION_SCALE, MovementEdge, Region, RegionKey};
