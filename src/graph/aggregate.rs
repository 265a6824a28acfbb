use crate::error::CovmobError;
use crate::graph::mobility::MobilityGraph;
use crate::graph::region::{GraphMeta, Region, RegionKey};
use crate::index::parent_quadkey;
use geo::Centroid;
use geo_types::{MultiPoint, Point};
use log::debug;
use std::collections::BTreeMap;

#[derive(Default)]
struct ParentTile {
    population: f64,
    country: Option<String>,
    locations: Vec<Point<f64>>,
}

/// Aggregates a tile level population graph `delta` zoom levels up.
///
/// Each parent tile carries the summed population of its children and the
/// centroid of their locations. Aggregation stops early at tile size 1.
pub fn space_aggregate_population(
    graph: &MobilityGraph,
    delta: u8,
) -> Result<MobilityGraph, CovmobError> {
    let mut current = graph.clone();

    for _ in 0..delta {
        let tile_size = current.meta.tile_size.ok_or_else(|| {
            CovmobError::InvalidRegionKey("population graph has no tile size".to_string())
        })?;
        if tile_size <= 1 {
            break;
        }

        let mut parents: BTreeMap<String, ParentTile> = BTreeMap::new();
        for region in current.regions() {
            let quadkey = region.key.as_quadkey().ok_or_else(|| {
                CovmobError::InvalidRegionKey(format!("{} is not a quadkey", region.key))
            })?;
            let parent = parent_quadkey(quadkey).unwrap_or_default().to_string();

            let entry = parents.entry(parent).or_default();
            entry.population += region.population()?;
            if entry.country.is_none() {
                entry.country.clone_from(&region.country);
            }
            entry.locations.extend(region.location);
        }

        let meta = GraphMeta {
            tile_size: Some(tile_size - 1),
            ..current.meta.clone()
        };
        let mut next = MobilityGraph::new(meta);
        for (quadkey, tile) in parents {
            let mut region = Region::new(RegionKey::quadkey(quadkey)).with_population(tile.population);
            region.country = tile.country;
            region.location = MultiPoint::from(tile.locations).centroid();
            next.add_region(region);
        }

        debug!(
            "Aggregated {} tiles at size {} into {}",
            current.region_count(),
            tile_size,
            next.region_count()
        );
        current = next;
    }

    Ok(current)
}

/// Sums a series of movement graphs into one graph.
///
/// The first occurrence of a region wins; flow counts and lengths of
/// repeated edges are added up.
pub fn time_aggregate_movement(graphs: &[MobilityGraph]) -> Result<MobilityGraph, CovmobError> {
    let (first, rest) = graphs.split_first().ok_or(CovmobError::EmptyGraphList)?;

    let mut aggregated = MobilityGraph::new(first.meta.clone());
    for graph in rest {
        aggregated.meta.extend(&graph.meta);
    }

    for graph in graphs {
        for region in graph.regions() {
            if !aggregated.contains(&region.key) {
                aggregated.add_region(region.clone());
            }
        }
        for (from, to, edge) in graph.movements() {
            match aggregated.movement_mut(from, to) {
                Some(existing) => {
                    existing.n_crisis += edge.n_crisis;
                    existing.length_km += edge.length_km;
                }
                None => {
                    aggregated.add_movement(from, to, edge.clone())?;
                }
            }
        }
    }

    Ok(aggregated)
}

/// Sums consecutive population graphs in groups of `slice`.
///
/// Three 8-hour snapshots make one day. A trailing group shorter than
/// `slice` is dropped; a `slice` of 0 is treated as 1.
pub fn time_aggregate_population(
    graphs: &[MobilityGraph],
    slice: usize,
) -> Result<Vec<MobilityGraph>, CovmobError> {
    if graphs.is_empty() {
        return Err(CovmobError::EmptyGraphList);
    }

    let mut aggregated = Vec::with_capacity(graphs.len() / slice.max(1));
    for group in graphs.chunks_exact(slice.max(1)) {
        let mut sum = MobilityGraph::new(GraphMeta::default());
        for graph in group {
            sum.meta.extend(&graph.meta);
            for region in graph.regions() {
                let population = region.population()?;
                match sum.region_mut(&region.key) {
                    Some(existing) => existing.population = Some(existing.population()? + population),
                    None => {
                        sum.add_region(region.clone());
                    }
                }
            }
        }
        aggregated.push(sum);
    }

    Ok(aggregated)
}

/// Merges a population graph into a movement graph of the same time stamp.
///
/// The population graph is first aggregated down to the movement graph's
/// tile size. Mismatched stamps or a coarser population graph abort the merge.
pub fn merge_population_with_movement(
    population: &MobilityGraph,
    movement: &MobilityGraph,
) -> Result<MobilityGraph, CovmobError> {
    if population.meta.date_times != movement.meta.date_times {
        return Err(CovmobError::TimestampMismatch);
    }

    let tile_sizes = population.meta.tile_size.zip(movement.meta.tile_size);
    let (pop_size, mov_size) = tile_sizes.ok_or_else(|| {
        CovmobError::InvalidRegionKey("merging needs tile level graphs".to_string())
    })?;
    if pop_size < mov_size {
        return Err(CovmobError::TileSizeMismatch {
            population: pop_size,
            movement: mov_size,
        });
    }

    let aggregated = space_aggregate_population(population, pop_size - mov_size)?;
    let mut merged = movement.clone();
    merged.compose(&aggregated);
    Ok(merged)
}
