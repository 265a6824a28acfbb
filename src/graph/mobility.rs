use crate::error::CovmobError;
use crate::graph::region::{GraphMeta, MovementEdge, Region, RegionKey};
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Directed graph of regions connected by observed movement.
///
/// Population snapshots are graphs without edges. Regions keep their
/// insertion order, which is the order the simulator visits them in.
#[derive(Debug, Clone, Default)]
pub struct MobilityGraph {
    pub meta: GraphMeta,
    graph: DiGraph<Region, MovementEdge>,
    index: HashMap<RegionKey, NodeIndex>,
}

impl MobilityGraph {
    pub fn new(meta: GraphMeta) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    /// Adds a region, merging its attributes into an existing region with the same key.
    pub fn add_region(&mut self, region: Region) -> NodeIndex {
        match self.index.get(&region.key) {
            Some(&idx) => {
                self.graph[idx].merge_from(&region);
                idx
            }
            None => {
                let key = region.key.clone();
                let idx = self.graph.add_node(region);
                self.index.insert(key, idx);
                idx
            }
        }
    }

    /// Adds or replaces the edge `from -> to`. Both regions must exist.
    pub fn add_movement(
        &mut self,
        from: &RegionKey,
        to: &RegionKey,
        edge: MovementEdge,
    ) -> Result<EdgeIndex, CovmobError> {
        let a = self.node(from)?;
        let b = self.node(to)?;
        Ok(self.graph.update_edge(a, b, edge))
    }

    fn node(&self, key: &RegionKey) -> Result<NodeIndex, CovmobError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| CovmobError::UnknownRegion(key.to_string()))
    }

    pub fn contains(&self, key: &RegionKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn region(&self, key: &RegionKey) -> Option<&Region> {
        self.index.get(key).map(|&idx| &self.graph[idx])
    }

    pub fn region_mut(&mut self, key: &RegionKey) -> Option<&mut Region> {
        let idx = *self.index.get(key)?;
        self.graph.node_weight_mut(idx)
    }

    pub fn movement(&self, from: &RegionKey, to: &RegionKey) -> Option<&MovementEdge> {
        let a = *self.index.get(from)?;
        let b = *self.index.get(to)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge)
    }

    pub fn movement_mut(&mut self, from: &RegionKey, to: &RegionKey) -> Option<&mut MovementEdge> {
        let a = *self.index.get(from)?;
        let b = *self.index.get(to)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight_mut(edge)
    }

    pub fn region_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn movement_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Regions in insertion order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.graph.node_weights()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RegionKey> {
        self.graph.node_weights().map(|r| &r.key)
    }

    /// Edges as (source key, target key, edge).
    pub fn movements(&self) -> impl Iterator<Item = (&RegionKey, &RegionKey, &MovementEdge)> {
        self.graph.edge_references().map(|e| {
            (
                &self.graph[e.source()].key,
                &self.graph[e.target()].key,
                e.weight(),
            )
        })
    }

    /// Inbound edges of `key` with their source regions.
    pub fn inbound(&self, key: &RegionKey) -> Vec<(&Region, &MovementEdge)> {
        let Some(&idx) = self.index.get(key) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (&self.graph[e.source()], e.weight()))
            .collect()
    }

    /// Total flow from `key` to other regions, self loops excluded.
    pub fn outflow(&self, key: &RegionKey) -> u64 {
        let Some(&idx) = self.index.get(key) else {
            return 0;
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| e.target() != idx)
            .map(|e| e.weight().n_crisis)
            .sum()
    }

    /// Regions matching `predicate`.
    pub fn search_regions<F>(&self, predicate: F) -> Vec<&Region>
    where
        F: Fn(&Region) -> bool,
    {
        self.regions().filter(|r| predicate(r)).collect()
    }

    /// Edges matching `predicate`, called with source, target and edge.
    pub fn search_movements<F>(&self, predicate: F) -> Vec<(&Region, &Region, &MovementEdge)>
    where
        F: Fn(&Region, &Region, &MovementEdge) -> bool,
    {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
            .filter(|(a, b, w)| predicate(a, b, w))
            .collect()
    }

    /// Graph induced by the regions matching `predicate`.
    pub fn subgraph<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Region) -> bool,
    {
        let graph = self.graph.filter_map(
            |_, region| predicate(region).then(|| region.clone()),
            |_, edge| Some(edge.clone()),
        );
        Self::from_parts(self.meta.clone(), graph)
    }

    pub fn remove_self_loops(&mut self) {
        self.graph
            .retain_edges(|g, e| g.edge_endpoints(e).is_none_or(|(a, b)| a != b));
    }

    /// Drops regions with neither inbound nor outbound edges.
    pub fn remove_isolates(&mut self) {
        let connected: Vec<bool> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.neighbors_undirected(idx).next().is_some())
            .collect();
        let graph = self.graph.filter_map(
            |idx, region| connected[idx.index()].then(|| region.clone()),
            |_, edge| Some(edge.clone()),
        );
        *self = Self::from_parts(self.meta.clone(), graph);
    }

    /// Adds the regions and edges of `other`; attributes set on `other` win.
    pub fn compose(&mut self, other: &MobilityGraph) {
        for region in other.regions() {
            self.add_region(region.clone());
        }
        for e in other.graph.edge_references() {
            let a = self.index.get(&other.graph[e.source()].key).copied();
            let b = self.index.get(&other.graph[e.target()].key).copied();
            if let (Some(a), Some(b)) = (a, b) {
                self.graph.update_edge(a, b, e.weight().clone());
            }
        }
        self.meta.files.extend(other.meta.files.iter().cloned());
    }

    fn from_parts(meta: GraphMeta, graph: DiGraph<Region, MovementEdge>) -> Self {
        let index = graph
            .node_indices()
            .map(|idx| (graph[idx].key.clone(), idx))
            .collect();
        Self { meta, graph, index }
    }
}

/// Graphs whose metadata matches `predicate`.
pub fn search_graphs<F>(graphs: &[MobilityGraph], predicate: F) -> Vec<&MobilityGraph>
where
    F: Fn(&GraphMeta) -> bool,
{
    graphs.iter().filter(|g| predicate(&g.meta)).collect()
}
