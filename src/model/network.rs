use crate::error::CovmobError;
use crate::graph::{MobilityGraph, Region, RegionKey};
use crate::model::init::{InitialDistribution, shares_for};
use crate::model::{SirParams, SirSeries, SirState, closed_sir};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Epidemic state of every region at one time step.
pub type StateMap = BTreeMap<RegionKey, SirState>;

/// Time series of every region, in graph order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkSeries {
    pub scale: Vec<usize>,
    pub regions: Vec<(RegionKey, SirSeries)>,
}

impl NetworkSeries {
    pub fn get(&self, key: &RegionKey) -> Option<&SirSeries> {
        self.regions.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    /// Sum over all regions at `step`.
    pub fn total_at(&self, step: usize) -> Option<SirState> {
        self.regions
            .iter()
            .map(|(_, series)| series.state_at(step))
            .try_fold(SirState::default(), |acc, s| Some(acc + s?))
    }
}

fn seed(region: &Region, distribution: &InitialDistribution) -> Result<SirState, CovmobError> {
    let shares = shares_for(distribution, region.state_name()?)?;
    Ok(shares.seed(region.population()?))
}

/// Initial state of every region from its state shares and its own population.
pub fn seed_states(
    graph: &MobilityGraph,
    distribution: &InitialDistribution,
) -> Result<StateMap, CovmobError> {
    let mut states = StateMap::new();
    for region in graph.regions() {
        states.insert(region.key.clone(), seed(region, distribution)?);
    }
    Ok(states)
}

/// Closed SIR run per region, without any exchange between regions.
pub fn static_state_sir(
    graph: &MobilityGraph,
    params: &SirParams,
    timeframe: usize,
    distribution: &InitialDistribution,
) -> Result<NetworkSeries, CovmobError> {
    let mut series = NetworkSeries {
        scale: (0..=timeframe).collect(),
        regions: Vec::with_capacity(graph.region_count()),
    };

    for region in graph.regions() {
        let initial = seed(region, distribution)?;
        let run = closed_sir(initial, params, timeframe).map_err(|e| with_region(e, &region.key))?;
        series.regions.push((region.key.clone(), run));
    }

    Ok(series)
}

/// Moves population along the edges of `graph`.
///
/// Each edge carries `n_crisis / N_source` of every compartment of its
/// source's previous state to its target. The moved share leaves the source,
/// so the summed population is unchanged. Self loops move nothing. A source
/// whose outflow exceeds its population is left with negative compartments.
pub fn exchange(graph: &MobilityGraph, last: &StateMap) -> Result<StateMap, CovmobError> {
    let mut next = last.clone();

    for key in graph.keys() {
        let outflow = graph.outflow(key) as f64;
        if let Some(state) = last.get(key) {
            if outflow > state.population() {
                warn!(
                    "{}: outflow {} exceeds population {:.1}",
                    key,
                    outflow,
                    state.population()
                );
            }
        }
    }

    for target in graph.keys() {
        for (source, edge) in graph.inbound(target) {
            if source.key == *target {
                continue;
            }
            let source_last = last
                .get(&source.key)
                .ok_or_else(|| CovmobError::MissingPopulation(source.key.to_string()))?;
            let population = source_last.population();
            if population == 0.0 {
                return Err(CovmobError::ZeroPopulation(source.key.to_string()));
            }

            let moved = source_last.scaled(edge.n_crisis as f64 / population);
            *next.entry(target.clone()).or_default() += moved;
            *next.entry(source.key.clone()).or_default() -= moved;
        }
    }

    Ok(next)
}

/// Runs the network SIR over a series of graphs, one per time step.
///
/// Step `t` first exchanges population along the edges of graph `t`, then
/// applies the SIR step to the exchanged totals. The timeframe is clamped to
/// the number of graphs minus one. Returns the graphs up to the timeframe,
/// each region carrying its state and population at that step.
pub fn propagate(
    graphs: &[MobilityGraph],
    initial: &StateMap,
    params: &SirParams,
    timeframe: usize,
) -> Result<Vec<MobilityGraph>, CovmobError> {
    let first = graphs.first().ok_or(CovmobError::EmptyGraphList)?;
    let timeframe = if timeframe >= graphs.len() {
        warn!(
            "Timeframe {} exceeds the {} available graphs, clamped to {}",
            timeframe,
            graphs.len(),
            graphs.len() - 1
        );
        graphs.len() - 1
    } else {
        timeframe
    };

    let mut series = graphs[..=timeframe].to_vec();
    let mut last = initial.clone();
    write_states(&mut series[0], &last, first);

    for (t, graph) in series.iter_mut().enumerate().skip(1) {
        let exchanged = exchange(graph, &last)?;
        let mut next = StateMap::new();
        for (key, state) in exchanged {
            let stepped = state.step(params).map_err(|e| with_region(e, &key))?;
            next.insert(key, stepped);
        }
        write_states(graph, &next, first);
        debug!("Step {}: {} regions", t, next.len());
        last = next;
    }

    Ok(series)
}

/// Seeds the first graph from `distribution` and runs [`propagate`].
pub fn dynamic_state_sir(
    graphs: &[MobilityGraph],
    params: &SirParams,
    timeframe: usize,
    distribution: &InitialDistribution,
) -> Result<Vec<MobilityGraph>, CovmobError> {
    let first = graphs.first().ok_or(CovmobError::EmptyGraphList)?;
    let initial = seed_states(first, distribution)?;
    propagate(graphs, &initial, params, timeframe)
}

/// Collects the per region series from the output of [`propagate`].
///
/// Covers the regions of the first graph that carry a state.
pub fn network_series(graphs: &[MobilityGraph]) -> Result<NetworkSeries, CovmobError> {
    let first = graphs.first().ok_or(CovmobError::EmptyGraphList)?;
    let keys: Vec<&RegionKey> = first
        .regions()
        .filter(|r| r.state.is_some())
        .map(|r| &r.key)
        .collect();

    let mut series = NetworkSeries {
        scale: (0..graphs.len()).collect(),
        regions: Vec::with_capacity(keys.len()),
    };
    for key in keys {
        let mut run = SirSeries::with_capacity(graphs.len());
        for (t, graph) in graphs.iter().enumerate() {
            let state = graph.region(key).and_then(|r| r.state).ok_or_else(|| {
                CovmobError::UnknownRegion(format!("{} has no state at step {}", key, t))
            })?;
            run.push(t, state);
        }
        series.regions.push((key.clone(), run));
    }

    Ok(series)
}

fn write_states(graph: &mut MobilityGraph, states: &StateMap, template: &MobilityGraph) {
    for (key, state) in states {
        if !graph.contains(key) {
            let region = template
                .region(key)
                .cloned()
                .unwrap_or_else(|| Region::new(key.clone()));
            graph.add_region(region);
        }
        if let Some(region) = graph.region_mut(key) {
            region.state = Some(*state);
            region.population = Some(state.population());
        }
    }
}

fn with_region(err: CovmobError, key: &RegionKey) -> CovmobError {
    match err {
        CovmobError::ZeroPopulation(_) => CovmobError::ZeroPopulation(key.to_string()),
        CovmobError::NonFinite(msg) => CovmobError::NonFinite(format!("{}: {}", key, msg)),
        other => other,
    }
}
