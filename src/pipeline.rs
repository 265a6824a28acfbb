//! Settings driven simulation runs over the data directories.

use crate::cases::{CaseSource, RkiArchive};
use crate::config::{Settings, SimulationMode};
use crate::error::CovmobError;
use crate::graph::{MobilityGraph, merge_population_with_movement};
use crate::io::{GraphKind, load_graphs, write_network_csv};
use crate::model::{
    InitialDistribution, NetworkSeries, dynamic_state_sir, init_state_sir, network_series,
    static_state_sir,
};
use chrono::NaiveDate;
use log::{info, warn};

fn case_date(graph: &MobilityGraph) -> Result<NaiveDate, CovmobError> {
    graph
        .meta
        .date_time()
        .map(|dt| dt.date())
        .ok_or_else(|| CovmobError::InvalidDate(format!("graph {:?} has no time stamp", graph.meta.files)))
}

fn distribution(
    settings: &Settings,
    date: NaiveDate,
    source: &dyn CaseSource,
) -> Result<InitialDistribution, CovmobError> {
    init_state_sir(date, settings.start_date()?, source, &settings.state_populations())
}

/// Closed SIR per administrative region of the first population snapshot.
pub fn static_run(settings: &Settings, source: &dyn CaseSource) -> Result<NetworkSeries, CovmobError> {
    let graphs = load_graphs(
        &settings.paths.admin_population,
        GraphKind::AdminPopulation,
        settings.simulation.file_key.as_deref(),
    )?;
    let graph = graphs.first().ok_or(CovmobError::EmptyGraphList)?;
    let distribution = distribution(settings, case_date(graph)?, source)?;

    static_state_sir(
        graph,
        &settings.params(),
        settings.simulation.timeframe,
        &distribution,
    )
}

/// Tile movement snapshots merged with the population snapshot of the same stamp.
///
/// Movement snapshots without a population counterpart are skipped. Regions
/// without a state name or population are dropped, later snapshots are
/// restricted to the regions of the first.
pub fn simulation_graphs(settings: &Settings) -> Result<Vec<MobilityGraph>, CovmobError> {
    let key = settings.simulation.file_key.as_deref();
    let movement = load_graphs(&settings.paths.movement, GraphKind::Movement, key)?;
    let population = load_graphs(&settings.paths.population, GraphKind::Population, key)?;

    let mut merged = Vec::with_capacity(movement.len());
    for mov in &movement {
        match population.iter().find(|p| p.meta.date_times == mov.meta.date_times) {
            Some(pop) => merged.push(merge_population_with_movement(pop, mov)?),
            None => warn!("No population snapshot for {:?}, skipped", mov.meta.files),
        }
    }

    let first = merged
        .first()
        .ok_or(CovmobError::EmptyGraphList)?
        .subgraph(|r| r.polygon_name.is_some() && r.population.is_some());
    let rest = merged
        .iter()
        .skip(1)
        .map(|g| g.subgraph(|r| first.contains(&r.key)));

    Ok(std::iter::once(first.clone()).chain(rest).collect())
}

/// Network SIR with population exchange along the movement edges.
pub fn dynamic_run(settings: &Settings, source: &dyn CaseSource) -> Result<NetworkSeries, CovmobError> {
    let graphs = simulation_graphs(settings)?;
    let first = graphs.first().ok_or(CovmobError::EmptyGraphList)?;
    let distribution = distribution(settings, case_date(first)?, source)?;

    let run = dynamic_state_sir(
        &graphs,
        &settings.params(),
        settings.simulation.timeframe,
        &distribution,
    )?;
    network_series(&run)
}

/// Runs the configured simulation on the RKI archive and writes the series CSV.
pub fn run(settings: &Settings) -> Result<NetworkSeries, CovmobError> {
    let archive = RkiArchive::new(&settings.paths.rki);
    let series = match settings.simulation.mode {
        SimulationMode::Static => static_run(settings, &archive)?,
        SimulationMode::Dynamic => dynamic_run(settings, &archive)?,
    };

    write_network_csv(&series, &settings.paths.output)?;
    info!(
        "{} regions over {} steps written to {}",
        series.regions.len(),
        series.scale.len(),
        settings.paths.output.display()
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RegionKey;
    use std::path::Path;
    use tempfile::tempdir;

    const MOVEMENT: &str = "\
geometry,date_time,start_polygon_id,start_polygon_name,end_polygon_id,end_polygon_name,length_km,tile_size,country,level,n_crisis,start_lat,start_lon,end_lat,end_lon,start_quadkey,end_quadkey
,2020-04-01 0800,11,Berlin,12,Brandenburg,27.5,13,DE,LEVEL3,120,52.52,13.40,52.39,13.05,1202102332221,1202102331333
,2020-04-01 0800,12,Brandenburg,11,Berlin,27.5,13,DE,LEVEL3,80,52.39,13.05,52.52,13.40,1202102331333,1202102332221
";

    const POPULATION: &str = "\
date_time,quadkey,lat,lon,country,n_crisis,n_baseline
2020-04-01 0800,1202102332221,52.52,13.40,DE,1500.0,1400.0
2020-04-01 0800,1202102331333,52.39,13.05,DE,700.0,650.0
2020-04-01 0800,1202102331332,52.38,13.04,DE,300.0,320.0
";

    const ADMIN_POPULATION: &str = "\
date_time,lat,lon,country,polygon_name,polygon_id,n_crisis
2020-04-01 0800,52.52,13.40,DE,Berlin,11,1500
2020-04-01 0800,52.39,13.05,DE,Brandenburg,12,700
";

    const REPORT: &str = "\
ObjectId,IdBundesland,Bundesland,Landkreis,Altersgruppe,Geschlecht,AnzahlFall,AnzahlTodesfall,Meldedatum,NeuerFall,NeuerTodesfall,NeuGenesen,AnzahlGenesen
1,11,Berlin,SK Berlin Mitte,A35-A59,M,3669,0,2020/03/20 00:00:00,0,0,0,0
";

    fn write_file(dir: &Path, name: &str, content: &str) -> Result<(), CovmobError> {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CovmobError::IoError(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| CovmobError::IoError(e.to_string()))
    }

    fn settings(root: &Path, mode: SimulationMode) -> Result<Settings, CovmobError> {
        write_file(root, "movement_tile/Germany_2020_04_01_0800.csv", MOVEMENT)?;
        write_file(root, "population_tile/Germany_2020_04_01_0800.csv", POPULATION)?;
        write_file(root, "population_admin/Germany_2020_04_01_0800.csv", ADMIN_POPULATION)?;
        write_file(root, "rki/April2020/RKI_COVID19_2020-04-01.csv", REPORT)?;

        let mut settings = Settings::from_toml_str(
            r#"
            [simulation]
            timeframe = 3
            start_date = "2020-03-01"

            [state_populations]
            Berlin = 3669491
            Brandenburg = 2521893
            "#,
        )?
        .data_root(root);
        settings.paths.output = root.join("sir_network.csv");
        settings.simulation.mode = mode;
        Ok(settings)
    }

    #[test]
    fn test_dynamic_run_from_settings() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        let settings = settings(dir.path(), SimulationMode::Dynamic)?;

        let graphs = simulation_graphs(&settings)?;
        assert_eq!(graphs.len(), 1);
        // The third population tile has no state name
        assert_eq!(graphs[0].region_count(), 2);

        let series = run(&settings)?;
        // A single snapshot clamps the run to step 0
        assert_eq!(series.scale, vec![0]);

        // Cases reported in March only count because of the configured start
        let berlin = series
            .get(&RegionKey::quadkey("1202102332221"))
            .and_then(|s| s.state_at(0))
            .ok_or_else(|| CovmobError::UnknownRegion("1202102332221".to_string()))?;
        assert!((berlin.infected - 1500.0 * 3669.0 / 3_669_491.0).abs() < 1e-9);

        let output = std::fs::read_to_string(&settings.paths.output)
            .map_err(|e| CovmobError::IoError(e.to_string()))?;
        assert_eq!(output.lines().count(), 3);
        Ok(())
    }

    #[test]
    fn test_static_run_from_settings() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        let settings = settings(dir.path(), SimulationMode::Static)?;

        let series = run(&settings)?;

        assert_eq!(series.regions.len(), 2);
        assert_eq!(series.scale.len(), 4);
        let total = series
            .total_at(3)
            .ok_or_else(|| CovmobError::UnknownRegion("total".to_string()))?;
        assert!((total.population() - 2200.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_default_window_misses_earlier_cases() -> Result<(), CovmobError> {
        let dir = tempdir().map_err(|e| CovmobError::IoError(e.to_string()))?;
        let mut settings = settings(dir.path(), SimulationMode::Static)?;
        settings.simulation.start_date = None;

        // 2020-06-01 lies after the case date
        let series = static_run(&settings, &RkiArchive::new(&settings.paths.rki))?;
        let total = series
            .total_at(0)
            .ok_or_else(|| CovmobError::UnknownRegion("total".to_string()))?;
        assert_eq!(total.infected, 0.0);
        Ok(())
    }

    #[test]
    fn test_missing_directories() {
        let settings = Settings::default().data_root("/nonexistent/covmob");
        assert!(matches!(run(&settings), Err(CovmobError::IoError(_))));
    }
}
