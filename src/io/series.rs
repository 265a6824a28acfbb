use crate::error::CovmobError;
use crate::model::{NetworkSeries, SirSeries, SirState};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

#[derive(Serialize)]
struct StepRow {
    step: usize,
    susceptible: f64,
    infected: f64,
    recovered: f64,
}

#[derive(Serialize)]
struct RegionStepRow<'a> {
    step: usize,
    region: &'a str,
    susceptible: f64,
    infected: f64,
    recovered: f64,
}

fn states(series: &SirSeries) -> impl Iterator<Item = Result<(usize, SirState), CovmobError>> + '_ {
    series.scale.iter().enumerate().map(|(i, step)| {
        series
            .state_at(i)
            .map(|state| (*step, state))
            .ok_or_else(|| CovmobError::CsvError(format!("Series too short at step {}", step)))
    })
}

/// Writes a closed SIR run as `step,susceptible,infected,recovered`.
pub fn write_series_csv(series: &SirSeries, path: impl AsRef<Path>) -> Result<(), CovmobError> {
    let file = File::create(path).map_err(|e| CovmobError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(file);
    for item in states(series) {
        let (step, state) = item?;
        writer
            .serialize(StepRow {
                step,
                susceptible: state.susceptible,
                infected: state.infected,
                recovered: state.recovered,
            })
            .map_err(|e| CovmobError::CsvError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| CovmobError::CsvError(e.to_string()))
}

/// Writes a network run in long format, one row per region and step.
pub fn write_network_csv(series: &NetworkSeries, path: impl AsRef<Path>) -> Result<(), CovmobError> {
    let file = File::create(path).map_err(|e| CovmobError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(file);
    for (key, run) in &series.regions {
        let region = key.to_string();
        for item in states(run) {
            let (step, state) = item?;
            writer
                .serialize(RegionStepRow {
                    step,
                    region: &region,
                    susceptible: state.susceptible,
                    infected: state.infected,
                    recovered: state.recovered,
                })
                .map_err(|e| CovmobError::CsvError(e.to_string()))?;
        }
    }
    writer
        .flush()
        .map_err(|e| CovmobError::CsvError(e.to_string()))
}
