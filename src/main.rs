use covmob_rs::{CovmobError, Settings, pipeline};
use log::info;

fn main() -> Result<(), CovmobError> {
    pretty_env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    info!("Simulation settings: {:?}", settings.simulation);

    let series = pipeline::run(&settings)?;

    let last = series.scale.len().saturating_sub(1);
    if let Some(total) = series.total_at(last) {
        println!(
            "{:?} run, {} regions, step {} (R0 {:.2}): S {:.1}, I {:.1}, R {:.1}",
            settings.simulation.mode,
            series.regions.len(),
            last,
            settings.params().r0(),
            total.susceptible,
            total.infected,
            total.recovered
        );
    }
    println!("Series written to {}", settings.paths.output.display());

    Ok(())
}
