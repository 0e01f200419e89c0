// Multi-agent navigation demo
//
// usage: multi_agent_sim [scenario.toml]
// Without an argument the built-in three-agent scenario is used.
// Set RUST_LOG to change verbosity (default: info).

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_swarm_nav::simulation::{NullObserver, RunSummary, Scenario, SimulationObserver};
use rust_swarm_nav::utils::FrameRecorder;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn print_summary(summary: &RunSummary) {
    println!("outcome: {:?} after {} steps", summary.outcome, summary.steps);
    for (i, arrived) in summary.arrived.iter().enumerate() {
        println!("  agent_{}: {}", i + 1, if *arrived { "arrived" } else { "not arrived" });
    }
}

fn main() -> Result<()> {
    init_tracing();

    let scenario = match std::env::args().nth(1) {
        Some(path) => Scenario::load(&path).with_context(|| format!("failed to load scenario {}", path))?,
        None => {
            info!("no scenario given, using built-in default");
            Scenario::default()
        }
    };

    let map = scenario.build_map().context("failed to build occupancy map")?;
    let mut sim = scenario
        .build_simulation(&map)
        .context("failed to set up simulation")?;

    let mut observer: Box<dyn SimulationObserver> = if scenario.recorder.enabled {
        Box::new(FrameRecorder::new(scenario.recorder.clone()).context("failed to set up frame recorder")?)
    } else {
        Box::new(NullObserver)
    };

    let summary = sim.run(observer.as_mut());
    print_summary(&summary);
    Ok(())
}
