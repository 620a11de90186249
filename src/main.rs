use anyhow::Result;
use log::{debug, error, info, warn};
use std::fs::File;
use std::time::Instant;

use dla_engine::config::SimulationConfig;
use dla_engine::simulation::{DlaSimulation, Snapshot};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting DLA aggregation engine...");

    // --- Load Configuration ---
    let config = SimulationConfig::load("config.toml")?;

    // --- Initialize Simulation ---
    let mut sim = DlaSimulation::new(config)?;
    info!(
        "Lattice initialized: {0}x{0} cells, seed at ({1}, {1}).",
        sim.params().grid_size,
        sim.params().center
    );
    debug!("Simulation parameters: {:#?}", sim.params());

    let total_ticks = sim.config.run.ticks;
    let mut record_interval = sim.config.run.record_interval_ticks;
    if record_interval == 0 {
        warn!("record_interval_ticks is 0; recording a snapshot every tick.");
        record_interval = 1;
    }

    info!(
        "Starting run: {} ticks, snapshot every {} ticks.",
        total_ticks, record_interval
    );
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    // --- Initial Snapshot (tick 0) ---
    sim.record_snapshot();

    // --- Tick Loop ---
    for tick in 0..total_ticks {
        sim.advance();

        // Print status periodically and at snapshot ticks.
        let now = Instant::now();
        let should_print = now.duration_since(previous_print_time).as_secs_f64() >= 5.0;
        let is_record_tick = (tick + 1) % record_interval == 0;
        let is_last_tick = tick == total_ticks - 1;

        if should_print || is_record_tick || is_last_tick {
            info!(
                "Tick [{}/{}] | Occupied: {} | Radius bound: {:.2} | Elapsed: {:.2} s",
                tick + 1,
                total_ticks,
                sim.lattice().occupied_count(),
                sim.lattice().cluster_radius(),
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;

            if is_record_tick || is_last_tick {
                sim.record_snapshot();
            }
        }
    }

    info!(
        "Run finished in {:.3} s: {} walks attempted, {} adhered, {} cells occupied.",
        start_time.elapsed().as_secs_f64(),
        sim.walks_attempted(),
        sim.walks_adhered(),
        sim.lattice().occupied_count()
    );

    // --- Save Recorded Data ---
    if sim.config.output.save_stats {
        let format = match sim.config.output.format.as_deref().unwrap_or("json") {
            f @ ("json" | "bincode" | "messagepack") => f,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                "json"
            }
        };
        if let Err(e) = save_snapshots(
            sim.recorded_snapshots(),
            format,
            &sim.config.output.base_filename,
        ) {
            error!("Error saving snapshots: {}", e);
        }
    } else {
        info!("Skipping snapshot export as per config (save_stats is false).");
    }

    // Save the final occupied cells if requested (separate from full snapshots)
    if sim.config.output.save_cells {
        let filename = format!("{}_cells.csv", sim.config.output.base_filename);
        match csv::Writer::from_path(&filename) {
            Ok(mut writer) => {
                writer.write_record(["x", "y"])?;
                for (x, y) in sim.lattice().occupied_cells() {
                    writer.write_record(&[x.to_string(), y.to_string()])?;
                }
                writer.flush()?;
                info!("Occupied cells saved to {}", filename);
            }
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    } else {
        info!("Skipping occupied-cell export as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Writes the recorded snapshots in the selected serialization format.
/// The caller normalizes `format` to one of the supported names.
fn save_snapshots(snapshots: &[Snapshot], format: &str, base_filename: &str) -> Result<()> {
    match format {
        "json" => {
            let filename = format!("{}_snapshots.json", base_filename);
            let file = File::create(&filename)?;
            serde_json::to_writer(file, snapshots)?;
            info!("All snapshots saved to {}", filename);
        }
        "bincode" => {
            let filename = format!("{}_snapshots.bin", base_filename);
            let file = File::create(&filename)?;
            bincode::serialize_into(file, snapshots)?;
            info!("All snapshots saved to {} (binary format)", filename);
        }
        "messagepack" => {
            let filename = format!("{}_snapshots.msgpack", base_filename);
            let mut file = File::create(&filename)?;
            rmp_serde::encode::write(&mut file, snapshots)?;
            info!("All snapshots saved to {} (MessagePack format)", filename);
        }
        other => anyhow::bail!("unsupported snapshot format '{}'", other),
    }
    Ok(())
}
