//! Headless host loop: runs the rig for a few seconds and logs a summary.
//!
//! ```text
//! RUST_LOG=attitude_rig=debug cargo run --example headless -- rig.ron
//! ```

use std::error::Error;

use attitude_rig::{SimConfig, Simulation};
use nalgebra::Vector3;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const FRAME_DT: f64 = 1.0 / 100.0;
const RUN_SECONDS: f64 = 8.0;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_path(path)?,
        None => SimConfig::default(),
    };
    let mut sim = Simulation::new(config)?;
    sim.command_rate_deg_s(Vector3::new(0.0, 0.0, 90.0));

    let frames = (RUN_SECONDS / FRAME_DT).round() as usize;
    for frame in 1..=frames {
        sim.step(FRAME_DT);

        if frame % 100 == 0 {
            let state = sim.state();
            let truth = state.attitude.euler.to_degrees();
            let estimate = state.estimator.euler.to_degrees();
            tracing::info!(
                t = state.timing.elapsed,
                yaw = truth.z,
                yaw_estimate = estimate.z,
                thrust = state.rotor.total_thrust_newton,
                power = state.rotor.total_power_watt,
                energy = state.power.energy_joule,
                "frame"
            );
        }
    }

    let state = sim.state();
    tracing::info!(
        samples = sim.history().attitude.len(),
        dynamics_output = state.dynamics_state.output,
        diagnostics = ?state.diagnostics,
        "run complete"
    );
    Ok(())
}
