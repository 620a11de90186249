use crate::config::StepModel;
use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used on every walk step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Lattice
    pub grid_size: i32,
    pub center: i32,
    /// A walk respawns when a coordinate reaches this value or below.
    pub margin_lo: i32,
    /// A walk respawns when a coordinate reaches this value or above.
    pub margin_hi: i32,

    // Walk
    pub max_steps: u32,
    pub step_model: StepModel,
    pub trace_path: bool,
    pub rng_seed: u64,
    pub walks_per_tick: u32,

    // Bias field
    pub ex: f32,
    pub ey: f32,
    // Per-direction step probabilities for the four-way model.
    pub p_east: f32,
    pub p_west: f32,
    pub p_north: f32,
    pub p_south: f32,
}
