use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

// Configuration for the occupancy lattice
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LatticeConfig {
    pub grid_size: u32,
}

/// Which transition model a walking particle uses.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StepModel {
    /// One of the four axis-aligned unit moves per step; honors the bias field.
    FourWay,
    /// Each axis displacement drawn independently from {-1, 0, 1}, so diagonal
    /// moves and a stationary no-op are valid steps. Unbiased only.
    Diagonal,
}

impl Default for StepModel {
    fn default() -> Self {
        StepModel::FourWay
    }
}

// Configuration for the random walk itself
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WalkConfig {
    /// Total step budget per walk attempt, summed across boundary respawns.
    pub max_steps: u32,
    #[serde(default)]
    pub step_model: StepModel,
    /// Advance one step per tick and keep the visited path for observers,
    /// instead of running whole walks per tick.
    #[serde(default)]
    pub trace_path: bool,
    pub rng_seed: u64,
}

// Directional bias field applied by the four-way step model
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BiasConfig {
    #[serde(default)]
    pub ex: f32,
    #[serde(default)]
    pub ey: f32,
}

impl Default for BiasConfig {
    fn default() -> Self {
        BiasConfig { ex: 0.0, ey: 0.0 }
    }
}

// Configuration for the frame-driven run
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunConfig {
    pub ticks: u32,
    #[serde(default = "default_walks_per_tick")]
    pub walks_per_tick: u32,
    pub record_interval_ticks: u32,
}

fn default_walks_per_tick() -> u32 {
    1
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_stats: bool,
    pub save_cells: bool,
    /// Include the full occupied-cell list in every snapshot (can be large).
    #[serde(default)]
    pub save_cells_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub lattice: LatticeConfig,
    pub walk: WalkConfig,
    #[serde(default)]
    pub bias: BiasConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// Rejects invalid configurations before any walk executes.
    pub fn validate(&self) -> Result<()> {
        if self.lattice.grid_size < 5 {
            anyhow::bail!("grid_size must be at least 5.");
        }
        if self.lattice.grid_size % 2 == 0 {
            anyhow::bail!("grid_size must be odd so the seed sits on a single center cell.");
        }
        if !self.bias.ex.is_finite() || self.bias.ex.abs() > 1.0 {
            anyhow::bail!(
                "bias component ex = {} is outside [-1, 1]; step probabilities would not sum to 1.",
                self.bias.ex
            );
        }
        if !self.bias.ey.is_finite() || self.bias.ey.abs() > 1.0 {
            anyhow::bail!(
                "bias component ey = {} is outside [-1, 1]; step probabilities would not sum to 1.",
                self.bias.ey
            );
        }
        if self.walk.step_model == StepModel::Diagonal && (self.bias.ex != 0.0 || self.bias.ey != 0.0) {
            anyhow::bail!("the diagonal step model does not support a bias field; set ex and ey to 0.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let grid_size = self.lattice.grid_size as i32;
        let ex = self.bias.ex;
        let ey = self.bias.ey;

        SimParams {
            grid_size,
            center: grid_size / 2,
            margin_lo: 1,
            margin_hi: grid_size - 2,

            max_steps: self.walk.max_steps,
            step_model: self.walk.step_model,
            trace_path: self.walk.trace_path,
            rng_seed: self.walk.rng_seed,
            walks_per_tick: self.run.walks_per_tick.max(1),

            ex,
            ey,
            p_east: (1.0 + ex) / 4.0,
            p_west: (1.0 - ex) / 4.0,
            p_north: (1.0 + ey) / 4.0,
            p_south: (1.0 - ey) / 4.0,
        }
    }
}
