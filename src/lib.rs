//! Lattice diffusion-limited aggregation (DLA) engine.
//!
//! Main components:
//! - [`config`]: TOML-backed run configuration and validation.
//! - [`sim_params`]: flat runtime parameters derived from the configuration.
//! - [`lattice`]: occupancy grid and cluster-radius bound.
//! - [`walker`]: spawn/step primitives and the transient walking particle.
//! - [`simulation`]: the walk engine, tick driver and snapshot recording.
//! - [`vecmath`]: small 2D vector helpers.

pub mod config;
pub mod lattice;
pub mod sim_params;
pub mod simulation;
pub mod vecmath;
pub mod walker;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, StepModel};
pub use lattice::AggregationLattice;
pub use sim_params::SimParams;
pub use simulation::{DlaSimulation, Snapshot, WalkOutcome};
