use crate::config::SimulationConfig;
use crate::lattice::AggregationLattice;
use crate::sim_params::SimParams;
use crate::walker::{sample_step, spawn_position, Particle};
use anyhow::Result;
use log::{debug, trace};
use rand::prelude::*;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

/// A snapshot of the aggregation state at a specific tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The tick at which the snapshot was taken.
    pub tick: u32,
    /// Number of occupied lattice cells, including the seed.
    pub occupied_count: u32,
    /// Current cluster-radius bound (max distance from center of any occupied cell).
    pub cluster_radius: f32,
    /// Cumulative walk attempts since the start of the run.
    pub walks_attempted: u64,
    /// Cumulative walks that ended in adhesion.
    pub walks_adhered: u64,
    /// Cumulative walks that exhausted their step budget without adhering.
    pub walks_exhausted: u64,
    /// Optional: coordinates of all occupied cells at snapshot time.
    /// Included only if `config.output.save_cells_in_snapshot` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupied_cells: Option<Vec<(i32, i32)>>,
}

/// How a single walk-to-completion attempt ended.
///
/// `Exhausted` is not an error; the driver simply retries on a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Adhered { x: i32, y: i32 },
    Exhausted,
}

/// Owns the lattice, the run's RNG and the walk loop.
///
/// This is the only place that mutates the occupancy grid and the
/// cluster-radius bound, and it does so exclusively on adhesion.
pub struct DlaSimulation {
    /// The simulation configuration, validated before the first walk.
    pub config: SimulationConfig,
    params: SimParams,
    lattice: AggregationLattice,
    /// Seeded RNG threaded through every spawn and step draw.
    rng: StdRng,
    angle_dist: Uniform<f32>,
    current_tick: u32,
    walks_attempted: u64,
    walks_adhered: u64,
    walks_exhausted: u64,
    /// Live particle for the traced variant; `None` in batch mode until the
    /// first traced tick spawns one.
    particle: Option<Particle>,
    recorded_snapshots: Vec<Snapshot>,
}

impl DlaSimulation {
    /// Creates a new simulation: validates the configuration, seeds the RNG
    /// and places the seed cell at the lattice center.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let params = config.get_sim_params();
        let rng = StdRng::seed_from_u64(params.rng_seed);
        let lattice = AggregationLattice::new(&params);
        let angle_dist = Uniform::new(0.0f32, 2.0 * std::f32::consts::PI)?;

        Ok(Self {
            config,
            params,
            lattice,
            rng,
            angle_dist,
            current_tick: 0,
            walks_attempted: 0,
            walks_adhered: 0,
            walks_exhausted: 0,
            particle: None,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Rebuilds the run from its initial state: fresh seed-only lattice,
    /// re-seeded RNG, zeroed counters. Recorded snapshots are kept.
    pub fn reset(&mut self) {
        self.lattice = AggregationLattice::new(&self.params);
        self.rng = StdRng::seed_from_u64(self.params.rng_seed);
        self.current_tick = 0;
        self.walks_attempted = 0;
        self.walks_adhered = 0;
        self.walks_exhausted = 0;
        self.particle = None;
    }

    /// Advances the simulation by one display tick.
    ///
    /// In batch mode this runs `walks_per_tick` whole walks; in traced mode
    /// it advances the live particle by a single step so the driver can
    /// render the walk in progress.
    pub fn advance(&mut self) {
        if self.params.trace_path {
            self.advance_step();
        } else {
            for _ in 0..self.params.walks_per_tick {
                self.walk();
            }
        }
        self.current_tick += 1;
    }

    /// Runs one walk to completion: spawn just outside the cluster, then up
    /// to `max_steps` moves in total. A move that lands in the boundary
    /// margin respawns the particle without refunding spent budget; a move
    /// that lands 4-adjacent to the structure adheres there.
    ///
    /// The margin check runs before the adhesion check, so a position that
    /// is both near the boundary and near the structure respawns instead of
    /// adhering.
    pub fn walk(&mut self) -> WalkOutcome {
        self.walks_attempted += 1;
        let (mut x, mut y) = self.spawn();

        for _ in 0..self.params.max_steps {
            let (dx, dy) = sample_step(&self.params, &mut self.rng);
            x += dx;
            y += dy;

            if self.lattice.in_reset_margin(x, y) {
                let (sx, sy) = self.spawn();
                x = sx;
                y = sy;
                continue;
            }

            if self.lattice.has_adjacent_occupied(x, y) {
                self.adhere(x, y);
                return WalkOutcome::Adhered { x, y };
            }
        }

        self.walks_exhausted += 1;
        trace!("walk exhausted after {} steps without adhesion", self.params.max_steps);
        WalkOutcome::Exhausted
    }

    /// Advances the traced variant by exactly one move. The particle's path
    /// survives across ticks and resets on respawn; on adhesion a fresh
    /// particle is spawned immediately so the next tick continues from it.
    fn advance_step(&mut self) {
        let mut particle = match self.particle.take() {
            Some(p) => p,
            None => {
                self.walks_attempted += 1;
                let (x, y) = self.spawn();
                Particle::spawned(x, y)
            }
        };

        let (dx, dy) = sample_step(&self.params, &mut self.rng);
        particle.x += dx;
        particle.y += dy;

        if self.lattice.in_reset_margin(particle.x, particle.y) {
            let (x, y) = self.spawn();
            particle.respawn_at(x, y);
        } else if self.lattice.has_adjacent_occupied(particle.x, particle.y) {
            self.adhere(particle.x, particle.y);
            self.walks_attempted += 1;
            let (x, y) = self.spawn();
            particle.respawn_at(x, y);
        } else {
            particle.record_visit();
        }

        self.particle = Some(particle);
    }

    fn spawn(&mut self) -> (i32, i32) {
        spawn_position(
            self.lattice.cluster_radius(),
            self.lattice.center(),
            &self.angle_dist,
            &mut self.rng,
        )
    }

    fn adhere(&mut self, x: i32, y: i32) {
        self.lattice.occupy(x, y);
        self.walks_adhered += 1;
        debug!(
            "adhesion at ({}, {}), {} cells occupied, radius bound {:.2}",
            x,
            y,
            self.lattice.occupied_count(),
            self.lattice.cluster_radius()
        );
    }

    /// Collects the current aggregate state into a [`Snapshot`].
    /// Called by the driver at record intervals.
    pub fn record_snapshot(&mut self) {
        let occupied_cells = if self.config.output.save_cells_in_snapshot {
            Some(self.lattice.occupied_cells())
        } else {
            None
        };

        self.recorded_snapshots.push(Snapshot {
            tick: self.current_tick,
            occupied_count: self.lattice.occupied_count(),
            cluster_radius: self.lattice.cluster_radius(),
            walks_attempted: self.walks_attempted,
            walks_adhered: self.walks_adhered,
            walks_exhausted: self.walks_exhausted,
            occupied_cells,
        });
    }

    pub fn recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    pub fn lattice(&self) -> &AggregationLattice {
        &self.lattice
    }

    /// Visited positions of the live traced particle since its last spawn.
    pub fn particle_path(&self) -> Option<&[(i32, i32)]> {
        self.particle.as_ref().map(|p| p.path.as_slice())
    }

    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn walks_adhered(&self) -> u64 {
        self.walks_adhered
    }

    pub fn walks_attempted(&self) -> u64 {
        self.walks_attempted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BiasConfig, LatticeConfig, OutputConfig, RunConfig, SimulationConfig, StepModel, WalkConfig,
    };

    fn test_config(grid_size: u32, max_steps: u32, rng_seed: u64) -> SimulationConfig {
        SimulationConfig {
            lattice: LatticeConfig { grid_size },
            walk: WalkConfig {
                max_steps,
                step_model: StepModel::FourWay,
                trace_path: false,
                rng_seed,
            },
            bias: BiasConfig::default(),
            run: RunConfig {
                ticks: 100,
                walks_per_tick: 1,
                record_interval_ticks: 10,
            },
            output: OutputConfig {
                base_filename: "test".to_string(),
                save_stats: false,
                save_cells: false,
                save_cells_in_snapshot: false,
                format: None,
            },
        }
    }

    #[test]
    fn new_rejects_invalid_bias_before_any_walk() {
        let mut config = test_config(11, 100, 1);
        config.bias.ex = 2.0;
        assert!(DlaSimulation::new(config).is_err());
    }

    #[test]
    fn zero_step_budget_returns_immediately() {
        let mut sim = DlaSimulation::new(test_config(11, 0, 1)).unwrap();
        assert_eq!(sim.walk(), WalkOutcome::Exhausted);
        assert_eq!(sim.walks_attempted(), 1);
        assert_eq!(sim.lattice().occupied_count(), 1);
    }

    #[test]
    fn adhesions_touch_the_structure_and_reach_center_neighbors() {
        let mut sim = DlaSimulation::new(test_config(11, 10_000, 42)).unwrap();
        let center = sim.lattice().center();
        assert_eq!(center, 5);

        let center_neighbor_occupied = |sim: &DlaSimulation| {
            sim.lattice().is_occupied(center + 1, center)
                || sim.lattice().is_occupied(center - 1, center)
                || sim.lattice().is_occupied(center, center + 1)
                || sim.lattice().is_occupied(center, center - 1)
        };

        let mut reached = false;
        for _ in 0..2_000 {
            if let WalkOutcome::Adhered { x, y } = sim.walk() {
                // The adhesion point must be 4-adjacent to a cell that was
                // already occupied; occupying (x, y) itself does not change
                // the occupancy of its neighbors.
                assert!(sim.lattice().has_adjacent_occupied(x, y));
            }
            if center_neighbor_occupied(&sim) {
                reached = true;
                break;
            }
        }
        assert!(reached, "no center-adjacent cell occupied after 2000 walks");
    }

    #[test]
    fn occupancy_is_monotonic_across_walks() {
        let mut sim = DlaSimulation::new(test_config(21, 5_000, 9)).unwrap();
        for _ in 0..20 {
            sim.walk();
        }
        let before: Vec<bool> = sim.lattice().occupancy().to_vec();

        for _ in 0..50 {
            sim.walk();
        }
        let after = sim.lattice().occupancy();
        for (idx, was_occupied) in before.iter().enumerate() {
            if *was_occupied {
                assert!(after[idx], "cell {} lost its occupancy", idx);
            }
        }
    }

    #[test]
    fn radius_bound_equals_recomputation_from_the_grid() {
        let mut sim = DlaSimulation::new(test_config(21, 5_000, 13)).unwrap();
        for _ in 0..100 {
            sim.walk();
            assert_eq!(
                sim.lattice().cluster_radius(),
                sim.lattice().max_occupied_distance()
            );
        }
        assert!(sim.walks_adhered() > 0);
    }

    #[test]
    fn identical_seeds_reproduce_identical_grids() {
        let mut a = DlaSimulation::new(test_config(21, 5_000, 77)).unwrap();
        let mut b = DlaSimulation::new(test_config(21, 5_000, 77)).unwrap();

        for _ in 0..60 {
            a.walk();
            b.walk();
        }

        assert_eq!(a.lattice().occupancy(), b.lattice().occupancy());
        assert_eq!(a.lattice().cluster_radius(), b.lattice().cluster_radius());
        assert_eq!(a.walks_adhered(), b.walks_adhered());
    }

    #[test]
    fn batch_advance_runs_walks_per_tick() {
        let mut config = test_config(21, 1_000, 4);
        config.run.walks_per_tick = 3;
        let mut sim = DlaSimulation::new(config).unwrap();

        sim.advance();
        sim.advance();
        assert_eq!(sim.current_tick(), 2);
        assert_eq!(sim.walks_attempted(), 6);
    }

    #[test]
    fn traced_mode_keeps_a_live_path_and_eventually_adheres() {
        let mut config = test_config(7, 5_000, 21);
        config.walk.trace_path = true;
        let mut sim = DlaSimulation::new(config).unwrap();
        assert!(sim.particle_path().is_none());

        for _ in 0..5_000 {
            sim.advance();
            let path = sim.particle_path().expect("traced particle must exist");
            assert!(!path.is_empty(), "path must always hold the spawn point");
        }

        assert!(sim.walks_adhered() >= 1, "no adhesion in 5000 traced steps");
        assert!(sim.lattice().occupied_count() > 1);
        assert_eq!(
            sim.lattice().cluster_radius(),
            sim.lattice().max_occupied_distance()
        );
    }

    #[test]
    fn snapshots_record_counters_and_optional_cells() {
        let mut config = test_config(11, 5_000, 2);
        config.output.save_cells_in_snapshot = true;
        let mut sim = DlaSimulation::new(config).unwrap();

        sim.record_snapshot();
        for _ in 0..10 {
            sim.advance();
        }
        sim.record_snapshot();

        let snapshots = sim.recorded_snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].tick, 0);
        assert_eq!(snapshots[0].occupied_count, 1);
        assert_eq!(snapshots[1].tick, 10);
        assert_eq!(snapshots[1].walks_attempted, 10);

        let cells = snapshots[1].occupied_cells.as_ref().unwrap();
        assert_eq!(cells.len(), snapshots[1].occupied_count as usize);
    }

    #[test]
    fn reset_restores_the_seed_only_lattice_and_replays_identically() {
        let mut sim = DlaSimulation::new(test_config(21, 5_000, 31)).unwrap();
        for _ in 0..40 {
            sim.walk();
        }
        let first_run: Vec<bool> = sim.lattice().occupancy().to_vec();

        sim.reset();
        assert_eq!(sim.lattice().occupied_count(), 1);
        assert_eq!(sim.lattice().cluster_radius(), 0.0);
        assert_eq!(sim.walks_attempted(), 0);

        for _ in 0..40 {
            sim.walk();
        }
        assert_eq!(sim.lattice().occupancy(), &first_run[..]);
    }
}
