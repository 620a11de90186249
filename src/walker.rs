use crate::config::StepModel;
use crate::sim_params::SimParams;
use crate::vecmath::{angle_to_vec, Vec2};
use rand::prelude::*;
use rand_distr::Uniform;

/// Transient state of one walking particle.
///
/// Only the traced (step-per-tick) variant keeps a particle alive across
/// ticks; batch walks track their position in locals instead. The path holds
/// every position visited since the last spawn, starting with the spawn
/// point itself, so observers can overlay a live trace.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: i32,
    pub y: i32,
    pub path: Vec<(i32, i32)>,
}

impl Particle {
    pub fn spawned(x: i32, y: i32) -> Self {
        Self { x, y, path: vec![(x, y)] }
    }

    /// Moves the particle to a fresh spawn point and drops the recorded path.
    pub fn respawn_at(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.path.clear();
        self.path.push((x, y));
    }

    /// Appends the current position to the visited path.
    pub fn record_visit(&mut self) {
        self.path.push((self.x, self.y));
    }
}

/// Picks a spawn point just outside the current cluster radius: a uniformly
/// random angle, distance `radius + 1` from center, rounded to the lattice.
pub fn spawn_position(
    radius: f32,
    center: i32,
    angle_dist: &Uniform<f32>,
    rng: &mut StdRng,
) -> (i32, i32) {
    let theta = rng.sample(angle_dist);
    let offset = angle_to_vec(theta).scale(radius + 1.0);
    let spawn = Vec2::new(center as f32, center as f32).add(offset);
    (spawn.x.round() as i32, spawn.y.round() as i32)
}

/// Draws one step displacement according to the configured transition model.
pub fn sample_step(params: &SimParams, rng: &mut StdRng) -> (i32, i32) {
    match params.step_model {
        StepModel::FourWay => {
            // Inverse-CDF draw over the four biased direction probabilities.
            // A direction with probability 0 (|ex| or |ey| at 1) is never hit.
            let r: f32 = rng.random();
            if r < params.p_east {
                (1, 0)
            } else if r < params.p_east + params.p_west {
                (-1, 0)
            } else if r < params.p_east + params.p_west + params.p_north {
                (0, 1)
            } else {
                (0, -1)
            }
        }
        StepModel::Diagonal => (rng.random_range(-1..=1), rng.random_range(-1..=1)),
    }
}
