use crate::sim_params::SimParams;
use crate::vecmath::Vec2;

/// Square boolean occupancy grid plus the running cluster-radius bound.
///
/// The center cell is occupied from construction (the seed) and occupancy is
/// monotonic: once a cell is occupied it stays occupied for the lifetime of
/// the lattice. All growth is routed through [`AggregationLattice::occupy`],
/// which also maintains the radius bound used to place new spawns.
#[derive(Debug)]
pub struct AggregationLattice {
    size: i32,
    center: i32,
    margin_lo: i32,
    margin_hi: i32,
    cells: Vec<bool>,
    occupied_count: u32,
    cluster_radius: f32,
}

impl AggregationLattice {
    /// Creates a lattice of `params.grid_size` per side with the seed at center.
    pub fn new(params: &SimParams) -> Self {
        let size = params.grid_size;
        let center = params.center;
        let mut lattice = Self {
            size,
            center,
            margin_lo: params.margin_lo,
            margin_hi: params.margin_hi,
            cells: vec![false; (size * size) as usize],
            occupied_count: 0,
            cluster_radius: 0.0,
        };
        lattice.occupy(center, center);
        lattice
    }

    #[inline(always)]
    fn idx(&self, x: i32, y: i32) -> usize {
        debug_assert!(x >= 0 && x < self.size && y >= 0 && y < self.size);
        (y * self.size + x) as usize
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn center(&self) -> i32 {
        self.center
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.cells[self.idx(x, y)]
    }

    /// Marks a cell occupied and raises the radius bound if the new cell is
    /// the farthest from center so far. Re-occupying a cell is a no-op.
    pub fn occupy(&mut self, x: i32, y: i32) {
        let idx = self.idx(x, y);
        if !self.cells[idx] {
            self.cells[idx] = true;
            self.occupied_count += 1;
            let dist = self.distance_from_center(x, y);
            self.cluster_radius = self.cluster_radius.max(dist);
        }
    }

    /// Whether any of the four axis-aligned neighbors is occupied.
    ///
    /// Callers must stay inside the respawn margin so that all four neighbor
    /// coordinates are valid lattice cells.
    pub fn has_adjacent_occupied(&self, x: i32, y: i32) -> bool {
        self.is_occupied(x + 1, y)
            || self.is_occupied(x - 1, y)
            || self.is_occupied(x, y + 1)
            || self.is_occupied(x, y - 1)
    }

    /// Whether a position has left the valid interior region: within 2 cells
    /// of the grid edge, or outside the grid entirely.
    pub fn in_reset_margin(&self, x: i32, y: i32) -> bool {
        x <= self.margin_lo || x >= self.margin_hi || y <= self.margin_lo || y >= self.margin_hi
    }

    pub fn distance_from_center(&self, x: i32, y: i32) -> f32 {
        Vec2::new((x - self.center) as f32, (y - self.center) as f32).length()
    }

    pub fn cluster_radius(&self) -> f32 {
        self.cluster_radius
    }

    pub fn occupied_count(&self) -> u32 {
        self.occupied_count
    }

    /// Row-major occupancy, `size * size` cells, for external renderers.
    pub fn occupancy(&self) -> &[bool] {
        &self.cells
    }

    /// Coordinates of all occupied cells, row-major order.
    pub fn occupied_cells(&self) -> Vec<(i32, i32)> {
        let mut cells = Vec::with_capacity(self.occupied_count as usize);
        for y in 0..self.size {
            for x in 0..self.size {
                if self.cells[(y * self.size + x) as usize] {
                    cells.push((x, y));
                }
            }
        }
        cells
    }

    /// Recomputes the maximum distance from center over occupied cells.
    /// The cached bound must always equal this value.
    pub fn max_occupied_distance(&self) -> f32 {
        self.occupied_cells()
            .iter()
            .map(|&(x, y)| self.distance_from_center(x, y))
            .fold(0.0, f32::max)
    }
}
