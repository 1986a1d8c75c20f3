mod matrix;
pub use matrix::*;
mod route;
pub use route::*;

use anyhow::Result;

/// Seed every generated instance uses unless the caller picks another one.
pub const DEFAULT_SEED: u64 = 2;
pub const MIN_WEIGHT: u32 = 1;
pub const MAX_WEIGHT: u32 = 5;

pub fn generate_distance_matrix(num_vertices: usize) -> Result<DistanceMatrix> {
    DistanceMatrix::generate(num_vertices)
}
