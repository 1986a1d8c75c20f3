use super::{NodeId, Route, DEFAULT_SEED, MAX_WEIGHT, MIN_WEIGHT};
use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which edge finishes a tour once every node has been visited.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClosingEdge {
    /// `distance(last, 0)`, the edge actually walked back to the start.
    #[default]
    ReturnToStart,
    /// `distance(0, 0)`. Kept so results can be compared against fixtures
    /// produced with the diagonal entry as the closing edge.
    Diagonal,
}

impl std::str::FromStr for ClosingEdge {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "return_to_start" => Ok(Self::ReturnToStart),
            "diagonal" => Ok(Self::Diagonal),
            _ => Err(anyhow!(
                "Unknown closing edge '{}' (expected 'return_to_start' or 'diagonal')",
                s
            )),
        }
    }
}

/// A tour walks `num_vertices` edges including the closing one, so bounding
/// that sum keeps every route and tour distance within `u32`.
fn check_tour_fits(num_vertices: usize, max_weight: u32) -> Result<()> {
    let longest_tour = num_vertices as u64 * max_weight as u64;
    if longest_tour > u32::MAX as u64 {
        return Err(anyhow!(
            "Distance matrix too heavy: {} nodes with weights up to {} can exceed {}",
            num_vertices,
            max_weight,
            u32::MAX
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
struct DistanceMatrixData {
    seed: Option<u64>,
    distances: Vec<Vec<u32>>,
}

/// Square table of directed edge weights. `distances[from][to]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "DistanceMatrixData")]
pub struct DistanceMatrix {
    pub seed: Option<u64>,
    pub distances: Vec<Vec<u32>>,
}

impl TryFrom<DistanceMatrixData> for DistanceMatrix {
    type Error = anyhow::Error;

    fn try_from(data: DistanceMatrixData) -> Result<Self> {
        let mut matrix = Self::from_rows(data.distances)?;
        matrix.seed = data.seed;
        Ok(matrix)
    }
}

impl DistanceMatrix {
    pub fn generate(num_vertices: usize) -> Result<Self> {
        Self::generate_with_seed(num_vertices, DEFAULT_SEED)
    }

    /// Every cell, diagonal included, is drawn uniformly from
    /// `MIN_WEIGHT..=MAX_WEIGHT` in row-major order. The generator is local to
    /// the call, so equal arguments always give an equal matrix.
    pub fn generate_with_seed(num_vertices: usize, seed: u64) -> Result<Self> {
        if num_vertices < 1 {
            return Err(anyhow!("Number of vertices must be at least 1"));
        }
        check_tour_fits(num_vertices, MAX_WEIGHT)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let distances = (0..num_vertices)
            .map(|_| {
                (0..num_vertices)
                    .map(|_| rng.gen_range(MIN_WEIGHT..=MAX_WEIGHT))
                    .collect()
            })
            .collect();
        Ok(Self {
            seed: Some(seed),
            distances,
        })
    }

    pub fn from_rows(distances: Vec<Vec<u32>>) -> Result<Self> {
        if distances.is_empty() {
            return Err(anyhow!("Distance matrix must have at least 1 row"));
        }
        let num_vertices = distances.len();
        if let Some((i, row)) = distances
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != num_vertices)
        {
            return Err(anyhow!(
                "Distance matrix is not square: row {} has {} entries, expected {}",
                i,
                row.len(),
                num_vertices
            ));
        }
        let max_weight = distances.iter().flatten().cloned().max().unwrap_or(0);
        check_tour_fits(num_vertices, max_weight)?;
        Ok(Self {
            seed: None,
            distances,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.distances.len()
    }

    #[inline]
    pub fn distance(&self, from: NodeId, to: NodeId) -> u32 {
        self.distances[from][to]
    }

    /// Weight of the edge that closes a tour ending at `last`.
    #[inline]
    pub fn closing_distance(&self, last: NodeId, closing_edge: ClosingEdge) -> u32 {
        match closing_edge {
            ClosingEdge::ReturnToStart => self.distance(last, 0),
            ClosingEdge::Diagonal => self.distance(0, 0),
        }
    }

    /// Checks a caller supplied starting route: it must start at node 0, only
    /// name nodes of this matrix, never repeat one, and carry the distance of
    /// its own edges.
    pub fn validate_route(&self, route: &Route) -> Result<()> {
        self.validate_path(&route.path)?;
        let expected = self.path_distance(&route.path);
        if route.distance != expected {
            return Err(anyhow!(
                "Route distance ({}) does not match the sum of its edges ({})",
                route.distance,
                expected
            ));
        }
        Ok(())
    }

    /// Distance of the closed tour `path`. The path must visit every node
    /// exactly once, starting at node 0.
    pub fn calc_total_distance(&self, path: &[NodeId], closing_edge: ClosingEdge) -> Result<u32> {
        if path.len() != self.num_vertices() {
            return Err(anyhow!(
                "Route length ({}) does not match number of nodes ({})",
                path.len(),
                self.num_vertices()
            ));
        }
        self.validate_path(path)?;
        Ok(self.path_distance(path) + self.closing_distance(path[path.len() - 1], closing_edge))
    }

    pub fn verify_route(&self, route: &Route, closing_edge: ClosingEdge) -> Result<()> {
        let total_distance = self.calc_total_distance(&route.path, closing_edge)?;
        if total_distance != route.distance {
            return Err(anyhow!(
                "Route claims distance {} but its tour measures {}",
                route.distance,
                total_distance
            ));
        }
        Ok(())
    }

    fn validate_path(&self, path: &[NodeId]) -> Result<()> {
        if path.first() != Some(&0) {
            return Err(anyhow!("Route must start at node 0"));
        }
        if let Some(node) = path.iter().find(|&&node| node >= self.num_vertices()) {
            return Err(anyhow!(
                "Route contains invalid node {} (matrix has {} nodes)",
                node,
                self.num_vertices()
            ));
        }
        let visited = path.iter().cloned().collect::<HashSet<NodeId>>();
        if visited.len() != path.len() {
            return Err(anyhow!("Route contains duplicate nodes"));
        }
        Ok(())
    }

    fn path_distance(&self, path: &[NodeId]) -> u32 {
        path.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }
}
