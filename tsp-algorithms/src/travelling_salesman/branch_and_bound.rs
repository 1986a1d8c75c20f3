use super::Config;
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tsp_challenges::travelling_salesman::*;

/// Counters of one search. They only observe the search; the route found is
/// the same with or without them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    pub routes_extended: u64,
    pub branches_pruned: u64,
    pub tours_completed: u64,
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, other: Self) {
        self.routes_extended += other.routes_extended;
        self.branches_pruned += other.branches_pruned;
        self.tours_completed += other.tours_completed;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub route: Route,
    pub stats: SearchStats,
}

pub fn find_shortest_route(matrix: &DistanceMatrix) -> Result<Option<Solution>> {
    find_shortest_route_from(matrix, Route::initial(), u32::MAX, &Config::default())
}

/// Shortest closed tour that begins with `start`. `bound` prunes partial
/// routes only: an extension whose distance reaches it is dropped, but the
/// closing edge is added after that check, so a returned tour may exceed
/// `bound`. `None` when every extension was pruned. Pass `u32::MAX` when no
/// tour is known yet.
pub fn find_shortest_route_from(
    matrix: &DistanceMatrix,
    start: Route,
    bound: u32,
    config: &Config,
) -> Result<Option<Solution>> {
    matrix.validate_route(&start)?;
    let search = Search::new(matrix, config.closing_edge);
    let mut stats = SearchStats::default();
    let route = search.descend(start, bound, &mut stats);
    debug!(
        "branch and bound on {} nodes: best distance {:?}, {:?}",
        matrix.num_vertices(),
        route.as_ref().map(|r| r.distance),
        stats
    );
    Ok(route.map(|route| Solution { route, stats }))
}

pub(super) struct Search<'a> {
    matrix: &'a DistanceMatrix,
    closing_edge: ClosingEdge,
    num_vertices: usize,
}

impl<'a> Search<'a> {
    pub(super) fn new(matrix: &'a DistanceMatrix, closing_edge: ClosingEdge) -> Self {
        Self {
            matrix,
            closing_edge,
            num_vertices: matrix.num_vertices(),
        }
    }

    /// Depth-first over the unvisited nodes. `bound` is the best complete
    /// distance known above this call; siblings tighten it as they finish.
    /// Edge weights are non-negative, so a partial route that already reaches
    /// the bound can never close into a strictly shorter tour.
    pub(super) fn descend(&self, route: Route, bound: u32, stats: &mut SearchStats) -> Option<Route> {
        if route.len() == self.num_vertices {
            stats.tours_completed += 1;
            let closing = self.matrix.closing_distance(route.last(), self.closing_edge);
            return Some(route.close(closing));
        }

        let from = route.last();
        let mut shortest: Option<Route> = None;
        for vertex in route.unvisited(self.num_vertices) {
            let candidate = route.extend(vertex, self.matrix.distance(from, vertex));
            stats.routes_extended += 1;

            let bound = match &shortest {
                Some(best) => best.distance.min(bound),
                None => bound,
            };
            if candidate.distance >= bound {
                stats.branches_pruned += 1;
                continue;
            }

            if let Some(tour) = self.descend(candidate, bound, stats) {
                if shortest.as_ref().map_or(true, |best| tour.distance < best.distance) {
                    shortest = Some(tour);
                }
            }
        }
        shortest
    }
}
