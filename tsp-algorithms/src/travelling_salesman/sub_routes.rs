use anyhow::{anyhow, Result};
use tsp_challenges::travelling_salesman::*;

pub fn enumerate_sub_routes(matrix: &DistanceMatrix, depth: usize) -> Result<Vec<Route>> {
    enumerate_sub_routes_from(matrix, depth, Route::initial())
}

/// Every simple route of exactly `depth` nodes that begins with `start`.
/// No pruning: all `(n - s)! / (n - depth)!` continuations are listed, where
/// `s` is the length of `start`.
pub fn enumerate_sub_routes_from(
    matrix: &DistanceMatrix,
    depth: usize,
    start: Route,
) -> Result<Vec<Route>> {
    let num_vertices = matrix.num_vertices();
    if depth < 1 || depth > num_vertices {
        return Err(anyhow!(
            "Depth ({}) must be between 1 and the number of nodes ({})",
            depth,
            num_vertices
        ));
    }
    matrix.validate_route(&start)?;
    if depth < start.len() {
        return Err(anyhow!(
            "Depth ({}) is shorter than the starting route ({} nodes)",
            depth,
            start.len()
        ));
    }

    let mut sub_routes = Vec::new();
    expand(matrix, depth, start, &mut sub_routes);
    Ok(sub_routes)
}

fn expand(matrix: &DistanceMatrix, depth: usize, route: Route, sub_routes: &mut Vec<Route>) {
    if route.len() == depth {
        sub_routes.push(route);
        return;
    }
    let from = route.last();
    for vertex in route.unvisited(matrix.num_vertices()) {
        let next = route.extend(vertex, matrix.distance(from, vertex));
        expand(matrix, depth, next, sub_routes);
    }
}

/// Closes every full-length route and keeps the shortest. Exponential, meant
/// as a reference to check the branch and bound search against.
pub fn shortest_by_enumeration(
    matrix: &DistanceMatrix,
    closing_edge: ClosingEdge,
) -> Result<Option<Route>> {
    Ok(enumerate_sub_routes(matrix, matrix.num_vertices())?
        .into_iter()
        .map(|route| {
            let closing = matrix.closing_distance(route.last(), closing_edge);
            route.close(closing)
        })
        .min_by_key(|route| route.distance))
}
