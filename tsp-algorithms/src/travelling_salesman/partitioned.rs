use super::branch_and_bound::Search;
use super::{enumerate_sub_routes, Config, SearchStats, Solution};
use anyhow::Result;
use log::{debug, trace};
use tsp_challenges::travelling_salesman::*;

/// Splits the search tree into every sub-route of `depth` nodes and runs the
/// branch and bound search on them in turn. The best distance so far is the
/// bound of the next partition, so the result matches an unsplit search.
pub fn solve_partitioned(
    matrix: &DistanceMatrix,
    depth: usize,
    config: &Config,
) -> Result<Option<Solution>> {
    let partitions = enumerate_sub_routes(matrix, depth)?;
    debug!(
        "solving {} partitions of depth {} on {} nodes",
        partitions.len(),
        depth,
        matrix.num_vertices()
    );

    let search = Search::new(matrix, config.closing_edge);
    let mut stats = SearchStats::default();
    let mut shortest: Option<Route> = None;
    for (i, partition) in partitions.into_iter().enumerate() {
        let bound = shortest.as_ref().map_or(u32::MAX, |best| best.distance);
        if partition.distance >= bound {
            stats.branches_pruned += 1;
            continue;
        }
        let mut partition_stats = SearchStats::default();
        let tour = search.descend(partition, bound, &mut partition_stats);
        trace!(
            "partition {}: {:?} {:?}",
            i,
            tour.as_ref().map(|t| t.distance),
            partition_stats
        );
        stats += partition_stats;
        if let Some(tour) = tour {
            if shortest.as_ref().map_or(true, |best| tour.distance < best.distance) {
                shortest = Some(tour);
            }
        }
    }
    Ok(shortest.map(|route| Solution { route, stats }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travelling_salesman::find_shortest_route_from;

    #[test]
    fn test_every_depth_agrees_with_plain_search() {
        let matrix = DistanceMatrix::generate(6).unwrap();
        for closing_edge in [ClosingEdge::ReturnToStart, ClosingEdge::Diagonal] {
            let config = Config {
                closing_edge,
                partition_depth: None,
            };
            let expected = find_shortest_route_from(&matrix, Route::initial(), u32::MAX, &config)
                .unwrap()
                .unwrap();
            for depth in 1..=6 {
                let solution = solve_partitioned(&matrix, depth, &config).unwrap().unwrap();
                assert_eq!(solution.route.distance, expected.route.distance);
            }
        }
    }

    #[test]
    fn test_invalid_depth() {
        let matrix = DistanceMatrix::generate(4).unwrap();
        assert!(solve_partitioned(&matrix, 0, &Config::default()).is_err());
        assert!(solve_partitioned(&matrix, 5, &Config::default()).is_err());
    }
}
