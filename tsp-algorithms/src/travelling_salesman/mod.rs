mod branch_and_bound;
pub use branch_and_bound::*;
mod config;
pub use config::*;
mod partitioned;
pub use partitioned::*;
mod sub_routes;
pub use sub_routes::*;

use anyhow::Result;
use serde_json::{Map, Value};
use tsp_challenges::travelling_salesman::*;

/// Solves `matrix` exactly. Hyperparameters are merged over `Config::default()`;
/// a `partition_depth` splits the search with the sub-route enumerator first.
pub fn solve_challenge(
    matrix: &DistanceMatrix,
    hyperparameters: &Option<Map<String, Value>>,
) -> Result<Option<Solution>> {
    solve_with_config(matrix, &Config::initialize(hyperparameters)?)
}

pub fn solve_with_config(matrix: &DistanceMatrix, config: &Config) -> Result<Option<Solution>> {
    match config.partition_depth {
        Some(depth) => solve_partitioned(matrix, depth, config),
        None => find_shortest_route_from(matrix, Route::initial(), u32::MAX, config),
    }
}

pub fn help() {
    println!("Branch and bound: exact shortest tour from node 0");
    println!("");
    println!("HYPERPARAMETERS:");
    println!("");
    println!("closing_edge       \"return_to_start\" (default) adds distance(last, 0) to finish a tour");
    println!("                   \"diagonal\" adds distance(0, 0) instead");
    println!("partition_depth    split the search into every sub-route of this many nodes");
    println!("                   and solve them one after another (default: null)");
    println!("");
    println!("EXAMPLE:");
    println!("");
    println!("{{\"closing_edge\": \"diagonal\", \"partition_depth\": 3}}");
}
