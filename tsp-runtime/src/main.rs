use anyhow::{anyhow, Result};
use clap::{arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{fs, io::Read, path::PathBuf, time::Instant};
use tsp_algorithms::travelling_salesman::{self as algorithm, Config, SearchStats};
use tsp_challenges::travelling_salesman::*;

#[derive(Serialize)]
struct OutputData {
    num_vertices: usize,
    seed: Option<u64>,
    config: Config,
    route: Option<Route>,
    stats: Option<SearchStats>,
    elapsed_ms: u64,
}

#[derive(Serialize)]
struct SubRoutesData {
    num_vertices: usize,
    depth: usize,
    count: usize,
    routes: Vec<Route>,
}

fn instance_args(command: Command) -> Command {
    command
        .arg(
            arg!(--nodes [NUM_VERTICES] "Number of nodes of a generated instance")
                .value_parser(clap::value_parser!(usize))
                .conflicts_with("matrix")
                .required_unless_present("matrix"),
        )
        .arg(
            arg!(--seed [SEED] "Seed of a generated instance (default 2)")
                .value_parser(clap::value_parser!(u64))
                .conflicts_with("matrix"),
        )
        .arg(
            arg!(--matrix [MATRIX] "Distance matrix json string or path to json file")
                .value_parser(clap::value_parser!(String)),
        )
}

fn hyperparameters_arg() -> clap::Arg {
    arg!(--hyperparameters [HYPERPARAMETERS] "Hyperparameters json string or path to json file")
        .value_parser(clap::value_parser!(String))
}

fn output_arg() -> clap::Arg {
    arg!(--output [OUTPUT_FILE] "If set, the output json is saved to this file path")
        .value_parser(clap::value_parser!(PathBuf))
}

fn cli() -> Command {
    Command::new("tsp-runtime")
        .about("Generates travelling salesman instances and solves them exactly")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("generate_matrix")
                .about("Generates a distance matrix")
                .arg(
                    arg!(<NUM_VERTICES> "Number of nodes")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--seed [SEED] "Seed of the generator (default 2)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(output_arg()),
        )
        .subcommand(instance_args(
            Command::new("enumerate_sub_routes")
                .about("Lists every route from node 0 with the given number of nodes")
                .arg(arg!(<DEPTH> "Number of nodes per route").value_parser(clap::value_parser!(usize)))
                .arg(output_arg()),
        ))
        .subcommand(instance_args(
            Command::new("compute_solution")
                .about("Computes the shortest tour with branch and bound")
                .arg(hyperparameters_arg())
                .arg(output_arg()),
        ))
        .subcommand(instance_args(
            Command::new("verify_solution")
                .about("Verifies that a tour is valid and shortest")
                .arg(
                    arg!(<SOLUTION> "Route json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(hyperparameters_arg())
                .arg(
                    arg!(--exhaustive "Compare against every tour instead of branch and bound")
                        .action(ArgAction::SetTrue),
                ),
        ))
        .subcommand(Command::new("hyperparameters").about("Describes the solver hyperparameters"))
}

fn main() {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("generate_matrix", sub_m)) => generate_matrix(
            *sub_m.get_one::<usize>("NUM_VERTICES").unwrap(),
            sub_m.get_one::<u64>("seed").cloned().unwrap_or(DEFAULT_SEED),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        Some(("enumerate_sub_routes", sub_m)) => load_instance(sub_m).and_then(|matrix| {
            enumerate_sub_routes(
                &matrix,
                *sub_m.get_one::<usize>("DEPTH").unwrap(),
                sub_m.get_one::<PathBuf>("output").cloned(),
            )
        }),
        Some(("compute_solution", sub_m)) => load_instance(sub_m).and_then(|matrix| {
            compute_solution(
                &matrix,
                load_hyperparameters(sub_m)?,
                sub_m.get_one::<PathBuf>("output").cloned(),
            )
        }),
        Some(("verify_solution", sub_m)) => load_instance(sub_m).and_then(|matrix| {
            verify_solution(
                &matrix,
                load_json::<Route>(sub_m.get_one::<String>("SOLUTION").unwrap(), "solution")?,
                load_hyperparameters(sub_m)?,
                sub_m.get_flag("exhaustive"),
            )
        }),
        Some(("hyperparameters", _)) => {
            algorithm::help();
            Ok(())
        }
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

pub fn generate_matrix(num_vertices: usize, seed: u64, output_file: Option<PathBuf>) -> Result<()> {
    let matrix = DistanceMatrix::generate_with_seed(num_vertices, seed)?;
    info!("generated {}x{} matrix with seed {}", num_vertices, num_vertices, seed);
    write_output(&matrix, output_file)
}

pub fn enumerate_sub_routes(
    matrix: &DistanceMatrix,
    depth: usize,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let routes = algorithm::enumerate_sub_routes(matrix, depth)?;
    info!("enumerated {} sub routes of depth {}", routes.len(), depth);
    write_output(
        &SubRoutesData {
            num_vertices: matrix.num_vertices(),
            depth,
            count: routes.len(),
            routes,
        },
        output_file,
    )
}

pub fn compute_solution(
    matrix: &DistanceMatrix,
    hyperparameters: Option<Map<String, Value>>,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let config = Config::initialize(&hyperparameters)?;
    debug!("solving {} nodes with {:?}", matrix.num_vertices(), config);

    let start = Instant::now();
    let solution = algorithm::solve_with_config(matrix, &config)?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match &solution {
        Some(solution) => info!(
            "shortest tour {:?} with distance {} found in {}ms",
            solution.route.path, solution.route.distance, elapsed_ms
        ),
        None => info!("no tour found in {}ms", elapsed_ms),
    }

    let (route, stats) = match solution {
        Some(solution) => (Some(solution.route), Some(solution.stats)),
        None => (None, None),
    };
    write_output(
        &OutputData {
            num_vertices: matrix.num_vertices(),
            seed: matrix.seed,
            config,
            route,
            stats,
            elapsed_ms,
        },
        output_file,
    )
}

pub fn verify_solution(
    matrix: &DistanceMatrix,
    route: Route,
    hyperparameters: Option<Map<String, Value>>,
    exhaustive: bool,
) -> Result<()> {
    let config = Config::initialize(&hyperparameters)?;
    matrix
        .verify_route(&route, config.closing_edge)
        .map_err(|e| anyhow!("Invalid solution: {}", e))?;

    let shortest = if exhaustive {
        algorithm::shortest_by_enumeration(matrix, config.closing_edge)?
    } else {
        algorithm::solve_with_config(matrix, &config)?.map(|solution| solution.route)
    }
    .ok_or_else(|| anyhow!("No tour exists to compare against"))?;
    if route.distance > shortest.distance {
        return Err(anyhow!(
            "Invalid solution: distance ({}) is greater than the shortest tour ({})",
            route.distance,
            shortest.distance
        ));
    }
    println!("Solution is valid");
    Ok(())
}

fn load_instance(sub_m: &ArgMatches) -> Result<DistanceMatrix> {
    match sub_m.get_one::<String>("matrix") {
        Some(matrix) => load_json::<DistanceMatrix>(matrix, "matrix"),
        None => DistanceMatrix::generate_with_seed(
            *sub_m
                .get_one::<usize>("nodes")
                .ok_or_else(|| anyhow!("Either --nodes or --matrix is required"))?,
            sub_m.get_one::<u64>("seed").cloned().unwrap_or(DEFAULT_SEED),
        ),
    }
}

fn load_hyperparameters(sub_m: &ArgMatches) -> Result<Option<Map<String, Value>>> {
    sub_m
        .get_one::<String>("hyperparameters")
        .map(|h| load_json::<Map<String, Value>>(h, "hyperparameters"))
        .transpose()
}

fn load_json<T: DeserializeOwned>(input: &str, what: &str) -> Result<T> {
    let json = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow!("Failed to read {} from stdin: {}", what, e))?;
        buffer
    } else if input.ends_with(".json") {
        fs::read_to_string(input)
            .map_err(|e| anyhow!("Failed to read {} file {}: {}", what, input, e))?
    } else {
        input.to_string()
    };
    serde_json::from_str(&json).map_err(|e| anyhow!("Failed to parse {}: {}", what, e))
}

fn write_output<T: Serialize>(output: &T, output_file: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(output)?;
    match output_file {
        Some(path) => {
            fs::write(&path, json)
                .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
            info!("output saved to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_nodes_or_matrix() {
        assert!(cli()
            .try_get_matches_from(["tsp-runtime", "compute_solution"])
            .is_err());
        assert!(cli()
            .try_get_matches_from(["tsp-runtime", "compute_solution", "--nodes", "4"])
            .is_ok());
        assert!(cli()
            .try_get_matches_from([
                "tsp-runtime",
                "compute_solution",
                "--nodes",
                "4",
                "--matrix",
                "m.json"
            ])
            .is_err());
    }

    #[test]
    fn test_load_instance() {
        let matches = cli()
            .try_get_matches_from([
                "tsp-runtime",
                "enumerate_sub_routes",
                "2",
                "--matrix",
                r#"{"seed": null, "distances": [[1, 2], [3, 4]]}"#,
            ])
            .unwrap();
        let (_, sub_m) = matches.subcommand().unwrap();
        let matrix = load_instance(sub_m).unwrap();
        assert_eq!(matrix.num_vertices(), 2);

        let matches = cli()
            .try_get_matches_from(["tsp-runtime", "compute_solution", "--nodes", "5"])
            .unwrap();
        let (_, sub_m) = matches.subcommand().unwrap();
        assert_eq!(load_instance(sub_m).unwrap(), DistanceMatrix::generate(5).unwrap());
    }

    #[test]
    fn test_verify_solution() {
        let matrix = DistanceMatrix::generate(5).unwrap();
        let shortest = algorithm::solve_challenge(&matrix, &None).unwrap().unwrap();
        assert!(verify_solution(&matrix, shortest.route.clone(), None, false).is_ok());
        assert!(verify_solution(&matrix, shortest.route.clone(), None, true).is_ok());

        let mut wrong = shortest.route.clone();
        wrong.distance += 1;
        assert!(verify_solution(&matrix, wrong.clone(), None, false).is_err());
        assert!(verify_solution(&matrix, wrong, None, true).is_err());
    }

    #[test]
    fn test_verify_solution_exhaustive_flag() {
        let matches = cli()
            .try_get_matches_from([
                "tsp-runtime",
                "verify_solution",
                r#"{"path": [0], "distance": 1}"#,
                "--nodes",
                "1",
                "--exhaustive",
            ])
            .unwrap();
        let (_, sub_m) = matches.subcommand().unwrap();
        assert!(sub_m.get_flag("exhaustive"));

        let matches = cli()
            .try_get_matches_from(["tsp-runtime", "verify_solution", "-", "--nodes", "1"])
            .unwrap();
        let (_, sub_m) = matches.subcommand().unwrap();
        assert!(!sub_m.get_flag("exhaustive"));
    }

    fn read_output(path: &std::path::Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_generate_matrix_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.json");
        generate_matrix(4, DEFAULT_SEED, Some(path.clone())).unwrap();

        let output = read_output(&path);
        assert_eq!(output["seed"], 2);
        assert_eq!(
            output["distances"],
            serde_json::json!([[1, 2, 5, 1], [2, 3, 3, 4], [2, 3, 2, 3], [2, 4, 4, 2]])
        );
        let matrix: DistanceMatrix = serde_json::from_value(output).unwrap();
        assert_eq!(matrix, DistanceMatrix::generate(4).unwrap());

        assert!(generate_matrix(0, DEFAULT_SEED, Some(path)).is_err());
    }

    #[test]
    fn test_enumerate_sub_routes_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let matrix = DistanceMatrix::generate(4).unwrap();
        enumerate_sub_routes(&matrix, 3, Some(path.clone())).unwrap();

        let output = read_output(&path);
        assert_eq!(output["num_vertices"], 4);
        assert_eq!(output["depth"], 3);
        assert_eq!(output["count"], 6);
        let routes: Vec<Route> = serde_json::from_value(output["routes"].clone()).unwrap();
        assert_eq!(routes.len(), 6);
        assert!(routes.iter().all(|r| r.len() == 3 && r.path[0] == 0));

        assert!(enumerate_sub_routes(&matrix, 5, Some(path)).is_err());
    }

    #[test]
    fn test_compute_solution_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.json");
        let matrix = DistanceMatrix::generate(4).unwrap();
        compute_solution(&matrix, None, Some(path.clone())).unwrap();

        let output = read_output(&path);
        assert_eq!(output["num_vertices"], 4);
        assert_eq!(output["seed"], 2);
        assert_eq!(output["config"]["closing_edge"], "return_to_start");
        let route: Route = serde_json::from_value(output["route"].clone()).unwrap();
        assert_eq!(route.distance, 10);
        assert!(verify_solution(&matrix, route, None, true).is_ok());

        let hyperparameters = serde_json::json!({"closing_edge": "diagonal", "partition_depth": 2})
            .as_object()
            .cloned();
        compute_solution(&matrix, hyperparameters, Some(path.clone())).unwrap();
        let output = read_output(&path);
        assert_eq!(output["config"]["partition_depth"], 2);
        assert_eq!(output["route"]["distance"], 9);
    }

    #[test]
    fn test_load_hyperparameters() {
        let matches = cli()
            .try_get_matches_from([
                "tsp-runtime",
                "compute_solution",
                "--nodes",
                "3",
                "--hyperparameters",
                r#"{"closing_edge": "diagonal"}"#,
            ])
            .unwrap();
        let (_, sub_m) = matches.subcommand().unwrap();
        let hyperparameters = load_hyperparameters(sub_m).unwrap();
        assert_eq!(
            Config::initialize(&hyperparameters).unwrap().closing_edge,
            ClosingEdge::Diagonal
        );
    }
}
