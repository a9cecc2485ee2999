use roadcover::config::Config;
use roadcover::constants::DEFAULT_EXPERIMENT_ROUTES;
use roadcover::evaluation::{format_report, run_scenario, CoverageScenario};
use roadcover::models::{NodeId, RoadGraph, RouteRequest, SearchStrategy};
use roadcover::services::session::CoverageSession;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        "\
Usage: coverage --start=ID --distance=M [OPTIONS]

Options:
  --graph=PATH          Road graph JSON document (default: $ROADCOVER_GRAPH)
  --start=ID            Start node
  --end=ID              End node (omit for a free-ending route)
  --waypoints=A,B,..    Intermediate nodes, visited in order
  --distance=M          Target route length in meters
  --tolerance=F         Fractional tolerance (default: per strategy)
  --strategy=NAME       dfs, astar, random or all (default: all)
  --routes=N            Routes generated per strategy (default: 10)
  --prefer-new          Rank less-visited roads first
  --seed=N              Fix the RNG seed for reproducible runs
  --tracks=PATH         JSON array of node sequences to pre-seed the ledger
  --json                Output results as JSON
  --help                Show this help message"
    );
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter().find_map(|a| a.strip_prefix(name))
}

fn parse_flag<T: std::str::FromStr>(
    args: &[String],
    name: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match flag(args, name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| format!("Invalid value for {}{}", name, value).into()),
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadcover=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let config = Config::from_env()?;

    let graph_path = flag(&args, "--graph=")
        .map(PathBuf::from)
        .or(config.graph_path.clone())
        .ok_or("No graph given: pass --graph=PATH or set ROADCOVER_GRAPH")?;
    let start: NodeId = parse_flag(&args, "--start=")?.ok_or("--start=ID is required")?;
    let distance: f64 = parse_flag(&args, "--distance=")?.ok_or("--distance=M is required")?;
    let end: Option<NodeId> = parse_flag(&args, "--end=")?;
    let tolerance: Option<f64> = parse_flag(&args, "--tolerance=")?;
    let routes: usize = parse_flag(&args, "--routes=")?.unwrap_or(DEFAULT_EXPERIMENT_ROUTES);
    let seed: Option<u64> = parse_flag(&args, "--seed=")?;
    let prefer_new = args.iter().any(|a| a == "--prefer-new");
    let json_output = args.iter().any(|a| a == "--json");

    let waypoints: Vec<NodeId> = match flag(&args, "--waypoints=") {
        Some(list) => list
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.trim().parse::<NodeId>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("Invalid waypoint list: {}", list))?,
        None => Vec::new(),
    };

    let strategies: Vec<SearchStrategy> = match flag(&args, "--strategy=") {
        None | Some("all") => SearchStrategy::ALL.to_vec(),
        Some(name) => vec![name.parse()?],
    };

    let graph = Arc::new(RoadGraph::from_json_file(&graph_path)?);
    eprintln!(
        "Loaded {} nodes, {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        graph_path.display()
    );

    if let Some(missing) = std::iter::once(start)
        .chain(waypoints.iter().copied())
        .chain(end)
        .find(|&node| !graph.contains_node(node))
    {
        return Err(format!("Node {} is not in the graph", missing).into());
    }

    let tracks: Vec<Vec<NodeId>> = match flag(&args, "--tracks=") {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let mut request = RouteRequest::new(start, distance)
        .with_waypoints(waypoints)
        .with_prefer_new(prefer_new);
    if let Some(end) = end {
        request = request.with_end(end);
    }
    if let Some(tolerance) = tolerance {
        request = request.with_tolerance(tolerance);
    }
    if let Some(seed) = seed {
        request = request.with_seed(seed);
    }

    // Each strategy starts from the same seeded ledger
    let mut results = Vec::new();
    for strategy in strategies {
        let session = CoverageSession::new(Arc::clone(&graph), config.route_generator.clone());
        let seeded: usize = tracks
            .iter()
            .map(|track| session.seed_track(track))
            .sum::<roadcover::Result<usize>>()?;
        if seeded > 0 {
            eprintln!(
                "Seeded {} visited edges from {} tracks",
                seeded,
                tracks.len()
            );
        }

        eprintln!("Running {} x {} routes...", strategy, routes);
        let scenario = CoverageScenario::new(
            format!("{} from {}", strategy, start),
            strategy,
            request.clone(),
            routes,
        );
        results.push(run_scenario(&session, &scenario)?);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("{}", format_report(&results));
    }

    Ok(())
}
