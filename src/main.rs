//! Orient Search CLI - Run an orientation search from JSON configuration.

use std::path::PathBuf;

use orient_search::{
    compute::{SupportVolumeEvaluator, TriangleMesh, run_blocking},
    schema::{SearchAlgorithm, SearchConfig, StrategyKind},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [strategy]", args[0]);
        eprintln!();
        eprintln!("Search for the build orientation with the least support volume.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to search configuration file");
        eprintln!(
            "  strategy     Run this strategy with default parameters instead ({})",
            StrategyKind::ALL
                .iter()
                .map(|k| k.id())
                .collect::<Vec<_>>()
                .join(", ")
        );
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let mut config = SearchConfig::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    if let Some(id) = args.get(2) {
        let kind: StrategyKind = id.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        config.algorithm = SearchAlgorithm::from_kind(kind);
    }

    if let SearchAlgorithm::Probe(probe) = &config.algorithm
        && probe.max_requests.is_none()
    {
        eprintln!("Error: probe needs max_requests when run from the command line");
        std::process::exit(1);
    }

    let mesh = TriangleMesh::from_spec(&config.mesh).unwrap_or_else(|e| {
        eprintln!("Error building mesh: {}", e);
        std::process::exit(1);
    });

    println!("Orient Search");
    println!("=============");
    println!("Strategy: {}", config.algorithm.kind());
    println!(
        "Mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    println!();

    println!("Running search...");
    let outcome = run_blocking(&config.algorithm, SupportVolumeEvaluator::new(mesh));

    println!();
    match &outcome.best {
        Some(best) => {
            let up = best.orientation.position();
            println!("Best orientation:");
            println!("  Support volume: {:.6}", best.volume);
            println!("  Up direction: ({:.4}, {:.4}, {:.4})", up.x, up.y, up.z);
        }
        None => println!("Search was cancelled before publishing a result."),
    }
    println!(
        "Evaluations: {} ({} repositions)",
        outcome.evaluations, outcome.repositions
    );
    println!(
        "Time: {:.2}s ({:.1} evaluations/s)",
        outcome.elapsed_seconds,
        outcome.evaluations as f64 / outcome.elapsed_seconds.max(f64::EPSILON)
    );
    println!();

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing outcome: {}", e),
    }
}

fn print_example_config() {
    let config = SearchConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
