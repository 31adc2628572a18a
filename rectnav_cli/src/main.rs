// CLI entry point for the rectangle navigation mesh.
//
// Builds a mesh from a config (defaults, or a JSON file), scatters seeded
// obstacles, picks search endpoints, runs A* and prints a summary. The mesh
// itself lives in `rectnav_mesh`; this binary only wires it together. Set
// `RUST_LOG=debug` to see per-insertion and per-search logging.
//
// Usage:
//   rectnav [OPTIONS]
//     --config <PATH>        JSON mesh config (default: built-in defaults)
//     --seed <N>             Scatter/endpoint seed (default: 0)
//     --obstacles <N>        Obstacles to scatter (default: from config)
//     --random-endpoints     Pick random start/goal instead of first/last node
//     --from <X,Y>           Start point (overrides endpoint picking)
//     --to <X,Y>             Goal point (overrides endpoint picking)
//     --snapshot             Print the mesh snapshot as JSON instead of a summary
//     --audit                Check mesh invariants and exit non-zero on failure
//     --print-config         Print the effective config (file plus overrides) and exit

use log::{error, info};
use rectnav_mesh::config::MeshConfig;
use rectnav_mesh::error::MeshError;
use rectnav_mesh::mesh::NavMesh;
use rectnav_mesh::prng::MeshRng;
use rectnav_mesh::scatter::scatter_obstacles;

#[derive(Debug, Default)]
struct Options {
    config_path: Option<String>,
    seed: u64,
    obstacles: Option<u32>,
    random_endpoints: bool,
    from: Option<(f64, f64)>,
    to: Option<(f64, f64)>,
    snapshot: bool,
    audit: bool,
    print_config: bool,
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args);
    let config = effective_config(&options);

    if options.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut mesh = match NavMesh::new(config) {
        Ok(mesh) => mesh,
        Err(e) => {
            eprintln!("Failed to build mesh: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "grid ready: {} nodes over {:?}",
        mesh.node_count(),
        mesh.bounds()
    );

    let mut rng = MeshRng::new(options.seed);
    match scatter_obstacles(&mut mesh, &mut rng) {
        Ok(report) => info!(
            "placed {} obstacles in {} draws",
            report.placed.len(),
            report.attempts
        ),
        // A partial layout is still searchable.
        Err(e @ MeshError::ScatterExhausted { .. }) => error!("{e}"),
        Err(e) => {
            eprintln!("Failed to scatter obstacles: {e}");
            std::process::exit(1);
        }
    }

    let path = match (options.from, options.to) {
        (Some(from), Some(to)) => mesh.find_path_between_points(from, to).map(Some),
        (None, None) => {
            let picker = options.random_endpoints.then_some(&mut rng);
            match mesh.pick_endpoints(picker) {
                Some((start, goal)) => mesh
                    .mark_endpoints(start, goal)
                    .and_then(|()| mesh.find_path(start, goal))
                    .map(Some),
                None => Ok(None),
            }
        }
        _ => {
            eprintln!("--from and --to must be given together");
            std::process::exit(1);
        }
    };
    let path = match path {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Search failed: {e}");
            std::process::exit(1);
        }
    };

    if options.snapshot {
        match mesh.snapshot().to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize snapshot: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!(
            "mesh: {} nodes, {} obstacles",
            mesh.node_count(),
            mesh.obstacles().len()
        );
        match &path {
            Some(path) if !path.is_empty() => {
                let route: Vec<String> = path.nodes.iter().map(ToString::to_string).collect();
                println!(
                    "path: {} nodes, cost {:.2}, {} expanded",
                    path.len(),
                    path.total_cost,
                    path.expanded
                );
                println!("route: {}", route.join(" -> "));
            }
            Some(path) => println!("path: none ({} expanded)", path.expanded),
            None => println!("path: mesh has no nodes"),
        }
    }

    if options.audit {
        let violations = mesh.check_invariants();
        if violations.is_empty() {
            println!("audit: ok");
        } else {
            for violation in &violations {
                eprintln!("audit: {violation:?}");
            }
            std::process::exit(2);
        }
    }
}

/// The config file (or defaults) with command-line overrides applied.
fn effective_config(options: &Options) -> MeshConfig {
    let mut config = load_config(options.config_path.as_deref());
    if let Some(count) = options.obstacles {
        config.scatter.count = Some(count);
    }
    config
}

fn load_config(path: Option<&str>) -> MeshConfig {
    let Some(path) = path else {
        return MeshConfig::default();
    };
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read config {path}: {e}");
        std::process::exit(1);
    });
    MeshConfig::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Failed to load config {path}: {e}");
        std::process::exit(1);
    })
}

fn parse_point(s: &str) -> Option<(f64, f64)> {
    let (x, y) = s.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Parse command-line arguments (`args[0]` is the program name) with plain
/// string matching.
fn parse_args(args: &[String]) -> Options {
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                options.config_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--seed" => {
                i += 1;
                options.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a valid number");
                    std::process::exit(1);
                });
            }
            "--obstacles" => {
                i += 1;
                options.obstacles =
                    Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--obstacles requires a valid number");
                        std::process::exit(1);
                    }));
            }
            "--random-endpoints" => options.random_endpoints = true,
            "--from" => {
                i += 1;
                options.from = Some(args.get(i).and_then(|s| parse_point(s)).unwrap_or_else(
                    || {
                        eprintln!("--from requires a point as X,Y");
                        std::process::exit(1);
                    },
                ));
            }
            "--to" => {
                i += 1;
                options.to = Some(args.get(i).and_then(|s| parse_point(s)).unwrap_or_else(
                    || {
                        eprintln!("--to requires a point as X,Y");
                        std::process::exit(1);
                    },
                ));
            }
            "--snapshot" => options.snapshot = true,
            "--audit" => options.audit = true,
            "--print-config" => options.print_config = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_usage() {
    println!("Usage: rectnav [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>        JSON mesh config (default: built-in defaults)");
    println!("  --seed <N>             Scatter/endpoint seed (default: 0)");
    println!("  --obstacles <N>        Obstacles to scatter (default: from config)");
    println!("  --random-endpoints     Pick random start/goal instead of first/last node");
    println!("  --from <X,Y>           Start point (overrides endpoint picking)");
    println!("  --to <X,Y>             Goal point (overrides endpoint picking)");
    println!("  --snapshot             Print the mesh snapshot as JSON instead of a summary");
    println!("  --audit                Check mesh invariants and exit non-zero on failure");
    println!("  --print-config         Print the effective config (file plus overrides) and exit");
    println!("  --help, -h             Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        assert_eq!(parse_point("10,20.5"), Some((10.0, 20.5)));
        assert_eq!(parse_point(" 3 , 4 "), Some((3.0, 4.0)));
        assert_eq!(parse_point("10"), None);
        assert_eq!(parse_point("a,b"), None);
    }

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("rectnav")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn print_config_reflects_later_overrides() {
        let options = parse_args(&args(&["--print-config", "--obstacles", "7", "--seed", "3"]));
        assert!(options.print_config);
        assert_eq!(options.seed, 3);
        let config = effective_config(&options);
        assert_eq!(config.scatter.count, Some(7));
        assert_eq!(config.scatter_count(), 7);
    }

    #[test]
    fn print_config_reads_a_config_given_after_it() {
        let path = std::env::temp_dir().join(format!("rectnav-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "map_side": 5, "tile_width": 16.0 }"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();
        let options = parse_args(&args(&["--print-config", "--config", &path_arg]));
        let config = effective_config(&options);
        std::fs::remove_file(&path).unwrap();
        assert!(options.print_config);
        assert_eq!(config.map_side, 5);
        assert_eq!(config.tile_width, 16.0);
    }

    #[test]
    fn endpoint_flags_parse() {
        let options = parse_args(&args(&["--from", "1,2", "--to", "30.5,40", "--audit"]));
        assert_eq!(options.from, Some((1.0, 2.0)));
        assert_eq!(options.to, Some((30.5, 40.0)));
        assert!(options.audit);
        assert!(!options.print_config);
    }
}
