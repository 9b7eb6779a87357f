//! autoguide CLI - Generate a bounding-box guide document for an asset.

use autoguide::guide::{generate_guide, ExtentNormalization, GuideConfig};
use autoguide::geom::VisibilityPolicy;
use autoguide::scene::FileStore;
use std::env;
use std::error::Error as _;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Options collected from the command line.
#[derive(Default)]
struct Options {
    level: &'static str,
    config: Option<PathBuf>,
    json: bool,
    legacy_extent: bool,
    respect_visibility: bool,
    files: Vec<String>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut opts = Options { level: "info", ..Default::default() };
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => opts.level = "debug",
            "-vv" | "--trace" => opts.level = "trace",
            "-q" | "--quiet" => opts.level = "error",
            "-j" | "--json" => opts.json = true,
            "--legacy-extent" => opts.legacy_extent = true,
            "--respect-visibility" => opts.respect_visibility = true,
            "-c" | "--config" => match iter.next() {
                Some(path) => opts.config = Some(PathBuf::from(path)),
                None => {
                    eprintln!("Error: --config needs a file argument");
                    std::process::exit(1);
                }
            },
            "-h" | "--help" | "help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                print_version();
                return;
            }
            s if s.starts_with('-') && s.len() > 1 => {
                eprintln!("Unknown option: {}", s);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
            _ => opts.files.push(arg.clone()),
        }
    }

    if opts.json && opts.level == "info" {
        opts.level = "warn";
    }
    init_logging(opts.level);

    if opts.files.len() != 2 {
        eprintln!("Error: expected <source.usda> and <target.usda>");
        eprintln!("Usage: autoguide [OPTIONS] <source.usda> <target.usda>");
        std::process::exit(1);
    }

    let mut config = match GuideConfig::load(opts.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if opts.legacy_extent {
        config.normalization = ExtentNormalization::LegacyMantissa;
    }
    if opts.respect_visibility {
        config.visibility = VisibilityPolicy::Respect;
    }
    tracing::debug!("config: {:?}", config);

    let store = FileStore::new();
    match generate_guide(&store, &opts.files[0], &opts.files[1], &config) {
        Ok(report) => {
            if opts.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut cause = e.source();
            while let Some(inner) = cause {
                eprintln!("  caused by: {}", inner);
                cause = inner.source();
            }
            std::process::exit(1);
        }
    }
}

/// Install the fmt subscriber; `RUST_LOG` overrides the flag-derived level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_version() {
    println!(
        "autoguide {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("AUTOGUIDE_BUILD_DATE"),
        env!("AUTOGUIDE_BUILD_TIME"),
    );
}

fn print_help() {
    println!("autoguide - Bounding-box guide mesh generator");
    println!();
    println!("USAGE:");
    println!("    autoguide [OPTIONS] <source.usda> <target.usda>");
    println!();
    println!("Computes the world bound of the source's default prim and writes a");
    println!("box mesh at <prim>/model/guide/box into the target document.");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose             Debug output");
    println!("    -vv, --trace              Trace output (per-node traversal)");
    println!("    -q, --quiet               Errors only");
    println!("    -c, --config <file>       Settings file (JSON)");
    println!("    -j, --json                Print the guide report as JSON");
    println!("    --legacy-extent           Truncate scientific-notation extents to their mantissa");
    println!("    --respect-visibility      Leave invisible geometry out of the bound");
    println!("    -V, --version             Show version");
    println!("    -h, --help                Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    AUTOGUIDE_CONFIG          Settings file used when --config is absent");
    println!("    RUST_LOG                  Log filter, overrides -v/-q");
}
