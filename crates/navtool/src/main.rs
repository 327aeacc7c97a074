// navtool - command-line front end for navgraph
// Subcommands:
// - info: parse and build a mesh file, print its statistics
// - nearest / contains: area lookups for a point
// - path: plan a route between two points
// - check: straight-line hull walk over the mesh floors
// - synth: write a flat grid mesh file

use clap::{Args, Parser, Subcommand};
use glam::Vec3;

mod commands;

use navgraph::NavSettings;
use navgraph_shared::config::Config;
use navgraph_shared::log::{initialize_logging, map_log_level};
use navgraph_shared::{CONFIG_ENV_PREFIX, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "navtool")]
#[command(about = "Navigation mesh inspection and path planning")]
#[command(version)]
struct Cli {
    /// Console log level (0=Error, 1=Warn, 2=Info, 3=Debug, 4=Trace)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<i32>,

    /// Configuration file with a [Navigation] section
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and build a mesh, print counts and the build report
    Info(FileArgs),
    /// Area whose center is closest to a point
    Nearest(PointArgs),
    /// Area containing a point
    Contains(PointArgs),
    /// Plan a path between the areas holding two points
    Path(PathArgs),
    /// Straight-line traversal check against the mesh floors
    Check(CheckArgs),
    /// Write a flat grid mesh
    Synth(SynthArgs),
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Mesh file
    file: String,
}

#[derive(Args, Debug)]
struct PointArgs {
    /// Mesh file
    file: String,
    #[arg(allow_negative_numbers = true)]
    x: f32,
    #[arg(allow_negative_numbers = true)]
    y: f32,
    #[arg(allow_negative_numbers = true)]
    z: f32,
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Mesh file
    file: String,

    /// Start point (format: X,Y,Z)
    #[arg(long = "from", value_parser = parse_point, allow_hyphen_values = true)]
    from: Vec3,

    /// Goal point (format: X,Y,Z)
    #[arg(long = "to", value_parser = parse_point, allow_hyphen_values = true)]
    to: Vec3,

    /// Print the path as JSON
    #[arg(long = "json")]
    json: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Mesh file
    file: String,

    /// Start point (format: X,Y,Z)
    #[arg(long = "from", value_parser = parse_point, allow_hyphen_values = true)]
    from: Vec3,

    /// Goal point (format: X,Y,Z)
    #[arg(long = "to", value_parser = parse_point, allow_hyphen_values = true)]
    to: Vec3,

    /// Depth of the floor slab built under each area
    #[arg(long = "floor-thickness", default_value_t = 16.0)]
    floor_thickness: f32,
}

#[derive(Args, Debug)]
struct SynthArgs {
    /// Output file
    output: String,

    #[arg(long = "cols", default_value_t = 3)]
    cols: u32,

    #[arg(long = "rows", default_value_t = 3)]
    rows: u32,

    /// Cell edge length
    #[arg(long = "size", default_value_t = 100.0)]
    size: f32,

    /// Floor height
    #[arg(long = "height", default_value_t = 0.0, allow_negative_numbers = true)]
    height: f32,
}

fn parse_point(input: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("Expected X,Y,Z but got '{}'", input));
    }
    let mut coords = [0.0f32; 3];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f32>()
            .map_err(|_| format!("Invalid coordinate '{}'", part))?;
    }
    Ok(Vec3::from_array(coords))
}

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let mut config = Config::from_env(CONFIG_ENV_PREFIX);
    match path {
        Some(path) => config.set_source(path, CONFIG_ENV_PREFIX)?,
        None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
            config.set_source(DEFAULT_CONFIG_FILE, CONFIG_ENV_PREFIX)?
        }
        None => {}
    }
    Ok(config)
}

fn init_logging(log_level: Option<i32>, config: &Config) {
    let level = log_level.unwrap_or_else(|| config.get_int_default("LogLevel", 2));
    let log_dir = config.get_string_default("LogsDir", "");
    let log_dir = (!log_dir.is_empty()).then_some(log_dir);
    initialize_logging(log_dir.as_deref(), map_log_level(level));
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(cli.log_level, &config);
    if !config.filename().is_empty() {
        tracing::info!("Using configuration file: {}", config.filename());
    }
    let settings = NavSettings::from_config(&config);

    match cli.command {
        Command::Info(args) => commands::run_info(&args.file, settings),
        Command::Nearest(args) => {
            let point = Vec3::new(args.x, args.y, args.z);
            commands::run_nearest(&args.file, point, settings)
        }
        Command::Contains(args) => {
            let point = Vec3::new(args.x, args.y, args.z);
            commands::run_contains(&args.file, point, settings)
        }
        Command::Path(args) => {
            commands::run_path(&args.file, args.from, args.to, args.json, settings)
        }
        Command::Check(args) => {
            let thickness = args.floor_thickness;
            commands::run_check(&args.file, args.from, args.to, thickness, settings)
        }
        Command::Synth(args) => {
            commands::run_synth(&args.output, args.cols, args.rows, args.size, args.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("1, -2.5,3").unwrap(), Vec3::new(1.0, -2.5, 3.0));
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,a,3").is_err());
    }

    #[test]
    fn test_cli_parses_path() {
        let cli = Cli::try_parse_from([
            "navtool", "-l", "3", "path", "map.nav", "--from", "0,0,0", "--to", "-10,5,2", "--json",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(3));
        match cli.command {
            Command::Path(args) => {
                assert_eq!(args.to, Vec3::new(-10.0, 5.0, 2.0));
                assert!(args.json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["navtool", "explode"]).is_err());
    }
}
