//! Dark Nova - Development Tools

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use nova_core::cost::EconomyModifiers;
use nova_core::time::Timestamp;
use nova_tools::scenario::{run_scenario, Scenario};
use nova_tools::validate::{load_config, validate_config_file};
use nova_tools::{costs, read_file};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nova-tools")]
#[command(about = "Development tools for the Dark Nova colony economy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a RON config file
    Validate {
        /// Path to the config file
        path: PathBuf,
    },
    /// Replay a RON scenario and print the caught-up planet as JSON
    Simulate {
        /// Path to the scenario file
        path: PathBuf,
        /// Config file; defaults apply when absent
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the cost and build time of a building's first levels
    Costs {
        /// Building key, e.g. metalMine
        building: String,
        /// Number of levels to list
        #[arg(long, default_value_t = 10)]
        levels: u32,
        /// Robotics factory level
        #[arg(long, default_value_t = 0)]
        robotics: u32,
        /// Nanite factory level
        #[arg(long, default_value_t = 0)]
        nanite: u32,
    },
}

fn wall_clock() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
    Timestamp::from_millis(millis)
}

fn run(command: Commands) -> nova_tools::Result<()> {
    match command {
        Commands::Validate { path } => {
            tracing::info!("Validating config: {}", path.display());
            let config = validate_config_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Simulate { path, config } => {
            let config = load_config(config.as_deref())?;
            let scenario = Scenario::from_ron_str(&read_file(&path)?)?;
            let report = run_scenario(&scenario, config, wall_clock())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Costs {
            building,
            levels,
            robotics,
            nanite,
        } => {
            let modifiers = EconomyModifiers {
                robotics,
                nanite,
                shipyard: 0,
            };
            let rows = costs::cost_table(&building, levels, modifiers)?;
            print!("{}", costs::render(&building, &rows));
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
