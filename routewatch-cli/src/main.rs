//! RouteWatch CLI - Command-line interface
//!
//! Wires the RouteWatch library to real collaborators: the HTTP routing API,
//! the gpsd location daemon and a headless map.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::route::RouteArgs;
use commands::track::TrackArgs;

#[derive(Parser)]
#[command(name = "routewatch")]
#[command(version = routewatch::VERSION)]
#[command(about = "Live GPS tracking and traffic-aware route overlays", long_about = None)]
struct Cli {
    /// Mirror diagnostic logs to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a route and describe the overlay drawn for it
    Route(RouteArgs),

    /// Follow the device position from gpsd or a replay file
    Track(TrackArgs),

    /// Manage ~/.routewatch/config.ini
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Route(args) => commands::route::run(args, cli.verbose).await,
        Commands::Track(args) => commands::track::run(args, cli.verbose).await,
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
