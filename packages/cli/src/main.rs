#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crowd-flow dashboard.
//!
//! Every dashboard view (dates, locations, hourly snapshot, series, flow
//! estimates) is available as a subcommand, alongside hour playback, the
//! sample data generator, and the API server. Run without a subcommand
//! for an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`crowd_flow_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use crowd_flow_observation_models::HourPolicy;
use crowd_flow_server::ServerOptions;

use crate::commands::Context;

#[derive(Parser)]
#[command(name = "crowd_flow_cli", about = "Crowd-flow dashboard toolchain")]
struct Cli {
    /// CSV dataset to load (falls back to `CROWD_FLOW_DATA`, then sample data)
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    /// TOML configuration (falls back to `CROWD_FLOW_CONFIG`, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// How hours are derived from timestamps: embedded, utc, or local
    #[arg(long, global = true, value_parser = parse_hour_policy)]
    hour_policy: Option<HourPolicy>,
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Date, hour, and location selection shared by the view subcommands.
#[derive(Args)]
struct SelectionArgs {
    /// Date (`YYYY-MM-DD`); defaults to the earliest date in the dataset
    #[arg(long)]
    date: Option<String>,
    /// Hour of day; defaults to the current local hour
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    hour: Option<u32>,
    /// Location name; defaults to the location of the first row
    #[arg(long)]
    location: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the distinct dates in the dataset
    Dates,
    /// List the locations observed on a date
    Locations {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Show the observations for one date and hour
    Snapshot {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Show the hourly series of one location on one date
    Series {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Estimate gravity-model flows for one date and hour
    Flows {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Step through the hours of a date on the playback clock
    Play {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Number of hour advances before stopping
        #[arg(long, default_value = "24")]
        steps: u32,
    },
    /// Write the sample dataset as CSV
    Generate {
        /// Output file (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Start the API server
    Serve {
        /// Address to bind (defaults to `BIND_ADDR`, then 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port to bind (defaults to `PORT`, then 8080)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn parse_hour_policy(value: &str) -> Result<HourPolicy, String> {
    value
        .parse::<HourPolicy>()
        .map_err(|_| format!("expected one of embedded, utc, local; got `{value}`"))
}

impl SelectionArgs {
    fn resolve(self, ctx: &Context) -> crowd_flow_analytics::Selection {
        ctx.selection(self.date, self.hour, self.location)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crowd_flow_cli_utils::init_logger();
    let cli = Cli::parse();

    if let Some(Commands::Generate { output }) = &cli.command {
        commands::generate(output.as_deref())?;
        return Ok(());
    }

    let loading = crowd_flow_cli_utils::spinner(&multi, "Loading dataset");
    let loaded = Context::load(cli.file.as_deref(), cli.config.as_deref());
    loading.finish_and_clear();
    let mut ctx = loaded?;
    if let Some(policy) = cli.hour_policy {
        ctx.config.time.hour_policy = policy;
    }

    let Some(command) = cli.command else {
        return interactive::run(ctx, &multi).await;
    };

    let json = cli.json;

    match command {
        Commands::Dates => println!("{}", commands::dates(&ctx, json)?),
        Commands::Locations { selection } => {
            let selection = selection.resolve(&ctx);
            println!("{}", commands::locations(&ctx, &selection, json)?);
        }
        Commands::Snapshot { selection } => {
            let selection = selection.resolve(&ctx);
            println!("{}", commands::snapshot(&ctx, &selection, json)?);
        }
        Commands::Series { selection } => {
            let selection = selection.resolve(&ctx);
            println!("{}", commands::series(&ctx, &selection, json)?);
        }
        Commands::Flows { selection } => {
            let selection = selection.resolve(&ctx);
            println!("{}", commands::flows(&ctx, &selection, json)?);
        }
        Commands::Play { selection, steps } => {
            let selection = selection.resolve(&ctx);
            commands::play(&ctx, &multi, &selection, steps).await?;
        }
        Commands::Serve { bind, port } => {
            let defaults = ServerOptions::from_env();
            let options = ServerOptions {
                bind_addr: bind.unwrap_or(defaults.bind_addr),
                port: port.unwrap_or(defaults.port),
            };
            commands::serve(ctx, Some(options)).await?;
        }
        Commands::Generate { .. } => {}
    }

    Ok(())
}
