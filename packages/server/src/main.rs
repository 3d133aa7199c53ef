#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the crowd-flow API server.
//!
//! Reads the dataset from `CROWD_FLOW_DATA` (falling back to sample data),
//! the configuration from `CROWD_FLOW_CONFIG` (falling back to the embedded
//! defaults), and listens on `BIND_ADDR:PORT`.

use crowd_flow_config::DashboardConfig;
use crowd_flow_server::{AppState, ServerOptions, current_hour, run_server};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = DashboardConfig::load(None)?;
    let dataset = crowd_flow_ingest::load_dataset(None)?;
    let state = AppState::new(dataset, config, current_hour())?;

    run_server(state, ServerOptions::from_env()).await?;

    Ok(())
}
