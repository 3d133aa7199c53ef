//! Interactive mode for the server.
//!
//! Prompts the user for bind address and port before starting the server.

use dialoguer::{Confirm, Input};

use crate::{AppState, ServerOptions};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Asks the user for a bind address and port, using `BIND_ADDR` and `PORT`
/// as the defaults, then delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(state: AppState) -> std::io::Result<()> {
    println!("Crowd Flow Server");
    println!();

    let defaults = ServerOptions::from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr.clone())
        .interact_text()
        .unwrap_or(defaults.bind_addr);

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .unwrap_or(defaults.port);

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(state, ServerOptions { bind_addr, port }).await
}
