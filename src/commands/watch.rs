use std::time::Duration;

use colored::Colorize;

use crate::cli::Cli;
use crate::commands::{status, view};
use crate::config::Config;
use crate::error::Result;

/// Live status view: reload and render on a fixed cadence until Ctrl-C.
///
/// Polling continues while disconnected - the view shows Disconnected
/// until the user navigates somewhere allowed, then picks the state up
/// again without a restart.
pub async fn run(cli: &Cli, config: &Config, interval: Option<u64>) -> Result<()> {
    let interval = Duration::from_millis(interval.unwrap_or(config.timing.refresh_ms));

    if !cli.json {
        println!(
            "  {}  Watching debug panel state (refresh {}ms, Ctrl-C to stop)",
            "ℹ".dimmed(),
            interval.as_millis()
        );
        println!();
    }

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = status::load(config).await;
                view::print_state(&state, cli.json);
                if !cli.json {
                    println!();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if !cli.json {
                    println!("  {}  Stopped", "ℹ".dimmed());
                }
                return Ok(());
            }
        }
    }
}
