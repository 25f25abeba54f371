use std::sync::Arc;

use colored::Colorize;

use crate::agent::PageAgent;
use crate::cli::{AgentCommands, Cli};
use crate::config::Config;
use crate::control::{self, ControlRequest, ControlResponse};
use crate::error::{DvDebugError, Result};

pub async fn run(cli: &Cli, config: &Config, command: &AgentCommands) -> Result<()> {
    match command {
        AgentCommands::Run { port } => serve(cli, config, *port).await,
        AgentCommands::Ping { port } => ping(cli, config, *port).await,
        AgentCommands::Check { port } => check(cli, config, *port).await,
        AgentCommands::Inject { port } => inject(cli, config, *port).await,
    }
}

fn control_port(config: &Config, port: Option<u16>) -> u16 {
    port.unwrap_or(config.control.port)
}

async fn serve(cli: &Cli, config: &Config, port: Option<u16>) -> Result<()> {
    let mut config = config.clone();
    if let Some(port) = port {
        config.control.port = port;
    }

    let agent = Arc::new(PageAgent::attach(config).await?);

    if !cli.json {
        println!();
        println!("  {}", "dvdebug agent".bold());
        println!("  {}", "─".repeat(40).dimmed());
        println!("  {}  Tab: {}", "◆".cyan(), agent.tab_url());
        println!(
            "  {}  Control channel: ws://127.0.0.1:{}",
            "◆".cyan(),
            agent.control_port()
        );
        println!("  {}  Press Ctrl+C to stop", "ℹ".dimmed());
        println!();
    }

    agent.run().await
}

async fn ping(cli: &Cli, config: &Config, port: Option<u16>) -> Result<()> {
    let port = control_port(config, port);
    let start = std::time::Instant::now();
    let response = control::request(port, &ControlRequest::Ping).await?;
    let elapsed = start.elapsed();

    match response {
        ControlResponse::Pong { success, timestamp } if success => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "timestamp": timestamp,
                        "latencyMs": elapsed.as_millis() as u64,
                    })
                );
            } else {
                println!(
                    "  {} Agent responded in {}ms (page time {})",
                    "✓".green(),
                    elapsed.as_millis(),
                    timestamp
                );
            }
            Ok(())
        }
        other => Err(DvDebugError::ControlChannel(format!(
            "Unexpected ping response: {:?}",
            other
        ))),
    }
}

async fn check(cli: &Cli, config: &Config, port: Option<u16>) -> Result<()> {
    let port = control_port(config, port);
    let response = control::request(port, &ControlRequest::CheckStatus).await?;

    match response {
        ControlResponse::Status { status, .. } => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }

            let yes_no = |b: bool| {
                if b {
                    "✓".green()
                } else {
                    "✗".red()
                }
            };
            println!("  {} Debug API", yes_no(status.has_api));
            println!("  {} Panel injected", yes_no(status.is_injected));
            println!("  {} Component namespace", yes_no(status.has_component));
            println!("  {} React", yes_no(status.has_react));
            println!("  {} ReactDOM", yes_no(status.has_react_dom));
            println!("  {} Panel open", yes_no(status.is_open));
            Ok(())
        }
        ControlResponse::Injected { error, .. } => Err(DvDebugError::ControlChannel(
            error.unwrap_or_else(|| "check-status failed".to_string()),
        )),
        other => Err(DvDebugError::ControlChannel(format!(
            "Unexpected check-status response: {:?}",
            other
        ))),
    }
}

async fn inject(cli: &Cli, config: &Config, port: Option<u16>) -> Result<()> {
    let port = control_port(config, port);
    let response = control::request(port, &ControlRequest::InjectDebug).await?;

    match response {
        ControlResponse::Injected { success: true, .. } => {
            if cli.json {
                println!("{}", serde_json::json!({ "success": true }));
            } else {
                println!("  {} Injection attempt succeeded", "✓".green());
            }
            Ok(())
        }
        ControlResponse::Injected { error, .. } => Err(DvDebugError::ControlChannel(
            error.unwrap_or_else(|| "injection failed".to_string()),
        )),
        other => Err(DvDebugError::ControlChannel(format!(
            "Unexpected inject-debug response: {:?}",
            other
        ))),
    }
}
