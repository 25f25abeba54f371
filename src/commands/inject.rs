use colored::Colorize;

use crate::browser::resolve_active_tab;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{DvDebugError, Result};
use crate::page::injector::{InjectOutcome, Injector};
use crate::remote::allowed_url;

/// One-shot on-demand injection against the active tab. Unlike the agent's
/// auto-attempts, failures here surface to the caller.
pub async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let tab = resolve_active_tab(config.cdp.port, config.cdp.tab.as_deref()).await?;

    if !allowed_url(&tab.url, &config.origins) {
        return Err(DvDebugError::UrlNotAllowed(tab.url));
    }

    let mut injector = Injector::new(tab, config.keys.clone(), config.timing.clone());
    let outcome = injector.attempt().await?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "alreadyMounted": outcome == InjectOutcome::AlreadyMounted,
            })
        );
        return Ok(());
    }

    match outcome {
        InjectOutcome::Mounted => println!("  {} Debug panel mounted", "✓".green()),
        InjectOutcome::AlreadyMounted => {
            println!("  {} Debug panel was already mounted", "✓".green())
        }
    }

    Ok(())
}
