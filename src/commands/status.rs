use colored::Colorize;

use crate::browser;
use crate::cli::Cli;
use crate::commands::view;
use crate::config::Config;
use crate::error::Result;
use crate::remote::{ConnectionState, RemoteControl};

/// One status poll: resolve the tab, load state, render. Expected
/// failures (wrong page, no API yet) render as the error substate instead
/// of propagating.
pub async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let state = load(config).await;
    view::print_state(&state, cli.json);
    Ok(())
}

pub(crate) async fn load(config: &Config) -> ConnectionState {
    let control = match RemoteControl::connect(config.clone()).await {
        Ok(control) => control,
        Err(e) => return ConnectionState::failed(None, &e),
    };

    let tab_id = control.tab_id().to_string();
    match control.load_state().await {
        Ok(state) => ConnectionState::connected(tab_id, state),
        Err(e) => ConnectionState::failed(Some(tab_id), &e),
    }
}

/// List candidate tabs so --tab / DVDEBUG_TAB can pin one.
pub async fn tabs(cli: &Cli, config: &Config) -> Result<()> {
    let pages = browser::list_pages(config.cdp.port).await?;

    if cli.json {
        let rows: Vec<serde_json::Value> = pages
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "title": p.title,
                    "url": p.url,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if pages.is_empty() {
        println!("  {} No open tabs", "!".yellow());
        return Ok(());
    }

    for page in pages {
        let allowed = crate::remote::allowed_url(&page.url, &config.origins);
        let marker = if allowed { "✓".green() } else { " ".normal() };
        println!("  {} {}  {}", marker, page.id.dimmed(), page.url);
    }

    Ok(())
}
