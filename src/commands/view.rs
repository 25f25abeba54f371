use colored::Colorize;

use crate::remote::ConnectionState;

/// Render one connection state: Disconnected / Closed / Open, with a
/// distinct error substate.
pub fn print_state(state: &ConnectionState, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string())
        );
        return;
    }

    if let Some(ref error) = state.error {
        println!("  {} {}", "✗".red(), "Error".red().bold());
        println!("  {}", error);
        return;
    }

    if !state.connected {
        println!("  {} {}", "!".yellow(), "Disconnected".yellow());
        return;
    }

    if state.is_open {
        println!("  {} {}", "✓".green(), "Open".green().bold());
    } else {
        println!("  {} {}", "◆".normal(), "Closed".bold());
    }

    if let Some(ref tool) = state.tool {
        println!("  {}  Tool: {}", "◆".cyan(), tool);
    }
    if let Some(ref tab_id) = state.tab_id {
        println!("  {}  Tab: {}", "ℹ".dimmed(), tab_id.dimmed());
    }
}
