use clap::{Parser, Subcommand};

use crate::commands;
use crate::config::Config;
use crate::error::Result;

/// Dragvertising debug panel controller - drive the hidden superadmin panel
/// in a running browser over CDP
#[derive(Parser)]
#[command(name = "dvdebug")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Browser remote debugging port
    #[arg(long, env = "DVDEBUG_CDP_PORT", global = true)]
    pub cdp_port: Option<u16>,

    /// Pin a specific tab by page id (from 'dvdebug tabs')
    #[arg(long, env = "DVDEBUG_TAB", global = true)]
    pub tab: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show panel state on the active tab
    Status,

    /// Open the debug panel
    Open,

    /// Close the debug panel
    Close,

    /// Toggle the debug panel
    Toggle,

    /// Select the active tool
    Tool {
        /// Tool identifier (e.g. role)
        name: String,

        /// Also open the panel (quick-tool shortcut)
        #[arg(long)]
        open: bool,
    },

    /// Mount the debug panel into the active tab now
    Inject,

    /// List candidate tabs
    Tabs,

    /// Live status view, refreshed on an interval
    Watch {
        /// Refresh interval in milliseconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Page-side agent: beacon, auto-injection, control channel
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// Attach to the active tab and run until Ctrl-C
    Run {
        /// Control channel port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ping a running agent
    Ping {
        /// Control channel port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ask a running agent what the page exposes
    Check {
        /// Control channel port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ask a running agent to inject now
    Inject {
        /// Control channel port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let mut config = Config::load()?;

        // CLI flags win over file and environment
        if let Some(port) = self.cdp_port {
            config.cdp.port = port;
        }
        if let Some(ref tab) = self.tab {
            config.cdp.tab = Some(tab.clone());
        }

        match &self.command {
            Commands::Status => commands::status::run(self, &config).await,
            Commands::Open => commands::panel::open(self, &config).await,
            Commands::Close => commands::panel::close(self, &config).await,
            Commands::Toggle => commands::panel::toggle(self, &config).await,
            Commands::Tool { name, open } => {
                commands::panel::tool(self, &config, name, *open).await
            }
            Commands::Inject => commands::inject::run(self, &config).await,
            Commands::Tabs => commands::status::tabs(self, &config).await,
            Commands::Watch { interval } => {
                commands::watch::run(self, &config, *interval).await
            }
            Commands::Agent { command } => commands::agent::run(self, &config, command).await,
            Commands::Config { command } => commands::config::run(self, &config, command).await,
        }
    }
}
