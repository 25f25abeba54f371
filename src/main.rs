use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dvdebug::cli::Cli;
use dvdebug::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Default to info, but keep the WebSocket transport quiet - tungstenite
    // logs every frame at debug and it drowns out our own output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info")
            .add_directive("tungstenite=warn".parse().unwrap())
            .add_directive("tokio_tungstenite=warn".parse().unwrap())
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    cli.run().await
}
