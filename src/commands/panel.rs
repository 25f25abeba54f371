use crate::cli::Cli;
use crate::commands::{status, view};
use crate::config::Config;
use crate::error::Result;
use crate::remote::{ConnectionState, RemoteControl, RemoteOp};

pub async fn open(cli: &Cli, config: &Config) -> Result<()> {
    act(cli, config, &[RemoteOp::Toggle(Some(true))]).await
}

pub async fn close(cli: &Cli, config: &Config) -> Result<()> {
    act(cli, config, &[RemoteOp::Toggle(Some(false))]).await
}

pub async fn toggle(cli: &Cli, config: &Config) -> Result<()> {
    act(cli, config, &[RemoteOp::Toggle(None)]).await
}

/// Select a tool; with `open` this is the quick-tool gesture - select and
/// open in one go.
pub async fn tool(cli: &Cli, config: &Config, name: &str, open: bool) -> Result<()> {
    let mut ops = vec![RemoteOp::SetTool(name.to_string())];
    if open {
        ops.push(RemoteOp::Toggle(Some(true)));
    }
    act(cli, config, &ops).await
}

/// Run the operations in order, then reload and render state regardless of
/// outcome, so any new error is surfaced in the status view.
async fn act(cli: &Cli, config: &Config, ops: &[RemoteOp]) -> Result<()> {
    let action_error = match RemoteControl::connect(config.clone()).await {
        Ok(control) => {
            let mut failure = None;
            for op in ops {
                if let Err(e) = control.execute(op).await {
                    failure = Some(e);
                    break;
                }
            }
            failure
        }
        Err(e) => Some(e),
    };

    let state = match action_error {
        Some(e) => ConnectionState::failed(None, &e),
        None => status::load(config).await,
    };

    view::print_state(&state, cli.json);
    Ok(())
}
