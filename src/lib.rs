pub mod cli;
pub mod core;
pub mod providers;

use crate::core::{CallContext, Interrupted, config::AppConfig};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{debug, info, warn};

/// Exit status used when the lookup was cancelled or timed out.
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

pub async fn run<W: Write>(args: &[String], config_path: Option<&str>, out: &mut W) -> Result<()> {
    info!("fxcli starting...");

    // Argument errors take precedence over configuration errors.
    cli::convert::parse_request(args)?;

    let config = AppConfig::load(config_path)?;
    let cmc = &config.providers.coinmarketcap;
    debug!(base_url = %cmc.base_url, "Loaded config");

    let exchanger = providers::CmcClient::new(&cmc.base_url, &config.api_key()?)
        .context("cannot create fx client")?;

    let ctx = CallContext::background();
    let signal_task = tokio::spawn(cancel_on_signal(ctx.clone()));

    let result = cli::convert::execute(&ctx, args, &exchanger, out).await;
    signal_task.abort();
    result
}

/// Maps a failure from [`run`] to a process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<Interrupted>().is_some() {
        INTERRUPTED_EXIT_CODE
    } else {
        1
    }
}

async fn cancel_on_signal(ctx: CallContext) {
    match shutdown_signal().await {
        Ok(()) => {
            info!("Received shutdown signal");
            ctx.cancel();
        }
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
