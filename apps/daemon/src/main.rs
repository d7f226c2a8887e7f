//! Presence daemon entry point.

mod backoff;
mod config;
mod update_loop;

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fusion_compose::Composer;
use fusion_detect::SystemApps;
use fusion_media::SystemMedia;
use fusion_presence::PresenceChannel;

use config::Config;
use update_loop::UpdateLoop;

#[derive(Debug, Parser)]
#[command(name = "fusiond", about = "Discord status fusion daemon")]
struct Args {
    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Uncaught panics are logged like any other fatal error and the process
/// exits 1 instead of aborting with the default handler.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!(panic = %info, "unexpected panic, shutting down");
        std::process::exit(1);
    }));
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    install_panic_hook();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut channel = match PresenceChannel::new(&config.discord_client_id) {
        Ok(channel) => channel,
        Err(err) => {
            error!(error = %err, "invalid presence configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = backoff::connect_with_backoff(&mut channel).await {
        error!(error = %err, "could not reach the local Discord client");
        return ExitCode::FAILURE;
    }

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let update = UpdateLoop::new(
        SystemApps,
        SystemMedia,
        Composer::new(),
        channel,
        config.update_interval,
        config.force_refresh_interval,
    );
    update.run(cancel).await;

    info!("shutdown complete");
    ExitCode::SUCCESS
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                cancel.cancel();
            }
            Err(err) => {
                error!(error = %err, "could not install the interrupt handler");
            }
        }
    });
}
