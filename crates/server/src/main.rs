mod bootstrap;
mod lifecycle;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use formcheck_core::config::{AppConfig, LoadOptions};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(
    name = "formcheck",
    about = "Discord bot that turns /form-check submissions into review threads",
    after_help = "Examples:\n  formcheck\n  formcheck --env-file secrets/discordToken.env"
)]
struct Args {
    #[arg(long, help = "Path to formcheck.toml (required to exist when given)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Credential file holding TOKEN=<bot token> [default: discordToken.env]")]
    env_file: Option<PathBuf>,
}

fn init_logging(config: &AppConfig) {
    use formcheck_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Args::parse()).await
}

async fn run(args: Args) -> Result<()> {
    // Credentials are checked before anything touches the network.
    let mut app = bootstrap::bootstrap(LoadOptions {
        require_file: args.config.is_some(),
        config_path: args.config,
        env_file: args.env_file,
        ..LoadOptions::default()
    })?;
    init_logging(&app.config);
    tracing::info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        message_style = ?app.config.formcheck.message_style,
        guild_id = ?app.config.discord.guild_id,
        "application bootstrap complete"
    );

    let shutdown = CancellationToken::new();
    lifecycle::spawn_signal_listener(shutdown.clone());
    app.lifecycle.run(shutdown).await?;

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        state = ?app.lifecycle.state(),
        "formcheck stopped"
    );
    Ok(())
}
