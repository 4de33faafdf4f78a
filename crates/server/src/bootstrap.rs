use std::sync::Arc;

use formcheck_core::config::{AppConfig, ConfigError, LoadOptions};
use formcheck_discord::{
    commands::{declared_commands, CommandScope},
    events::default_dispatcher,
    gateway::SerenityGateway,
};
use thiserror::Error;

use crate::lifecycle::Lifecycle;

pub struct Application {
    pub config: AppConfig,
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    Ok(bootstrap_with_config(config))
}

/// Wires the dispatcher, gateway and lifecycle from an already loaded config.
fn bootstrap_with_config(config: AppConfig) -> Application {
    let dispatcher = Arc::new(default_dispatcher(config.formcheck.message_style));
    let gateway = Arc::new(SerenityGateway::new(config.discord.token.clone(), dispatcher));
    let lifecycle = Lifecycle::new(
        gateway,
        declared_commands(),
        CommandScope::from_guild(config.discord.guild_id),
    );

    Application { config, lifecycle }
}
