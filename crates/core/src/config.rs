use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENV_FILE: &str = "discordToken.env";
pub const TOKEN_ENV_KEY: &str = "TOKEN";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub formcheck: FormCheckConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub token: SecretString,
    /// Register the command in a single guild instead of globally.
    pub guild_id: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct FormCheckConfig {
    pub message_style: MessageStyle,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    #[default]
    Text,
    Embed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub discord_token: Option<String>,
    pub discord_guild_id: Option<u64>,
    pub message_style: Option<MessageStyle>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    /// Dotenv-style credential file; `discordToken.env` when unset.
    pub env_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error(
        "credential file `{0}` was not found and no bot token was provided; create it with a `TOKEN=<bot token>` line"
    )]
    MissingEnvFile(PathBuf),
    #[error("could not load credential file `{path}`: {source}")]
    EnvFile { path: PathBuf, source: dotenvy::Error },
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    /// True when startup failed because no credential could be found at all.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingEnvFile(_))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig { token: String::new().into(), guild_id: None },
            formcheck: FormCheckConfig { message_style: MessageStyle::Text },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    normalize_token(&value).into()
}

/// serenity adds its own `Bot ` prefix, so a pasted `Bot xyz` token is trimmed.
fn normalize_token(value: &str) -> String {
    let trimmed = value.trim();
    trimmed.strip_prefix("Bot ").map(str::trim).unwrap_or(trimmed).to_string()
}

impl std::str::FromStr for MessageStyle {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "embed" => Ok(Self::Embed),
            other => Err(ConfigError::Validation(format!(
                "unsupported message style `{other}` (expected text|embed)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("formcheck.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        let env_file = options.env_file.unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
        let env_file_found = config.apply_env_file(&env_file)?;

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);

        if !env_file_found && config.discord.token.expose_secret().is_empty() {
            return Err(ConfigError::MissingEnvFile(env_file));
        }
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discord) = patch.discord {
            if let Some(token) = discord.token {
                self.discord.token = secret_value(token);
            }
            if let Some(guild_id) = discord.guild_id {
                self.discord.guild_id = Some(guild_id);
            }
        }

        if let Some(formcheck) = patch.formcheck {
            if let Some(message_style) = formcheck.message_style {
                self.formcheck.message_style = message_style;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    /// Reads `TOKEN` from the credential file. Returns whether the file existed.
    fn apply_env_file(&mut self, path: &Path) -> Result<bool, ConfigError> {
        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(source) if source.not_found() => return Ok(false),
            Err(source) => return Err(ConfigError::EnvFile { path: path.to_path_buf(), source }),
        };

        for entry in entries {
            let (key, value) = entry
                .map_err(|source| ConfigError::EnvFile { path: path.to_path_buf(), source })?;
            if key == TOKEN_ENV_KEY && !value.trim().is_empty() {
                self.discord.token = secret_value(value);
            }
        }

        Ok(true)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let token = read_env("FORMCHECK_DISCORD_TOKEN").or_else(|| read_env(TOKEN_ENV_KEY));
        if let Some(value) = token {
            self.discord.token = secret_value(value);
        }
        if let Some(value) = read_env("FORMCHECK_DISCORD_GUILD_ID") {
            self.discord.guild_id = Some(parse_u64("FORMCHECK_DISCORD_GUILD_ID", &value)?);
        }

        if let Some(value) = read_env("FORMCHECK_MESSAGE_STYLE") {
            self.formcheck.message_style = value.parse()?;
        }

        let log_level =
            read_env("FORMCHECK_LOGGING_LEVEL").or_else(|| read_env("FORMCHECK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FORMCHECK_LOGGING_FORMAT").or_else(|| read_env("FORMCHECK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(token) = overrides.discord_token {
            self.discord.token = secret_value(token);
        }
        if let Some(guild_id) = overrides.discord_guild_id {
            self.discord.guild_id = Some(guild_id);
        }
        if let Some(message_style) = overrides.message_style {
            self.formcheck.message_style = message_style;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_discord(&self.discord)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("formcheck.toml"), PathBuf::from("config/formcheck.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_discord(discord: &DiscordConfig) -> Result<(), ConfigError> {
    let token = discord.token.expose_secret();
    if token.is_empty() {
        return Err(ConfigError::Validation(
            "discord.token is required. Set `TOKEN` in discordToken.env (Discord Developer Portal > Your App > Bot > Reset Token)".to_string(),
        ));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "discord.token must not contain whitespace".to_string(),
        ));
    }

    if discord.guild_id == Some(0) {
        return Err(ConfigError::Validation(
            "discord.guild_id must be a non-zero snowflake when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    formcheck: Option<FormCheckPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    token: Option<String>,
    guild_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FormCheckPatch {
    message_style: Option<MessageStyle>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
