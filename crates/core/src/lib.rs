//! Shared configuration for the form-check bot.
//!
//! Settings are layered: defaults, an optional `formcheck.toml`, the
//! `discordToken.env` credential file, environment variables, then
//! programmatic overrides.

pub mod config;

pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat, MessageStyle};
