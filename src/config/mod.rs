//! Deployment settings.
//!
//! Sources are layered lowest first: `config/default`, `inkpad`, an explicit
//! `--config-file`, `INKPAD__SECTION__KEY` environment variables and finally
//! CLI flags. Every raw field is optional; [`Settings::from_raw`] applies the
//! defaults and validates the result.

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "inkpad";
const ENV_PREFIX: &str = "INKPAD";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Required by every command that touches storage; checked at startup.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub max_entries: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> LoadError {
    LoadError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Parses the command line and resolves settings for it.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));
    if let Some(path) = cli.config_file.as_deref() {
        builder = builder.add_source(File::from(path));
    }
    let builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::IssueToken(args)) => raw.apply_database_override(&args.database),
        None => {}
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    max_entries: Option<usize>,
}

fn overlay<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        slot.clone_from(value);
    }
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, flags: &ServeOverrides) {
        overlay(&mut self.server.host, &flags.server_host);
        overlay(&mut self.server.port, &flags.server_port);
        overlay(&mut self.logging.level, &flags.log_level);
        overlay(&mut self.logging.json, &flags.log_json);
        overlay(&mut self.database.url, &flags.database_url);
        overlay(
            &mut self.database.max_connections,
            &flags.database_max_connections,
        );
        overlay(&mut self.cache.enabled, &flags.cache_enabled);
        overlay(&mut self.cache.max_entries, &flags.cache_max_entries);
    }

    fn apply_database_override(&mut self, flags: &DatabaseOverride) {
        overlay(&mut self.database.url, &flags.database_url);
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            server: raw.server.try_into()?,
            logging: raw.logging.try_into()?,
            database: raw.database.try_into()?,
            cache: raw.cache.try_into()?,
        })
    }
}

impl TryFrom<RawServerSettings> for ServerSettings {
    type Error = LoadError;

    fn try_from(raw: RawServerSettings) -> Result<Self, LoadError> {
        let host = raw.host.as_deref().unwrap_or("127.0.0.1");
        let port = match raw.port {
            Some(0) => return Err(invalid("server.port", "port must be greater than zero")),
            Some(port) => port,
            None => 3000,
        };

        let candidate = format!("{host}:{port}");
        let addr = candidate
            .parse()
            .map_err(|err| invalid("server.host", format!("`{candidate}`: {err}")))?;
        Ok(Self { addr })
    }
}

impl TryFrom<RawLoggingSettings> for LoggingSettings {
    type Error = LoadError;

    fn try_from(raw: RawLoggingSettings) -> Result<Self, LoadError> {
        let level = raw
            .level
            .as_deref()
            .map(LevelFilter::from_str)
            .transpose()
            .map_err(|err| invalid("logging.level", err.to_string()))?
            .unwrap_or(LevelFilter::INFO);
        let format = match raw.json {
            Some(true) => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        Ok(Self { level, format })
    }
}

impl TryFrom<RawDatabaseSettings> for DatabaseSettings {
    type Error = LoadError;

    fn try_from(raw: RawDatabaseSettings) -> Result<Self, LoadError> {
        let url = raw
            .url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let max_connections = NonZeroU32::new(raw.max_connections.unwrap_or(8))
            .ok_or_else(|| invalid("database.max_connections", "must be greater than zero"))?;
        Ok(Self {
            url,
            max_connections,
        })
    }
}

impl TryFrom<RawCacheSettings> for CacheSettings {
    type Error = LoadError;

    fn try_from(raw: RawCacheSettings) -> Result<Self, LoadError> {
        let max_entries = NonZeroUsize::new(raw.max_entries.unwrap_or(1024))
            .ok_or_else(|| invalid("cache.max_entries", "must be greater than zero"))?;
        Ok(Self {
            enabled: raw.enabled.unwrap_or(true),
            max_entries,
        })
    }
}
