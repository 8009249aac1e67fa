//! Layered application configuration.
//!
//! Layers, later ones winning: built-in defaults, the YAML file passed with
//! `--config`, `APP__SECTION__KEY` environment variables, CLI flags.

use std::net::IpAddr;
use std::path::Path;

use anyhow::{Context, Result};
use directory_sync::config::DirectorySyncConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// DSN used by `--mock`.
pub const MOCK_DSN: &str = "sqlite::memory:";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub modules: ModulesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: 8087,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dsn: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite://data/hr.db?mode=rwc".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `info,directory_sync=debug`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModulesConfig {
    pub directory_sync: DirectorySyncConfig,
}

/// CLI values that take part in the merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub verbose: u8,
    pub mock: bool,
}

impl AppConfig {
    /// Merge defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    /// The file is missing or malformed, or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed("APP__").split("__"));

        figment.extract().with_context(|| match path {
            Some(p) => format!("invalid configuration in {}", p.display()),
            None => "invalid configuration".to_owned(),
        })
    }

    pub fn apply_cli_overrides(&mut self, cli: CliOverrides) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        match cli.verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
        if cli.mock {
            MOCK_DSN.clone_into(&mut self.database.dsn);
        }
    }

    /// # Errors
    /// Serialization failure.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("serializing configuration")
    }
}
