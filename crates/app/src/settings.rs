//! Handles settings for the application.
//!
//! Settings are read from a TOML file (`settings.toml` unless `--config` says
//! otherwise) and from `BUDGET_`-prefixed environment variables, e.g.
//! `BUDGET_SERVER__PORT=8080`.
//!
//! ```toml
//! [app]
//! level = "debug"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//! database = { sqlite = "budget.db" }
//! ```

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings.toml";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("budget.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            database: Database::default(),
        }
    }
}

impl Server {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

#[derive(Debug, Parser)]
#[command(name = "budgetd", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the log level (e.g. `debug`).
    #[arg(long, env = "BUDGET_LOG")]
    level: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let mut settings: Settings = Self::builder(config_path)
            .build()?
            .try_deserialize()?;
        if let Some(level) = args.level {
            settings.app.level = level;
        }
        Ok(settings)
    }

    fn builder(path: &str) -> config::ConfigBuilder<config::builder::DefaultState> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("BUDGET").separator("__"))
    }
}
