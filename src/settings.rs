//! Runtime settings, layered from defaults, an optional `config` file and `RECORDS__*`
//! environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_DATABASE_PATH: &str = "student_records.db";
pub const DEFAULT_WEB_ADDRESS: &str = "127.0.0.1:8501";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub web: WebSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    /// Path of the SQLite file.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebSettings {
    /// Socket address the web server listens on.
    pub address: String,
}

impl Settings {
    /// Loads the settings from `config.{toml,json,...}` in the working directory, if present,
    /// and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from(config_file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database.path", DEFAULT_DATABASE_PATH)?
            .set_default("web.address", DEFAULT_WEB_ADDRESS)?
            .add_source(File::with_name(config_file).required(false))
            .add_source(Environment::with_prefix("RECORDS").separator("__"))
            .build()?
            .try_deserialize()
    }
}
