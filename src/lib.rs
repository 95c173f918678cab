use anyhow::{Context, Result};

pub mod cli;
pub mod display;
pub mod error;
pub mod manager;
pub mod matrix;
pub mod menu;
pub mod models;
pub mod roster;
pub mod schema;
pub mod settings;
pub mod web;

pub use error::Error;

use crate::manager::RecordsManager;
use crate::settings::Settings;

/// Opens the database named in `settings`, or `database_override` if given.
pub fn create_default_manager(
    settings: &Settings,
    database_override: Option<&str>,
) -> Result<RecordsManager> {
    let path = database_override.unwrap_or(&settings.database.path);
    log::info!("Opening database {path}");

    RecordsManager::open(path).with_context(|| format!("failed to open database {path}"))
}
