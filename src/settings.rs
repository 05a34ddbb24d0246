use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_LISTING_URL: &str = "https://chihuahua.gob.mx/info/gobernadores-del-estado";
const DEFAULT_DB_PATH: &str = "governors.db";
const DEFAULT_LOCAL_NATIONALITY: &str = "Mexicana";
const DEFAULT_USER_AGENT: &str = concat!("governor_scraper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub listing_url: String,
    pub db_path: String,
    /// Profile nationality accepted without discarding enrichment.
    pub local_nationality: String,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            db_path: DEFAULT_DB_PATH.to_string(),
            local_nationality: DEFAULT_LOCAL_NATIONALITY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Defaults, then an optional `governors.toml`, then `GOV_*` environment variables.
pub fn load() -> Result<Settings> {
    let defaults = Settings::default();
    Config::builder()
        .set_default("listing_url", defaults.listing_url)?
        .set_default("db_path", defaults.db_path)?
        .set_default("local_nationality", defaults.local_nationality)?
        .set_default("user_agent", defaults.user_agent)?
        .add_source(File::with_name("governors").required(false))
        .add_source(Environment::with_prefix("GOV"))
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}
