//! Application configuration.
//!
//! Values are read from `config.toml` in the working directory, then from
//! the environment (including a `.env` file), then fall back to defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::srs::Sm2Params;

// ==================== Query Limits ====================

/// Default number of cards fetched for one review session
pub const DEFAULT_QUEUE_LIMIT: usize = 50;

// ==================== File Structure ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    review: Option<ReviewConfig>,
    scheduler: Option<Sm2Params>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewConfig {
    queue_limit: Option<usize>,
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub queue_limit: usize,
    pub scheduler: Sm2Params,
}

impl Settings {
    /// Load settings with priority: config.toml > .env / environment > default
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new("config.toml"), std::env::var("DATABASE_PATH").ok())
    }

    /// Resolve settings from an explicit config file and `DATABASE_PATH` value
    pub fn load_from(config_path: &Path, env_database_path: Option<String>) -> Self {
        let file = read_config_file(config_path).unwrap_or_default();
        Self::resolve(file, env_database_path)
    }

    fn resolve(file: AppConfig, env_database_path: Option<String>) -> Self {
        let database_path = resolve_database_path(file.database, env_database_path);

        let queue_limit = match file.review.and_then(|r| r.queue_limit) {
            Some(0) => {
                tracing::warn!("review.queue_limit must be positive, using {}", DEFAULT_QUEUE_LIMIT);
                DEFAULT_QUEUE_LIMIT
            }
            Some(limit) => limit,
            None => DEFAULT_QUEUE_LIMIT,
        };

        let scheduler = match file.scheduler {
            Some(params) => match params.validate() {
                Ok(()) => params,
                Err(e) => {
                    tracing::warn!("Ignoring [scheduler] settings: {}", e);
                    Sm2Params::default()
                }
            },
            None => Sm2Params::default(),
        };

        Self {
            database_path,
            queue_limit,
            scheduler,
        }
    }
}

fn read_config_file(path: &Path) -> Option<AppConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Could not parse {}: {}", path.display(), e);
            None
        }
    }
}

fn resolve_database_path(database: Option<DatabaseConfig>, env_path: Option<String>) -> PathBuf {
    // Priority 1: config.toml
    if let Some(path) = database.and_then(|db| db.path) {
        tracing::info!("Using database from config.toml: {}", path);
        return PathBuf::from(path);
    }

    // Priority 2: DATABASE_PATH
    if let Some(path) = env_path.filter(|p| !p.is_empty()) {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from(paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}
