//! Configuration management for the Bookshelf client

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{env, path::PathBuf, time::Duration};

use crate::models::SearchField;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, without trailing slash
    pub base_url: String,
    /// Optional request timeout; no timeout when absent
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file holding the token and user payload
    pub path: PathBuf,
}

/// How the list view turns a query into results
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Delegate to POST /books/search/books
    Server,
    /// Fetch everything and filter locally
    Client,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ListConfig {
    pub search_strategy: SearchMode,
    /// Field names sent along with server-side searches. Empty sends none.
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<SearchField>,
    /// Terminal width from which the table layout is used
    pub wide_breakpoint: usize,
}

/// Terminal columns from which the list renders as a table
pub const DEFAULT_WIDE_BREAKPOINT: usize = 100;

fn default_search_fields() -> Vec<SearchField> {
    SearchField::ALL.to_vec()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix BOOKSHELF_, e.g. BOOKSHELF_API__BASE_URL)
            .add_source(
                Environment::with_prefix("BOOKSHELF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Override the API base URL from BOOKSHELF_API_URL if present
            .set_override_option("api.base_url", env::var("BOOKSHELF_API_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".bookshelf/session.json"),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            search_strategy: SearchMode::Server,
            search_fields: default_search_fields(),
            wide_breakpoint: DEFAULT_WIDE_BREAKPOINT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
