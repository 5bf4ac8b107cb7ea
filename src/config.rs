use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime configuration for the scraper, the search relay and the HTTP front
#[derive(Debug, Deserialize, Clone)]
pub struct ScraperConfig {
    /// Base address of the nutrition site; detail pages hang off it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the autocomplete endpoint, relative to `base_url`
    #[serde(default = "default_autocomplete_path")]
    pub autocomplete_path: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Attempts for the autocomplete call before giving up
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed delay between autocomplete attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pause before each image lookup fetch in milliseconds
    #[serde(default = "default_image_lookup_delay_ms")]
    pub image_lookup_delay_ms: u64,
    /// Address the HTTP front listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// User agent sent to the nutrition site
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            autocomplete_path: default_autocomplete_path(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            image_lookup_delay_ms: default_image_lookup_delay_ms(),
            bind_address: default_bind_address(),
            user_agent: default_user_agent(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://www.kaloricketabulky.cz".to_string()
}

fn default_autocomplete_path() -> String {
    "/autocomplete/foodstuff-activity-meal".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_image_lookup_delay_ms() -> u64 {
    500
}

fn default_bind_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

impl ScraperConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with NUTRISCRAPE__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: NUTRISCRAPE__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<ScraperConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("NUTRISCRAPE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
