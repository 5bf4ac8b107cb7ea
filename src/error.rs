use thiserror::Error;

/// Errors that can occur while searching for or extracting nutrition facts
#[derive(Error, Debug)]
pub enum NutritionError {
    /// Transport failure (connection, timeout, body read)
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Upstream payload could not be understood (not JSON, not a list, ...)
    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),

    /// Caller did not provide a required input
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Every candidate location was tried without usable energy data
    #[error("Could not extract nutrition details for '{slug}' from any candidate page")]
    Exhausted { slug: String },

    /// A candidate or endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Error parsing HTTP headers
    #[error("Header parse error: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Socket or stdio failure in the binary
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl NutritionError {
    /// True for errors the caller caused, as opposed to upstream or transport trouble.
    pub fn is_client_error(&self) -> bool {
        matches!(self, NutritionError::MissingInput(_))
    }
}
